//! Binary raster codec
//!
//! A dependency-free barcode: the data is laid out as a square grid of black
//! and white modules in a binary PGM (P5) image. A 32-bit big-endian length
//! prefix is followed by the data bits, most significant bit first, row by
//! row; black encodes 1. Modules are 4×4 pixels with a 2-module white quiet
//! zone, so image sides are always even (the video encoder requires it).
//!
//! The grid side is fixed per codec instance so every image of a run has the
//! same dimensions. The scanner recovers the grid from the image width and
//! samples each module centre.

use crate::armor::armored_len;
use crate::codec::BarcodeCodec;
use crate::constants::{CHUNK_HEADER_SIZE, CODEC_CAP, FRAME_OVERHEAD};
use crate::error::TransportError;
use bytes::{BufMut, Bytes, BytesMut};

#[cfg(feature = "logging")]
use tracing::debug;

/// Pixels per module side
pub const MODULE_PX: usize = 4;

/// White border in modules
pub const QUIET_MODULES: usize = 2;

const LENGTH_BITS: usize = 32;
const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// Raster barcode codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterCodec {
    grid: usize,
}

impl RasterCodec {
    /// Codec with a `grid × grid` module area
    pub fn new(grid: usize) -> Self {
        Self { grid: grid.max(6) }
    }

    /// Smallest codec able to carry `max_bytes` per image
    pub fn for_payload(max_bytes: usize) -> Self {
        let bits = LENGTH_BITS + max_bytes * 8;
        let mut grid = 1;
        while grid * grid < bits {
            grid += 1;
        }
        Self::new(grid)
    }

    /// Image side in pixels
    pub fn side_px(&self) -> usize {
        (self.grid + 2 * QUIET_MODULES) * MODULE_PX
    }

    /// Bytes one image carries
    pub fn max_bytes(&self) -> usize {
        (self.grid * self.grid - LENGTH_BITS) / 8
    }
}

impl Default for RasterCodec {
    /// Sized for the largest armored frame a `CODEC_CAP` chunk produces
    fn default() -> Self {
        Self::for_payload(armored_len(FRAME_OVERHEAD + CHUNK_HEADER_SIZE + CODEC_CAP))
    }
}

impl BarcodeCodec for RasterCodec {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn image_extension(&self) -> &'static str {
        "pgm"
    }

    fn render(&self, data: &[u8]) -> Result<Bytes, TransportError> {
        if data.len() > self.max_bytes() || data.len() > u32::MAX as usize {
            return Err(TransportError::Codec {
                codec: self.name(),
                reason: format!(
                    "{} bytes exceed the {}-byte grid capacity",
                    data.len(),
                    self.max_bytes()
                ),
            });
        }

        let side = self.side_px();
        let mut pixels = vec![WHITE; side * side];

        let prefix = (data.len() as u32).to_be_bytes();
        let bits = prefix
            .iter()
            .chain(data.iter())
            .flat_map(|&byte| (0..8u32).rev().map(move |shift| (byte >> shift) & 1 == 1));

        for (i, bit) in bits.enumerate() {
            if !bit {
                continue;
            }
            let x0 = (QUIET_MODULES + i % self.grid) * MODULE_PX;
            let y0 = (QUIET_MODULES + i / self.grid) * MODULE_PX;
            for y in y0..y0 + MODULE_PX {
                pixels[y * side + x0..y * side + x0 + MODULE_PX].fill(BLACK);
            }
        }

        Ok(write_pgm(side, side, &pixels))
    }

    fn scan(&self, image: &[u8]) -> Result<Vec<Bytes>, TransportError> {
        Ok(scan_raster(image).into_iter().collect())
    }
}

fn scan_raster(image: &[u8]) -> Option<Bytes> {
    let pgm = match Pgm::parse(image) {
        Some(pgm) => pgm,
        None => {
            #[cfg(feature = "logging")]
            debug!("Image is not a readable PGM ({} bytes)", image.len());
            return None;
        }
    };

    if pgm.width != pgm.height || pgm.width % MODULE_PX != 0 {
        return None;
    }
    let modules = pgm.width / MODULE_PX;
    if modules <= 2 * QUIET_MODULES {
        return None;
    }
    let grid = modules - 2 * QUIET_MODULES;
    let capacity_bits = grid * grid;
    if capacity_bits < LENGTH_BITS {
        return None;
    }

    let threshold = pgm.maxval.div_ceil(2);
    let bit_at = |i: usize| -> bool {
        let x = (QUIET_MODULES + i % grid) * MODULE_PX + MODULE_PX / 2;
        let y = (QUIET_MODULES + i / grid) * MODULE_PX + MODULE_PX / 2;
        pgm.sample(x, y) < threshold
    };
    let byte_at = |n: usize| -> u8 {
        (0..8).fold(0u8, |acc, b| (acc << 1) | bit_at(n * 8 + b) as u8)
    };

    let len = u32::from_be_bytes([byte_at(0), byte_at(1), byte_at(2), byte_at(3)]) as usize;
    if len == 0 || LENGTH_BITS + len.saturating_mul(8) > capacity_bits {
        return None;
    }

    let mut out = BytesMut::with_capacity(len);
    for n in 4..4 + len {
        out.put_u8(byte_at(n));
    }
    Some(out.freeze())
}

fn write_pgm(width: usize, height: usize, pixels: &[u8]) -> Bytes {
    let header = format!("P5\n{} {}\n255\n", width, height);
    let mut buf = BytesMut::with_capacity(header.len() + pixels.len());
    buf.put_slice(header.as_bytes());
    buf.put_slice(pixels);
    buf.freeze()
}

/// Grayscale image decoded from a binary PGM
struct Pgm<'a> {
    width: usize,
    height: usize,
    maxval: u16,
    wide: bool,
    raster: &'a [u8],
}

impl<'a> Pgm<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        if !data.starts_with(b"P5") {
            return None;
        }
        let mut pos = 2;
        let width = next_header_number(data, &mut pos)?;
        let height = next_header_number(data, &mut pos)?;
        let maxval = next_header_number(data, &mut pos)?;
        if maxval == 0 || maxval > u16::MAX as usize {
            return None;
        }
        // exactly one whitespace byte separates the header from the raster
        if !data.get(pos)?.is_ascii_whitespace() {
            return None;
        }
        pos += 1;

        let wide = maxval > 255;
        let needed = width.checked_mul(height)?.checked_mul(if wide { 2 } else { 1 })?;
        let raster = data.get(pos..pos.checked_add(needed)?)?;

        Some(Self {
            width,
            height,
            maxval: maxval as u16,
            wide,
            raster,
        })
    }

    fn sample(&self, x: usize, y: usize) -> u16 {
        let i = y * self.width + x;
        if self.wide {
            u16::from_be_bytes([self.raster[2 * i], self.raster[2 * i + 1]])
        } else {
            self.raster[i] as u16
        }
    }
}

fn next_header_number(data: &[u8], pos: &mut usize) -> Option<usize> {
    loop {
        match data.get(*pos)? {
            b'#' => {
                while *data.get(*pos)? != b'\n' {
                    *pos += 1;
                }
            }
            b if b.is_ascii_whitespace() => *pos += 1,
            _ => break,
        }
    }
    let start = *pos;
    while data.get(*pos).is_some_and(|b| b.is_ascii_digit()) {
        *pos += 1;
    }
    std::str::from_utf8(&data[start..*pos]).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scan_round_trip() {
        let codec = RasterCodec::for_payload(64);
        let data: Vec<u8> = (0..64u8).map(|b| b.wrapping_mul(37)).collect();

        let image = codec.render(&data).unwrap();
        assert!(image.starts_with(b"P5\n"));

        let scanned = codec.scan(&image).unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].as_ref(), &data[..]);
    }

    #[test]
    fn test_default_fits_largest_frame() {
        let codec = RasterCodec::default();
        assert!(codec.max_bytes() >= armored_len(FRAME_OVERHEAD + CHUNK_HEADER_SIZE + CODEC_CAP));
        assert_eq!(codec.capacity(), CODEC_CAP);
    }

    #[test]
    fn test_images_share_dimensions() {
        let codec = RasterCodec::for_payload(100);
        let a = codec.render(b"short").unwrap();
        let b = codec.render(&[0xAA; 100]).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(codec.side_px() % 2, 0);
    }

    #[test]
    fn test_overflow_rejected() {
        let codec = RasterCodec::for_payload(8);
        let too_big = vec![1u8; codec.max_bytes() + 1];
        assert!(matches!(
            codec.render(&too_big),
            Err(TransportError::Codec { .. })
        ));
    }

    #[test]
    fn test_blank_image_has_no_symbol() {
        let codec = RasterCodec::for_payload(16);
        let side = codec.side_px();
        let blank = write_pgm(side, side, &vec![WHITE; side * side]);
        assert!(codec.scan(&blank).unwrap().is_empty());
    }

    #[test]
    fn test_non_image_has_no_symbol() {
        let codec = RasterCodec::for_payload(16);
        assert!(codec.scan(b"definitely not a pgm").unwrap().is_empty());
    }

    #[test]
    fn test_scan_ignores_header_comments_and_noise() {
        let codec = RasterCodec::for_payload(4);
        let image = codec.render(b"abcd").unwrap();

        // Insert a comment line and shift pixel values the way a lossy
        // encoder might, keeping them on the right side of the threshold
        let header_end = image.len() - codec.side_px() * codec.side_px();
        let mut noisy = b"P5\n# from ffmpeg\n".to_vec();
        noisy.extend_from_slice(&image[3..header_end]);
        noisy.extend(
            image[header_end..]
                .iter()
                .map(|p| if *p == BLACK { 40 } else { 210 }),
        );

        let scanned = codec.scan(&noisy).unwrap();
        assert_eq!(scanned, vec![Bytes::from_static(b"abcd")]);
    }
}
