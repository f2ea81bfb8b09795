//! External tool plumbing
//!
//! Video composition and splitting go through `ffmpeg`; QR rendering and
//! scanning go through `qrencode` and `zbarimg`. Every invocation has its
//! exit status checked and a failure carries the tool's stderr.

use bytes::Bytes;
use qrcast_core::codec::BarcodeCodec;
use qrcast_core::constants::extracted_frame_name;
use qrcast_core::TransportError;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// `zbarimg` exit code for "image read, no symbol found"
const ZBAR_NO_SYMBOL: i32 = 4;

/// Run `program` with `args`, feeding `stdin` if given
///
/// Exit codes listed in `tolerated` count as success.
pub fn run_tool<I, S>(
    program: &str,
    args: I,
    stdin: Option<&[u8]>,
    tolerated: &[i32],
) -> Result<Output, TransportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("Running {:?}", command);

    let mut child = command.spawn().map_err(|e| TransportError::ExternalTool {
        tool: program.to_string(),
        status: "not started".to_string(),
        stderr: e.to_string(),
    })?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input)?;
    }

    let output = child.wait_with_output()?;
    let tolerated_code = output
        .status
        .code()
        .is_some_and(|code| tolerated.contains(&code));

    if !output.status.success() && !tolerated_code {
        return Err(TransportError::ExternalTool {
            tool: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// Input frame rate that stretches `frames` images over `duration_ms`
///
/// Never above `fps`: a denser sequence plays at `fps` and runs long.
pub fn input_rate(frames: usize, duration_ms: u64, fps: u32) -> f64 {
    if duration_ms == 0 || frames == 0 {
        return fps as f64;
    }
    let rate = frames as f64 * 1000.0 / duration_ms as f64;
    rate.min(fps as f64)
}

/// Arguments for composing `image_dir/qrCode_%d.<ext>` into `output`
pub fn compose_args(
    image_dir: &Path,
    extension: &str,
    frames: usize,
    duration_ms: u64,
    fps: u32,
    output: &Path,
) -> Vec<String> {
    let pattern = image_dir.join(format!("qrCode_%d.{}", extension));
    vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-framerate".into(),
        format!("{:.6}", input_rate(frames, duration_ms, fps)),
        "-i".into(),
        pattern.to_string_lossy().into_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-r".into(),
        fps.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Arguments for sampling `video` at `fps` into grayscale frames in `frame_dir`
pub fn split_args(video: &Path, fps: u32, frame_dir: &Path) -> Vec<String> {
    let pattern = frame_dir.join("frame_%05d.pgm");
    vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        video.to_string_lossy().into_owned(),
        "-vf".into(),
        format!("fps={}", fps),
        "-pix_fmt".into(),
        "gray".into(),
        pattern.to_string_lossy().into_owned(),
    ]
}

/// Compose rendered images into a video
pub fn compose_video(
    image_dir: &Path,
    extension: &str,
    frames: usize,
    duration_ms: u64,
    fps: u32,
    output: &Path,
) -> Result<(), TransportError> {
    let args = compose_args(image_dir, extension, frames, duration_ms, fps, output);
    run_tool("ffmpeg", &args, None, &[])?;
    Ok(())
}

/// Split a video into frames, returning how many were written
pub fn split_video(video: &Path, fps: u32, frame_dir: &Path) -> Result<usize, TransportError> {
    run_tool("ffmpeg", &split_args(video, fps, frame_dir), None, &[])?;
    Ok(count_frames(frame_dir))
}

/// Number of contiguous `frame_<nnnnn>.pgm` files starting at 1
pub fn count_frames(frame_dir: &Path) -> usize {
    let mut count = 0;
    while frame_dir.join(extracted_frame_name(count + 1)).is_file() {
        count += 1;
    }
    count
}

/// QR codes through `qrencode` and `zbarimg`
///
/// Symbols are pinned to version 30 at error correction level H, which holds
/// any armored frame up to the codec capacity, so every image has the same
/// size.
#[derive(Debug, Clone, Default)]
pub struct QrToolCodec;

impl QrToolCodec {
    /// Create the codec
    pub fn new() -> Self {
        Self
    }
}

/// Split scanner output into one symbol per non-empty line
pub fn split_symbols(stdout: &[u8]) -> Vec<Bytes> {
    let mut symbols = Vec::new();
    let mut start = 0;
    for end in memchr::memchr_iter(b'\n', stdout).chain(std::iter::once(stdout.len())) {
        let line = stdout[start..end].trim_ascii();
        if !line.is_empty() {
            symbols.push(Bytes::copy_from_slice(line));
        }
        start = (end + 1).min(stdout.len());
    }
    symbols
}

impl BarcodeCodec for QrToolCodec {
    fn name(&self) -> &'static str {
        "qr"
    }

    fn image_extension(&self) -> &'static str {
        "png"
    }

    fn render(&self, data: &[u8]) -> Result<Bytes, TransportError> {
        let args = [
            "-l", "H", "-v", "30", "-8", "-s", "6", "-m", "4", "-t", "PNG", "-o", "-",
        ];
        let output = run_tool("qrencode", args, Some(data), &[])?;
        if output.stdout.is_empty() {
            return Err(TransportError::Codec {
                codec: self.name(),
                reason: "qrencode produced no image".to_string(),
            });
        }
        Ok(Bytes::from(output.stdout))
    }

    fn scan(&self, image: &[u8]) -> Result<Vec<Bytes>, TransportError> {
        let suffix = if image.starts_with(b"P5") { ".pgm" } else { ".png" };
        let mut file = tempfile::Builder::new()
            .prefix("qrcast-scan-")
            .suffix(suffix)
            .tempfile()?;
        file.write_all(image)?;
        file.flush()?;

        let args = [
            OsStr::new("--raw"),
            OsStr::new("-q"),
            OsStr::new("-Sdisable"),
            OsStr::new("-Sqrcode.enable"),
            file.path().as_os_str(),
        ];
        let output = run_tool("zbarimg", args, None, &[ZBAR_NO_SYMBOL])?;
        Ok(split_symbols(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_input_rate_stretches_short_sequences() {
        // 5 images over 2 s at 10 fps: each image shows for 0.4 s
        assert!((input_rate(5, 2000, 10) - 2.5).abs() < 1e-9);
        // more images than the budget play at fps
        assert_eq!(input_rate(50, 2000, 10), 10.0);
        assert_eq!(input_rate(0, 2000, 10), 10.0);
        assert_eq!(input_rate(5, 0, 10), 10.0);
    }

    #[test]
    fn test_compose_args() {
        let args = compose_args(
            &PathBuf::from("/tmp/run/qr_codes"),
            "png",
            20,
            2000,
            10,
            &PathBuf::from("out.mp4"),
        );
        assert_eq!(args[4], "10.000000");
        assert_eq!(args[6], "/tmp/run/qr_codes/qrCode_%d.png");
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(!args.iter().any(|a| a == "-t"));
    }

    #[test]
    fn test_split_args() {
        let args = split_args(&PathBuf::from("in.mp4"), 10, &PathBuf::from("/tmp/run/frames"));
        assert!(args.contains(&"fps=10".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/run/frames/frame_%05d.pgm"));
    }

    #[test]
    fn test_count_frames_stops_at_first_hole() {
        let dir = tempfile::tempdir().unwrap();
        for n in [1, 2, 3, 5] {
            std::fs::write(dir.path().join(extracted_frame_name(n)), b"P5").unwrap();
        }
        assert_eq!(count_frames(dir.path()), 3);
    }

    #[test]
    fn test_split_symbols() {
        let symbols = split_symbols(b"fwAAAA==\n\nabc\r\nxyz");
        assert_eq!(
            symbols,
            vec![
                Bytes::from_static(b"fwAAAA=="),
                Bytes::from_static(b"abc"),
                Bytes::from_static(b"xyz"),
            ]
        );
        assert!(split_symbols(b"").is_empty());
        assert!(split_symbols(b"\n").is_empty());
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let err = run_tool("qrcast-no-such-tool", ["--help"], None, &[]).unwrap_err();
        match err {
            TransportError::ExternalTool { tool, status, .. } => {
                assert_eq!(tool, "qrcast-no-such-tool");
                assert_eq!(status, "not started");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_failing_tool_is_reported() {
        let err = run_tool("sh", ["-c", "echo broken >&2; exit 3"], None, &[]).unwrap_err();
        match err {
            TransportError::ExternalTool { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_tolerated_exit_code() {
        let output = run_tool("sh", ["-c", "printf hi; exit 4"], None, &[4]).unwrap();
        assert_eq!(output.stdout, b"hi");
    }

    #[test]
    fn test_stdin_is_fed() {
        let output = run_tool("cat", std::iter::empty::<&str>(), Some(b"piped"), &[]).unwrap();
        assert_eq!(output.stdout, b"piped");
    }
}
