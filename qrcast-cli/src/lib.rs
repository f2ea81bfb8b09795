//! Library entry for qrcast-cli used by integration tests and embedding.

pub mod commands;
pub mod inputs;
pub mod scratch;
pub mod tools;

// Re-export commands for convenience
pub use commands::*;

use indicatif::{ProgressBar, ProgressStyle};
use qrcast_core::codec::BarcodeCodec;
use qrcast_core::config::CodecKind;
use qrcast_core::raster::RasterCodec;

/// Barcode codec selectable on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CodecChoice {
    /// QR codes via qrencode and zbarimg
    Qr,
    /// Built-in raster grid, no external barcode tools needed
    Raster,
}

impl From<CodecChoice> for CodecKind {
    fn from(choice: CodecChoice) -> Self {
        match choice {
            CodecChoice::Qr => CodecKind::Qr,
            CodecChoice::Raster => CodecKind::Raster,
        }
    }
}

/// Instantiate the codec for `kind`
pub fn build_codec(kind: CodecKind) -> Box<dyn BarcodeCodec> {
    match kind {
        CodecKind::Qr => Box::new(tools::QrToolCodec::new()),
        CodecKind::Raster => Box::new(RasterCodec::default()),
    }
}

/// Progress bar over `len` steps, hidden when `enabled` is false
pub fn progress_bar(len: u64, enabled: bool, message: &'static str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template("{msg:>10} [{bar:40}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    ProgressBar::new(len).with_style(style).with_message(message)
}
