//! Fuzz entry points for qrcast-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_decoder

use qrcast_core::assembler::AssemblerState;
use qrcast_core::codec::BarcodeCodec;
use qrcast_core::config::DecodeMode;
use qrcast_core::raster::RasterCodec;

pub fn fuzz_decode(data: &[u8]) {
    use qrcast_core::decoder::{decode_armored, decode_frame_from_bytes};

    // Try to decode - should never panic
    let _ = decode_frame_from_bytes(data);
    let _ = decode_armored(data);
}

/// Treat the input as newline-separated scanner output
pub fn fuzz_assemble(data: &[u8]) {
    let mut state = AssemblerState::new(DecodeMode::Multiplexed);
    for symbol in data.split(|&b| b == b'\n') {
        state.push_symbol(symbol);
    }
    let _ = state.into_streams();
}

pub fn fuzz_raster_scan(data: &[u8]) {
    let _ = RasterCodec::default().scan(data);
}
