//! # qrcast Core
//!
//! Framing, sequencing and reassembly for sending files through a sequence
//! of barcode images (and from there, through a video).
//!
//! ## Modules
//!
//! - `constants`: Wire format constants and limits
//! - `types`: Core types (Chunk, Frame, FrameHeader, SourceStream)
//! - `encoder`: Chunk and frame encoding
//! - `decoder`: Strict frame decoding
//! - `armor`: Text-safe transform applied around serialized frames
//! - `planner`: Chunk size planning against a frame budget
//! - `packer`: Chunking and multi-source frame packing
//! - `codec`: Barcode codec capability trait
//! - `raster`: Built-in binary raster codec
//! - `render`: Self-checked rendering with bounded regeneration
//! - `assembler`: Receive-side deduplication, validation and gap filling
//! - `accuracy`: Bit-level comparison against the original
//! - `config`: Run configuration

#![warn(missing_docs)]

pub mod accuracy;
pub mod armor;
pub mod assembler;
pub mod codec;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod packer;
pub mod planner;
pub mod raster;
pub mod render;
pub mod types;

// Re-export commonly used types
pub use codec::BarcodeCodec;
pub use error::{FrameError, TransportError};
pub use types::{Chunk, Frame, FrameHeader, SourceStream};

/// Result type alias for wire-level qrcast operations
pub type Result<T> = core::result::Result<T, FrameError>;
