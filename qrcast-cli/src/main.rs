use anyhow::Result;
use clap::{Parser, Subcommand};
use qrcast_cli::commands::{decode, encode};
use qrcast_cli::CodecChoice;
use qrcast_core::config::{DecodeMode, DecodeOptions, EncodeOptions};
use qrcast_core::constants::{
    DEFAULT_FPS, DEFAULT_MAX_GAP_BYTES, DEFAULT_MAX_RENDER_ATTEMPTS, DEFAULT_MTU,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "qrcast")]
#[command(about = "qrcast - Send files through a video of barcodes", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file (or a directory of .bin files) into a video
    Encode {
        /// Input file, or directory whose .bin files are multiplexed
        input: PathBuf,

        /// Output video file
        output: PathBuf,

        /// Target video length in milliseconds
        duration_ms: u64,

        /// Maximum transmission unit in bytes
        #[arg(default_value_t = DEFAULT_MTU)]
        mtu: usize,

        /// Video frame rate
        #[arg(default_value_t = DEFAULT_FPS)]
        fps: u32,

        /// Barcode codec
        #[arg(long, value_enum, default_value = "qr")]
        codec: CodecChoice,

        /// Render attempts per chunk before giving up
        #[arg(long, default_value_t = DEFAULT_MAX_RENDER_ATTEMPTS)]
        max_render_attempts: u32,

        /// Directory in which the per-run scratch directory is created
        #[arg(long)]
        scratch_dir: Option<PathBuf>,

        /// Keep the scratch directory after the run
        #[arg(long)]
        keep_scratch: bool,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Decode a video back into the original file(s)
    Decode {
        /// Input video file
        video: PathBuf,

        /// Output file (one source) or directory (several sources)
        output: PathBuf,

        /// Directory receiving report.json and .val diff files
        report_dir: Option<PathBuf>,

        /// Original file, or directory of <id>.bin originals, to score against
        original: Option<PathBuf>,

        /// Barcode codec
        #[arg(long, value_enum, default_value = "qr")]
        codec: CodecChoice,

        /// Frame rate used to sample the video
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,

        /// Stop at the first source that finishes
        #[arg(long)]
        single: bool,

        /// Filler bytes allowed for one gap; frames needing more are dropped
        #[arg(long, default_value_t = DEFAULT_MAX_GAP_BYTES)]
        max_gap_bytes: usize,

        /// Directory in which the per-run scratch directory is created
        #[arg(long)]
        scratch_dir: Option<PathBuf>,

        /// Keep the scratch directory after the run
        #[arg(long)]
        keep_scratch: bool,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Encode {
            input,
            output,
            duration_ms,
            mtu,
            fps,
            codec,
            max_render_attempts,
            scratch_dir,
            keep_scratch,
            no_progress,
        } => encode::execute(&encode::EncodeArgs {
            input,
            output,
            options: EncodeOptions {
                duration_ms,
                mtu,
                fps,
                codec: codec.into(),
                max_render_attempts,
            },
            scratch_dir,
            keep_scratch,
            progress: !no_progress,
        }),

        Commands::Decode {
            video,
            output,
            report_dir,
            original,
            codec,
            fps,
            single,
            max_gap_bytes,
            scratch_dir,
            keep_scratch,
            no_progress,
        } => decode::execute(&decode::DecodeArgs {
            video,
            output,
            report_dir,
            original,
            options: DecodeOptions {
                fps,
                codec: codec.into(),
                mode: if single {
                    DecodeMode::Single
                } else {
                    DecodeMode::Multiplexed
                },
                max_gap_bytes,
            },
            scratch_dir,
            keep_scratch,
            progress: !no_progress,
        }),
    }
}
