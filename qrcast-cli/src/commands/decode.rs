use crate::inputs::requested_id;
use crate::scratch::Scratch;
use crate::{build_codec, progress_bar, tools};
use anyhow::{bail, Context, Result};
use colored::*;
use qrcast_core::accuracy::{compare, AccuracySummary};
use qrcast_core::assembler::{AssemblerState, AssemblerStats, DuplicateFilter, ReassembledStream};
use qrcast_core::codec::BarcodeCodec;
use qrcast_core::config::DecodeOptions;
use qrcast_core::constants::extracted_frame_name;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Report file written into the report directory
pub const REPORT_FILE_NAME: &str = "report.json";

/// Everything `qrcast decode` needs
#[derive(Debug, Clone)]
pub struct DecodeArgs {
    /// Video to read
    pub video: PathBuf,
    /// Output file (one source) or directory (several)
    pub output: PathBuf,
    /// Directory for `report.json` and `.val` diffs
    pub report_dir: Option<PathBuf>,
    /// Original file or directory of `<id>.bin` originals
    pub original: Option<PathBuf>,
    /// Sampling and stop settings
    pub options: DecodeOptions,
    /// Parent of the per-run scratch directory
    pub scratch_dir: Option<PathBuf>,
    /// Leave the scratch directory behind
    pub keep_scratch: bool,
    /// Draw progress bars
    pub progress: bool,
}

/// Counters from walking the extracted frames
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Extracted frames on disk
    pub images: usize,
    /// Frames actually read before the loop stopped
    pub images_read: usize,
    /// Frames skipped as repeats of the previous one
    pub repeated_images: usize,
    /// Frames in which the codec found nothing
    pub images_without_symbol: usize,
    /// Symbols handed to the assembler
    pub symbols: usize,
}

/// Per-source section of the decode report
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    /// Source id
    pub source_id: u8,
    /// Where the reconstruction was written
    pub output: PathBuf,
    /// Reconstructed length
    pub bytes: usize,
    /// End chunk received
    pub finished: bool,
    /// Real chunks appended
    pub chunks: usize,
    /// Filler chunks synthesized
    pub filler_chunks: usize,
    /// Filler bytes synthesized
    pub filler_bytes: usize,
    /// Original compared against, if any
    pub original: Option<PathBuf>,
    /// Comparison result, if an original was available
    pub accuracy: Option<AccuracySummary>,
}

/// Contents of `report.json`
#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    /// Video that was decoded
    pub video: PathBuf,
    /// Settings used
    pub options: DecodeOptions,
    /// Frame walk counters
    pub scan: ScanSummary,
    /// Assembler counters
    pub stats: AssemblerStats,
    /// One entry per recovered source
    pub sources: Vec<SourceReport>,
}

/// Walk `frame_dir` in frame order and reassemble every source found
pub fn assemble_dir(
    frame_dir: &Path,
    codec: &dyn BarcodeCodec,
    options: &DecodeOptions,
    progress: bool,
) -> Result<(AssemblerState, ScanSummary)> {
    let mut summary = ScanSummary {
        images: tools::count_frames(frame_dir),
        ..Default::default()
    };
    let mut state = AssemblerState::from_options(options);
    let mut filter = DuplicateFilter::new();
    let bar = progress_bar(summary.images as u64, progress, "scanning");

    for n in 1..=summary.images {
        let path = frame_dir.join(extracted_frame_name(n));
        let image =
            fs::read(&path).with_context(|| format!("Failed to read frame: {}", path.display()))?;
        summary.images_read += 1;
        bar.inc(1);

        if filter.is_repeat(&image) {
            continue;
        }

        let symbols = codec
            .scan(&image)
            .with_context(|| format!("Failed to scan frame: {}", path.display()))?;
        if symbols.is_empty() {
            debug!("No symbol in {}", path.display());
            summary.images_without_symbol += 1;
        }

        for symbol in symbols {
            summary.symbols += 1;
            state.push_symbol(&symbol);
        }

        if state.is_done() {
            info!("First source finished at frame {}; stopping", n);
            break;
        }
    }
    bar.finish_and_clear();

    summary.repeated_images = filter.skipped();
    Ok((state, summary))
}

/// Original to compare source `source_id` against
pub fn original_for(original: &Path, source_id: u8, only_source: bool) -> Option<PathBuf> {
    if original.is_dir() {
        let candidate = original.join(format!("{}.bin", source_id));
        return candidate.is_file().then_some(candidate);
    }
    if original.is_file() && (only_source || requested_id(original) == Some(source_id)) {
        return Some(original.to_path_buf());
    }
    None
}

/// Where the reconstruction of `stream` goes
fn output_path(output: &Path, stream: &ReassembledStream, only_source: bool) -> PathBuf {
    if only_source {
        output.to_path_buf()
    } else {
        output.join(format!("{}.bin", stream.source_id))
    }
}

fn accuracy_line(source_id: u8, percentage: f64) -> String {
    let text = format!("{}.bin accuracy: {:.2}%", source_id, percentage);
    if percentage >= 100.0 {
        text.green().to_string()
    } else if percentage >= 90.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// Write reconstructions, diffs and the report for an assembled run
pub fn deliver(state: AssemblerState, scan: ScanSummary, args: &DecodeArgs) -> Result<DecodeReport> {
    let stats = state.stats().clone();
    let streams = state.into_streams();
    if streams.is_empty() {
        bail!(
            "No source started in {} ({} frames read, {} rejected)",
            args.video.display(),
            scan.images_read,
            stats.rejected()
        );
    }

    let only_source = streams.len() == 1;
    if only_source {
        if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    } else {
        fs::create_dir_all(&args.output).with_context(|| {
            format!("Failed to create output directory: {}", args.output.display())
        })?;
    }
    if let Some(report_dir) = &args.report_dir {
        fs::create_dir_all(report_dir).with_context(|| {
            format!("Failed to create report directory: {}", report_dir.display())
        })?;
    }

    let mut sources = Vec::with_capacity(streams.len());
    for stream in &streams {
        let path = output_path(&args.output, stream, only_source);
        fs::write(&path, &stream.data)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        info!(
            "Source {}: {} bytes -> {}",
            stream.source_id,
            stream.data.len(),
            path.display()
        );
        if !stream.finished {
            warn!("Source {} never delivered its end chunk", stream.source_id);
        }

        let original = args
            .original
            .as_deref()
            .and_then(|o| original_for(o, stream.source_id, only_source));
        let accuracy = match &original {
            Some(original_path) => {
                let expected = fs::read(original_path).with_context(|| {
                    format!("Failed to read original file: {}", original_path.display())
                })?;
                let report = compare(&expected, &stream.data);
                println!("{}", accuracy_line(stream.source_id, report.percentage()));

                if let Some(report_dir) = &args.report_dir {
                    let diff_path = report_dir.join(format!("{}.val", stream.source_id));
                    report.write_diff(&diff_path).with_context(|| {
                        format!("Failed to write diff file: {}", diff_path.display())
                    })?;
                }
                Some(report.summary)
            }
            None => {
                if args.original.is_some() {
                    warn!("No original found for source {}", stream.source_id);
                }
                None
            }
        };

        sources.push(SourceReport {
            source_id: stream.source_id,
            output: path,
            bytes: stream.data.len(),
            finished: stream.finished,
            chunks: stream.chunks,
            filler_chunks: stream.filler_chunks,
            filler_bytes: stream.filler_bytes,
            original,
            accuracy,
        });
    }

    let report = DecodeReport {
        video: args.video.clone(),
        options: args.options.clone(),
        scan,
        stats,
        sources,
    };

    if let Some(report_dir) = &args.report_dir {
        let path = report_dir.join(REPORT_FILE_NAME);
        let json = serde_json::to_string_pretty(&report)
            .with_context(|| "Failed to serialize decode report")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;
        info!("Report written to: {}", path.display());
    }

    Ok(report)
}

fn print_summary(report: &DecodeReport) {
    println!("\n=== Decode Results ===");
    println!("Frames read:       {}", report.scan.images_read);
    println!("Repeated frames:   {}", report.scan.repeated_images);
    println!("Symbols:           {}", report.scan.symbols);
    println!("Chunks appended:   {}", report.stats.appended);
    if report.stats.rejected() > 0 {
        println!("Rejected:          {}", report.stats.rejected().to_string().red());
    } else {
        println!("Rejected:          {}", report.stats.rejected());
    }
    println!(
        "Dropped:           {} duplicate, {} stale, {} before start, {} after end",
        report.stats.duplicates, report.stats.stale, report.stats.pre_start, report.stats.after_end
    );
    if report.stats.filler_chunks > 0 {
        println!(
            "Filler:            {} chunks ({} bytes)",
            report.stats.filler_chunks.to_string().yellow(),
            report.stats.filler_bytes
        );
    }
    for source in &report.sources {
        let mark = if source.finished {
            "✓".green()
        } else {
            "!".yellow()
        };
        println!(
            "{} Source {}: {} bytes -> {}",
            mark,
            source.source_id,
            source.bytes,
            source.output.display()
        );
    }
}

pub fn execute(args: &DecodeArgs) -> Result<()> {
    info!(
        "Decoding {} into {}",
        args.video.display(),
        args.output.display()
    );

    if !args.video.is_file() {
        bail!("Input video not found: {}", args.video.display());
    }

    let scratch = Scratch::create(args.scratch_dir.as_deref(), args.keep_scratch)
        .with_context(|| "Failed to create scratch directory")?;
    let frame_dir = scratch.frames_dir();

    let extracted = tools::split_video(&args.video, args.options.fps, &frame_dir)
        .with_context(|| format!("Failed to split video: {}", args.video.display()))?;
    if extracted == 0 {
        bail!("No frames extracted from {}", args.video.display());
    }
    info!("Extracted {} frames at {} fps", extracted, args.options.fps);

    let codec = build_codec(args.options.codec);
    let (state, scan) = assemble_dir(&frame_dir, codec.as_ref(), &args.options, args.progress)?;
    let report = deliver(state, scan, args)?;
    print_summary(&report);

    Ok(())
}
