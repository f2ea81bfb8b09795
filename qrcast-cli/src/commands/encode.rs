use crate::inputs;
use crate::scratch::Scratch;
use crate::{build_codec, progress_bar, tools};
use anyhow::{bail, Context, Result};
use colored::*;
use qrcast_core::codec::BarcodeCodec;
use qrcast_core::config::EncodeOptions;
use qrcast_core::constants::rendered_image_name;
use qrcast_core::packer::FramePacker;
use qrcast_core::planner::{frame_budget, plan_chunk_size, ChunkPlan};
use qrcast_core::render::SelfCheckedRenderer;
use qrcast_core::SourceStream;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything `qrcast encode` needs
#[derive(Debug, Clone)]
pub struct EncodeArgs {
    /// Input file or directory of `*.bin` files
    pub input: PathBuf,
    /// Video to write
    pub output: PathBuf,
    /// Planning and rendering settings
    pub options: EncodeOptions,
    /// Parent of the per-run scratch directory
    pub scratch_dir: Option<PathBuf>,
    /// Leave the scratch directory behind
    pub keep_scratch: bool,
    /// Draw progress bars
    pub progress: bool,
}

/// What the render stage produced
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    /// Chunk plan used
    pub plan: ChunkPlan,
    /// Number of sources
    pub sources: usize,
    /// Bytes across all sources
    pub total_bytes: usize,
    /// Images written
    pub frames: usize,
    /// Chunks whose content had to be substituted
    pub substituted: usize,
    /// Extension of the written images
    pub extension: &'static str,
}

/// Plan, pack and render `sources` into `image_dir/qrCode_<n>.<ext>`
pub fn render_to_dir(
    sources: Vec<SourceStream>,
    options: &EncodeOptions,
    codec: &dyn BarcodeCodec,
    image_dir: &Path,
    progress: bool,
) -> Result<RenderSummary> {
    let total_bytes: usize = sources.iter().map(|s| s.data.len()).sum();
    if total_bytes == 0 {
        bail!("Nothing to encode: every input is empty");
    }

    let budget = frame_budget(options.duration_ms, options.fps);
    let plan = plan_chunk_size(total_bytes, budget, options.mtu, codec.capacity());
    info!(
        "Chunk size {} bytes ({:?} bound), frame budget {}",
        plan.chunk_size, plan.limit, plan.frame_budget
    );

    let expected = plan.frames_for(sources.iter().map(|s| s.data.len()));
    if expected as u64 > plan.frame_budget {
        info!(
            "{} frames exceed the budget of {}; the video will run past the requested duration",
            expected, plan.frame_budget
        );
    }

    let source_count = sources.len();
    let packer = FramePacker::new(sources, plan.chunk_size)?;
    let bar = progress_bar(packer.remaining() as u64, progress, "rendering");
    let mut renderer = SelfCheckedRenderer::new(codec, options.max_render_attempts);

    let mut frames = 0;
    for packed in packer {
        let rendered = renderer.render(packed?)?;
        frames += 1;

        let path = image_dir.join(rendered_image_name(frames, codec.image_extension()));
        fs::write(&path, &rendered.image)
            .with_context(|| format!("Failed to write image: {}", path.display()))?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(RenderSummary {
        plan,
        sources: source_count,
        total_bytes,
        frames,
        substituted: renderer.substituted(),
        extension: codec.image_extension(),
    })
}

pub fn execute(args: &EncodeArgs) -> Result<()> {
    info!(
        "Encoding {} into {}",
        args.input.display(),
        args.output.display()
    );

    let files = inputs::discover(&args.input)?;
    let sources = inputs::load(&files)?;

    let scratch = Scratch::create(args.scratch_dir.as_deref(), args.keep_scratch)
        .with_context(|| "Failed to create scratch directory")?;
    let codec = build_codec(args.options.codec);

    let summary = render_to_dir(
        sources,
        &args.options,
        codec.as_ref(),
        &scratch.render_dir(),
        args.progress,
    )?;

    info!("Composing {} images into {}", summary.frames, args.output.display());
    tools::compose_video(
        &scratch.render_dir(),
        summary.extension,
        summary.frames,
        args.options.duration_ms,
        args.options.fps,
        &args.output,
    )
    .with_context(|| format!("Failed to compose video: {}", args.output.display()))?;

    println!("\n=== Encode Results ===");
    println!("Sources:           {}", summary.sources);
    println!("Payload:           {} bytes", summary.total_bytes);
    println!("Chunk size:        {} bytes", summary.plan.chunk_size);
    println!("Frames:            {}", summary.frames);
    if summary.substituted > 0 {
        println!(
            "Substituted:       {}",
            summary.substituted.to_string().yellow()
        );
    } else {
        println!("Substituted:       {}", summary.substituted);
    }
    println!("{} Wrote {}", "✓".green(), args.output.display());

    Ok(())
}
