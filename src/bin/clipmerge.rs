use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clipmerge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the clips of a manifest into one MP4 (requires `ffmpeg` and `ffprobe` on PATH).
    Merge(MergeArgs),
    /// Print the per-clip playback plan as JSON (requires `ffprobe` on PATH).
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Input manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Override the output width (requires --height).
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Override the output height (requires --width).
    #[arg(long, requires = "width")]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clipmerge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Merge(args) => cmd_merge(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn read_manifest(path: &Path) -> anyhow::Result<clipmerge::MergeManifest> {
    let manifest = clipmerge::MergeManifest::from_path(path)
        .with_context(|| format!("load manifest '{}'", path.display()))?;
    manifest.validate()?;
    Ok(manifest)
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let mut manifest = read_manifest(&args.in_path)?;
    if let (Some(width), Some(height)) = (args.width, args.height) {
        manifest.opts.canvas = Some(clipmerge::Canvas::new(width, height)?);
    }

    let sink = clipmerge::FfmpegSink::new(clipmerge::FfmpegSinkOpts {
        bg_rgba: manifest.opts.background_rgba,
        ..clipmerge::FfmpegSinkOpts::new(&args.out)
    });

    let mut last = None;
    let mut on_progress = |pct: u8| {
        if last != Some(pct) {
            tracing::info!(progress = pct, "merging");
            last = Some(pct);
        }
    };
    let out = clipmerge::merge(
        clipmerge::FfmpegOpener,
        sink,
        &manifest.clips,
        manifest.opts.clone(),
        Some(&mut on_progress),
    )
    .with_context(|| format!("merge '{}'", args.in_path.display()))?;

    eprintln!(
        "wrote {} ({} bytes, {:.3}s, {}x{})",
        args.out.display(),
        out.bytes.len(),
        out.total_duration,
        out.canvas.width,
        out.canvas.height
    );
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.in_path)?;

    let mut plans = Vec::with_capacity(manifest.clips.len());
    let mut cursor = 0.0;
    for (i, clip) in manifest.clips.iter().enumerate() {
        let info = clipmerge::probe_media(&clip.source)
            .with_context(|| format!("probe '{}'", clip.source.display()))?;
        plans.push(clipmerge::plan_clip(
            i,
            info.duration,
            clip.target_duration,
            cursor,
        )?);
        cursor += clip.target_duration;
    }

    let json = serde_json::to_string_pretty(&plans).context("serialize plan")?;
    println!("{json}");
    Ok(())
}
