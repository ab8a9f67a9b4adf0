use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use behind_text::{
    AcquisitionProgress, CancelToken, Compositor, CompositorOpts, ContainerSize, CutoutFileProvider,
    DepthAcquisition, DepthMapFileEstimator, EditorSession, FrameRGBA, TextOverlayParams,
    TextOverlayPatch, TextRasterizer,
};

#[derive(Parser, Debug)]
#[command(
    name = "behind-text",
    version,
    about = "Place text behind the subject of a photo"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Extra directory of .ttf/.otf/.ttc fonts, in addition to system fonts.
    #[arg(long, global = true)]
    fonts_dir: Option<PathBuf>,

    /// Reject input images larger than this many megabytes.
    #[arg(long, default_value_t = 10, global = true)]
    max_file_mb: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render at full resolution and write a PNG.
    Compose(ComposeArgs),
    /// Render a container-fitted preview frame.
    Preview(PreviewArgs),
    /// Write the refined foreground mask as a grayscale PNG.
    Mask(MaskArgs),
    /// Process a JSON manifest of generation requests.
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input photo (JPEG, PNG or WebP).
    #[arg(long)]
    image: PathBuf,

    /// Grayscale depth map, brighter is closer.
    #[arg(long)]
    depth: Option<PathBuf>,

    /// Background-removal cutout (RGBA); used only when no depth map is given.
    #[arg(long)]
    cutout: Option<PathBuf>,

    /// JSON file with text parameter overrides (camelCase keys).
    #[arg(long)]
    params: Option<PathBuf>,

    /// Single override such as `text=HELLO` or `fontSize=90`. Repeatable; applied last.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Overlay the corner watermark.
    #[arg(long)]
    watermark: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Container size in CSS pixels, e.g. `800x600`.
    #[arg(long, value_parser = parse_container)]
    container: (f64, f64),

    /// Device pixel ratio (capped at 3).
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct MaskArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Depth threshold on the 0-255 scale.
    #[arg(long)]
    threshold: Option<f32>,

    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// JSON file with one request object or an array of them.
    #[arg(long)]
    manifest: PathBuf,

    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let rasterizer = TextRasterizer::new(cli.fonts_dir.as_deref());
    let compositor = Compositor::new(CompositorOpts::default(), rasterizer);
    let max_bytes = Some(cli.max_file_mb.saturating_mul(1024 * 1024));

    match cli.cmd {
        Command::Compose(args) => cmd_compose(compositor, max_bytes, args),
        Command::Preview(args) => cmd_preview(compositor, max_bytes, args),
        Command::Mask(args) => cmd_mask(compositor, max_bytes, args),
        Command::Batch(args) => cmd_batch(compositor, max_bytes, args),
    }
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.is_empty() => EnvFilter::try_new(spec)?,
        _ => EnvFilter::try_new(match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        })?,
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

fn parse_container(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    Ok((w, h))
}

fn read_patch(input: &InputArgs) -> anyhow::Result<TextOverlayPatch> {
    let mut patch = match &input.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read params '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parse params '{}'", path.display()))?
        }
        None => TextOverlayPatch::default(),
    };
    for assignment in &input.set {
        patch = patch.merge(&TextOverlayPatch::parse_assignment(assignment)?);
    }
    Ok(patch)
}

/// Session with the image, its depth or cutout, and the requested parameters loaded.
fn open_session(
    compositor: Compositor,
    max_bytes: Option<u64>,
    input: &InputArgs,
) -> anyhow::Result<EditorSession> {
    let mut session = EditorSession::new(compositor, TextOverlayParams::from_env());
    session.apply_patch(&read_patch(input)?)?;
    session.load_image(behind_text::load_image_file(&input.image, max_bytes)?);

    if let Some(depth) = &input.depth {
        let mut acquisition = DepthAcquisition::new(Box::new(DepthMapFileEstimator::new(depth)));
        session.acquire_depth(&mut acquisition, &CancelToken::new(), |p: AcquisitionProgress| {
            tracing::debug!(percent = p.percent, "{}", p.stage.status());
        })?;
    } else if let Some(cutout) = &input.cutout {
        session.acquire_cutout(&mut CutoutFileProvider::new(cutout))?;
    }
    Ok(session)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_compose(
    compositor: Compositor,
    max_bytes: Option<u64>,
    args: ComposeArgs,
) -> anyhow::Result<()> {
    let mut session = open_session(compositor, max_bytes, &args.input)?;
    let png = session.export_png(args.watermark)?;
    ensure_parent(&args.out)?;
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_preview(
    compositor: Compositor,
    max_bytes: Option<u64>,
    args: PreviewArgs,
) -> anyhow::Result<()> {
    let mut session = open_session(compositor, max_bytes, &args.input)?;
    let (w, h) = args.container;
    let mut surface = FrameRGBA::default();
    let size = session.render_preview(ContainerSize::new(w, h, args.dpr), &mut surface)?;
    ensure_parent(&args.out)?;
    surface.save_png(&args.out)?;
    eprintln!(
        "wrote {} ({}x{})",
        args.out.display(),
        size.width,
        size.height
    );
    Ok(())
}

fn cmd_mask(compositor: Compositor, max_bytes: Option<u64>, args: MaskArgs) -> anyhow::Result<()> {
    let mut session = open_session(compositor, max_bytes, &args.input)?;
    if let Some(threshold) = args.threshold {
        session.apply_patch(&TextOverlayPatch {
            depth_threshold: Some(threshold),
            ..TextOverlayPatch::default()
        })?;
    }
    let mask = session
        .mask(None)?
        .context("mask needs --depth or --cutout")?;
    ensure_parent(&args.out)?;
    mask.to_gray_image()
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_batch(
    mut compositor: Compositor,
    max_bytes: Option<u64>,
    args: BatchArgs,
) -> anyhow::Result<()> {
    let requests = behind_text::load_manifest(&args.manifest)?;
    let base = TextOverlayParams::from_env();
    let reports =
        behind_text::run_batch(&mut compositor, &base, &requests, &args.out_dir, max_bytes)?;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} batch items failed", reports.len());
    }
    Ok(())
}
