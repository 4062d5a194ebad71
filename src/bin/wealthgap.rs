use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "wealthgap", version, about = "Render the wealth gap chart animation")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the full animation as a GIF.
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print the per-frame plan (year, theme, axes) as JSON lines.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input CSV with Year, Ratio and optional Events columns.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// JSON config file; flags given here override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pixels per inch of the 16x9 inch figure.
    #[arg(long)]
    dpi: Option<u32>,

    /// Extra directory to load fonts from (repeatable).
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output GIF path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Playback rate in frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_clobber: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Also write the frame's SVG next to the PNG.
    #[arg(long)]
    svg: bool,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Input CSV with Year, Ratio and optional Events columns.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<wealthgap::ChartConfig> {
    match path {
        Some(p) => Ok(wealthgap::ChartConfig::load(p)?),
        None => Ok(wealthgap::ChartConfig::default()),
    }
}

fn apply_common(cfg: &mut wealthgap::ChartConfig, common: CommonArgs) {
    if let Some(p) = common.in_path {
        cfg.input = p;
    }
    if let Some(dpi) = common.dpi {
        cfg.dpi = dpi;
    }
    cfg.font_dirs.extend(common.font_dirs);
}

fn open_session(cfg: &wealthgap::ChartConfig) -> anyhow::Result<wealthgap::AnimationSession> {
    cfg.validate()?;
    let series = wealthgap::Series::load(&cfg.input)
        .with_context(|| format!("load series '{}'", cfg.input.display()))?;
    let fonts = wealthgap::FontSet::load(&cfg.font_dirs)?;
    Ok(wealthgap::AnimationSession::new(series, cfg, &fonts)?)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.common.config.as_deref())?;
    apply_common(&mut cfg, args.common);
    if let Some(out) = args.out {
        cfg.output = out;
    }
    if let Some(fps) = args.fps {
        cfg.fps = fps;
    }

    let mut session = open_session(&cfg)?;

    let mut opts = wealthgap::GifSinkOpts::new(cfg.output.clone());
    opts.speed = cfg.gif_speed;
    opts.overwrite = !args.no_clobber;
    let mut sink = wealthgap::GifSink::new(opts)?;

    let stats = session.render_all(&mut sink)?;
    eprintln!(
        "wrote {} ({} frames)",
        cfg.output.display(),
        stats.frames_rendered
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.common.config.as_deref())?;
    apply_common(&mut cfg, args.common);

    let mut session = open_session(&cfg)?;
    let frame = wealthgap::FrameIndex(args.frame);
    let pixels = session.render_frame(frame)?;
    wealthgap::write_png(&args.out, &pixels)?;

    if args.svg {
        let svg_path = args.out.with_extension("svg");
        let svg = session.frame_svg(frame)?;
        std::fs::write(&svg_path, svg)
            .with_context(|| format!("write svg '{}'", svg_path.display()))?;
        eprintln!("wrote {}", svg_path.display());
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(p) = args.in_path {
        cfg.input = p;
    }
    cfg.validate()?;

    let series = wealthgap::Series::load(&cfg.input)
        .with_context(|| format!("load series '{}'", cfg.input.display()))?;
    let y_top = wealthgap::axes::y_top(series.max_ratio(), cfg.headroom);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for i in 0..series.len() as u64 {
        let plan = wealthgap::FramePlan::for_frame(&series, wealthgap::FrameIndex(i), y_top)?;
        serde_json::to_writer(&mut out, &plan).context("serialize frame plan")?;
        writeln!(out).context("write frame plan")?;
    }
    Ok(())
}
