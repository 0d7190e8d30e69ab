use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt as _;

use adcraft::{
    AssetSource, DirectorySink, FontFace, GeminiClient, GeminiImageGenerator, GeminiJudge,
    Orchestrator, RunConfig, Typography,
};

/// Fallback fonts probed when neither `--font` nor the config names one.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Parser, Debug)]
#[command(name = "adcraft", version)]
struct Cli {
    /// Mirror log output to this file.
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate, compose and review creatives for every product and aspect ratio of a brief.
    Run(RunArgs),
    /// Compose one creative from a local background, without any remote calls.
    Layout(LayoutArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Campaign brief JSON.
    #[arg(long)]
    brief: PathBuf,

    /// Output directory.
    #[arg(long)]
    output: PathBuf,

    /// Run configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the brief's locale (e.g. `fr_CA`).
    #[arg(long)]
    locale: Option<String>,

    /// Attempt budget per unit.
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Worker threads for unit fan-out.
    #[arg(long)]
    workers: Option<usize>,

    /// TrueType/OpenType font for overlay copy.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Background image.
    #[arg(long)]
    background: PathBuf,

    /// Copy to place in the safe zone.
    #[arg(long)]
    text: String,

    /// Aspect ratio label from the configured table.
    #[arg(long, default_value = "1x1")]
    aspect: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Logo (PNG, JPEG or SVG).
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Run configuration JSON (aspect table, logo corner, font).
    #[arg(long)]
    config: Option<PathBuf>,

    /// TrueType/OpenType font for overlay copy.
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Layout(args) => cmd_layout(args),
    }
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log dir '{}'", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("create log file '{}'", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::io::stderr.and(Arc::new(file)))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RunConfig> {
    match path {
        Some(p) => Ok(RunConfig::load(p)?),
        None => Ok(RunConfig::default()),
    }
}

fn resolve_font(flag: Option<&Path>, config: &RunConfig) -> anyhow::Result<FontFace> {
    let path = flag
        .map(Path::to_path_buf)
        .or_else(|| config.font_path.clone())
        .or_else(|| {
            SYSTEM_FONT_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.is_file())
        })
        .context("no font available; pass --font or set font_path in the config")?;
    tracing::info!(font = %path.display(), "using overlay font");
    Ok(FontFace::load(&AssetSource::Path(path))?)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(n) = args.max_attempts {
        config.max_attempts = n;
    }
    if let Some(n) = args.workers {
        config.workers = n;
    }
    config.validate()?;

    let mut brief = adcraft::load_brief(&args.brief, &config.aspect_ratios)?;
    if let Some(locale) = args.locale {
        brief.locale = locale;
    }

    let typography = Typography::new(resolve_font(args.font.as_deref(), &config)?)
        .with_logo_corner(config.logo_corner);
    let client = GeminiClient::from_settings(&config.gemini, config.request_timeout())?;
    let generator = GeminiImageGenerator::new(client.clone(), config.gemini.image_model.clone());
    let judge = GeminiJudge::new(client, config.gemini.review_model.clone());

    let mut sink = DirectorySink::new(&args.output);
    let summary = Orchestrator::new(&generator, &judge, &config, &typography).run(&brief, &mut sink)?;

    for unit in &summary.units {
        let detail = match (&unit.error, unit.quality_score) {
            (Some(e), _) => format!("{}: {}", e.kind, e.message),
            (None, Some(score)) => format!(
                "attempt {} score {score}",
                unit.selected_attempt.unwrap_or_default()
            ),
            (None, None) => String::new(),
        };
        println!(
            "{:<24} {:<6} {:<24} {detail}",
            unit.product_id,
            unit.aspect_label,
            unit.status.as_str()
        );
    }
    println!(
        "accepted {} / exhausted {} / failed {} -> {}",
        summary.accepted,
        summary.exhausted,
        summary.failed,
        sink.root().display()
    );

    if summary.all_failed() {
        anyhow::bail!("every unit failed");
    }
    Ok(())
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let spec = config
        .aspect(&args.aspect)
        .with_context(|| format!("unknown aspect ratio '{}'", args.aspect))?;

    let bytes = std::fs::read(&args.background)
        .with_context(|| format!("read background '{}'", args.background.display()))?;
    let background = adcraft::assets::decode::decode_raster(&bytes)?;
    let logo = args
        .logo
        .map(|p| adcraft::decode_logo(&AssetSource::Path(p)))
        .transpose()?;

    let typography = Typography::new(resolve_font(args.font.as_deref(), &config)?)
        .with_logo_corner(config.logo_corner);
    let composite = adcraft::compose(&background, &args.text, logo.as_ref(), spec, &typography)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    composite
        .image
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    println!("{}", serde_json::to_string_pretty(&composite.layout)?);
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
