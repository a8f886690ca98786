use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stagecraft::{
    AssetSource, Canvas, EmbeddedAlphaMatte, GenerationMode, MatteExtractor, PhysicalSpecs,
    Pipeline, PipelineConfig, StaticMatte, TextStyle,
};

#[derive(Parser, Debug)]
#[command(name = "stagecraft", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a product onto a stage and write a JPEG.
    Compose(ComposeArgs),
    /// Print the shadow transform derived from lighting/perspective descriptors.
    ShadowParams(ShadowParamsArgs),
    /// Print the placement box of a subject on a canvas.
    Fit(FitArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Background plate: path, data URL or http(s) URL.
    #[arg(long)]
    background: String,

    /// Original product photo.
    #[arg(long)]
    product: String,

    /// Precomputed matte; defaults to the product photo's own alpha.
    #[arg(long)]
    matte: Option<String>,

    /// Text style JSON.
    #[arg(long)]
    style: Option<PathBuf>,

    /// Override the style's title.
    #[arg(long)]
    title: Option<String>,

    /// Override the style's detail line.
    #[arg(long)]
    detail: Option<String>,

    /// Physical specs JSON (`lightingDirection`, `cameraPerspective`).
    #[arg(long)]
    specs: Option<PathBuf>,

    /// precision | creative
    #[arg(long, default_value = "precision")]
    mode: GenerationMode,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ShadowParamsArgs {
    /// Lighting descriptor.
    #[arg(long, default_value = "")]
    lighting: String,

    /// Camera perspective descriptor.
    #[arg(long, default_value = "")]
    perspective: String,
}

#[derive(Parser, Debug)]
struct FitArgs {
    /// Canvas size as `WxH`.
    #[arg(long, value_parser = parse_size)]
    canvas: (u32, u32),

    /// Subject size as `WxH`.
    #[arg(long, value_parser = parse_size)]
    subject: (u32, u32),

    /// Fraction of the constraining canvas axis the subject may fill.
    #[arg(long, default_value_t = 0.65)]
    padding: f64,

    /// Share of the free vertical space left above the subject.
    #[arg(long, default_value_t = 0.65)]
    bias: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stagecraft=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::ShadowParams(args) => cmd_shadow_params(args),
        Command::Fit(args) => cmd_fit(args),
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let mut style: TextStyle = match &args.style {
        Some(path) => read_json(path)?,
        None => TextStyle::default(),
    };
    if let Some(title) = args.title {
        style.title = title;
    }
    if let Some(detail) = args.detail {
        style.detail = detail;
    }
    let specs: PhysicalSpecs = match &args.specs {
        Some(path) => read_json(path)?,
        None => PhysicalSpecs::default(),
    };

    let extractor: Arc<dyn MatteExtractor> = match &args.matte {
        Some(src) => Arc::new(StaticMatte::new(AssetSource::parse(src))),
        None => Arc::new(EmbeddedAlphaMatte),
    };
    let pipeline = Pipeline::new(config, extractor)?;
    let report = pipeline.synthesize_with_report(
        &AssetSource::parse(&args.background),
        &AssetSource::parse(&args.product),
        &style,
        &specs,
        args.mode,
    )?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &report.bytes)
        .with_context(|| format!("write jpeg '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{})",
        args.out.display(),
        report.width,
        report.height
    );
    Ok(())
}

fn cmd_shadow_params(args: ShadowParamsArgs) -> anyhow::Result<()> {
    let specs = PhysicalSpecs::new(Some(&args.lighting), Some(&args.perspective));
    let out = serde_json::json!({
        "lightingDirection": specs.lighting_direction,
        "cameraPerspective": specs.camera_perspective,
        "params": specs.shadow_params(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_fit(args: FitArgs) -> anyhow::Result<()> {
    let canvas = Canvas::new(args.canvas.0, args.canvas.1)?;
    let placement = stagecraft::fit(
        canvas,
        args.subject.0,
        args.subject.1,
        args.padding,
        args.bias,
    )?;
    println!("{}", serde_json::to_string_pretty(&placement)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let f = std::fs::File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse '{}'", path.display()))
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w = w.trim().parse().map_err(|_| format!("invalid width in '{s}'"))?;
    let h = h.trim().parse().map_err(|_| format!("invalid height in '{s}'"))?;
    Ok((w, h))
}
