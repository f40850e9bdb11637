use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use inkframe::session::services;
use inkframe::{
    FrameComposer, FrameRequest, InkframeConfig, RotationManager, WeeklyArtGenerator,
    next_week_start,
};

#[derive(Parser, Debug)]
#[command(name = "inkframe", version)]
struct Cli {
    /// Config JSON. `INKFRAME_*` environment variables override it.
    #[arg(long, global = true, env = "INKFRAME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one frame as a PNG.
    Frame(FrameArgs),
    /// Print the data a layout would bind to, as JSON.
    RenderData(DataArgs),
    /// Store a layout document for a device.
    SaveLayout(SaveLayoutArgs),
    /// Rotate stock-photo partitions and fetch a fresh batch.
    Rotate(RotateArgs),
    /// Generate a week of backgrounds with the image model.
    GenerateWeek(WeekArgs),
    /// Print the effective configuration.
    ShowConfig,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Background variant (index into the weekly prompts).
    #[arg(long, default_value_t = 0)]
    variant: u32,

    /// Day slot, 0 = Monday. Defaults to the weekday of `--date`.
    #[arg(long)]
    day: Option<u32>,

    #[arg(long)]
    theme: Option<String>,

    /// Leave the joke element empty.
    #[arg(long)]
    no_joke: bool,

    /// Force palette quantization on or off.
    #[arg(long)]
    quantize: Option<bool>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Also print diagnostics as JSON on stdout.
    #[arg(long)]
    diagnostics: bool,
}

#[derive(Parser, Debug)]
struct DataArgs {
    #[command(flatten)]
    target: TargetArgs,
}

#[derive(Parser, Debug)]
struct TargetArgs {
    #[arg(long, default_value = "familydisplay")]
    device: String,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    units: Option<String>,

    /// Render date (YYYY-MM-DD); today when omitted.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Owner email when per-user layouts are enabled.
    #[arg(long)]
    user: Option<String>,
}

#[derive(Parser, Debug)]
struct SaveLayoutArgs {
    #[arg(long, default_value = "familydisplay")]
    device: String,

    #[arg(long)]
    user: Option<String>,

    /// Layout JSON file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct RotateArgs {
    /// Themes to rotate; all configured themes when omitted.
    #[arg(long)]
    theme: Vec<String>,
}

#[derive(Parser, Debug)]
struct WeekArgs {
    /// Monday to generate for; the next Monday when omitted.
    #[arg(long)]
    week_start: Option<NaiveDate>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = InkframeConfig::load(cli.config.as_deref()).context("load configuration")?;
    match cli.cmd {
        Command::Frame(args) => cmd_frame(config, args),
        Command::RenderData(args) => cmd_render_data(config, args),
        Command::SaveLayout(args) => cmd_save_layout(config, args),
        Command::Rotate(args) => cmd_rotate(config, args),
        Command::GenerateWeek(args) => cmd_generate_week(config, args),
        Command::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn request_for(target: TargetArgs) -> FrameRequest {
    let date = target
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut req = FrameRequest::for_date(target.device, date);
    req.city = target.city;
    req.units = target.units;
    req.username = target.user;
    req
}

fn cmd_frame(config: InkframeConfig, args: FrameArgs) -> anyhow::Result<()> {
    let composer = FrameComposer::from_config(config).context("build frame composer")?;

    let mut req = request_for(args.target);
    if let Some(day) = args.day {
        req.day_index = day;
    }
    req.variant_index = args.variant;
    req.theme = args.theme;
    req.show_joke = !args.no_joke;
    req.quantize = args.quantize;

    let frame = composer.render_frame(&req).context("render frame")?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &frame.png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    if args.diagnostics {
        println!("{}", serde_json::to_string_pretty(&frame.diagnostics)?);
    }
    for (name, value) in frame.diagnostics.headers() {
        eprintln!("{name}: {value}");
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render_data(config: InkframeConfig, args: DataArgs) -> anyhow::Result<()> {
    let composer = FrameComposer::from_config(config).context("build frame composer")?;
    let ctx = composer.render_data(&request_for(args.target))?;
    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let bytes = std::fs::read(path).with_context(|| format!("open layout '{}'", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| "parse layout JSON")
}

fn cmd_save_layout(config: InkframeConfig, args: SaveLayoutArgs) -> anyhow::Result<()> {
    let payload = read_json(&args.in_path)?;
    let composer = FrameComposer::from_config(config).context("build frame composer")?;
    let key = composer
        .layouts()
        .save(&args.device, args.user.as_deref(), &payload)?;
    eprintln!("saved {key}");
    Ok(())
}

fn cmd_rotate(config: InkframeConfig, args: RotateArgs) -> anyhow::Result<()> {
    let provider = services::stock_provider(&config)
        .context("stock rotation needs the pexels feature and INKFRAME_PEXELS_KEY")?;
    let store = services::open_store(&config)?;
    let manager = RotationManager::new(
        store,
        provider,
        config.keys_layout.clone(),
        config.rotation,
    );
    let themes = if args.theme.is_empty() {
        config.themes.clone()
    } else {
        args.theme
    };

    let mut failed = 0usize;
    for (theme, result) in manager.rotate_all(&themes) {
        match result {
            Ok(report) => println!("{}", serde_json::to_string(&report)?),
            Err(e) => {
                failed += 1;
                eprintln!("{theme}: {e}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} themes failed to rotate", themes.len());
    }
    Ok(())
}

fn cmd_generate_week(config: InkframeConfig, args: WeekArgs) -> anyhow::Result<()> {
    let generator = services::image_generator(&config)
        .context("weekly generation needs INKFRAME_HF_TOKEN")?;
    let store = services::open_store(&config)?;
    let week_start = args
        .week_start
        .unwrap_or_else(|| next_week_start(chrono::Local::now().date_naive()));
    let job = WeeklyArtGenerator::new(
        store,
        generator,
        config.keys_layout.clone(),
        config.theme_prompts.clone(),
        config.canvas,
    );
    let report = job.generate_week(week_start)?;
    eprintln!(
        "week of {week_start}: {} written, {} failed",
        report.written.len(),
        report.failed
    );
    Ok(())
}
