use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use subburn_engine::config::{self, AccelCategory};
use subburn_engine::{startup, Engine};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "subburn")]
#[command(about = "Batch subtitle burn-in tool", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory containing the video files
    #[arg(long, value_name = "DIR")]
    video_root: Option<PathBuf>,

    /// Directory containing per-language subtitle subdirectories
    #[arg(long, value_name = "DIR")]
    subtitle_root: Option<PathBuf>,

    /// Directory to write burned videos into
    #[arg(long, value_name = "DIR")]
    output_root: Option<PathBuf>,

    /// Directory containing local font files
    #[arg(long, value_name = "DIR")]
    fonts_dir: Option<PathBuf>,

    /// Enable hardware-accelerated encoding
    #[arg(long)]
    gpu: bool,

    /// Hardware category: auto, nvidia, amd, intel, apple, cpu
    #[arg(long, value_name = "TYPE")]
    gpu_type: Option<String>,

    /// Encoder quality in the selected encoder's native units
    #[arg(long)]
    quality: Option<u32>,

    /// Subtitle font size
    #[arg(long)]
    font_size: Option<u32>,

    /// Subtitle vertical margin
    #[arg(long)]
    margin_v: Option<u32>,

    /// Subtitle alignment (1-9, numeric keypad layout)
    #[arg(long)]
    alignment: Option<u8>,

    /// Font family name or font file path
    #[arg(long)]
    font: Option<String>,

    /// Subtitle outline thickness
    #[arg(long)]
    outline: Option<u32>,

    /// Subtitle shadow depth
    #[arg(long)]
    shadow: Option<u32>,

    /// Disable automatic per-language font selection
    #[arg(long)]
    no_auto_font: bool,

    /// List the font files in the fonts directory and exit
    #[arg(long)]
    list_fonts: bool,

    /// Print the recommended fonts for a language code and exit
    #[arg(long, value_name = "LANG")]
    recommend: Option<String>,

    /// Print the final run state as JSON when the batch ends
    #[arg(long)]
    json: bool,
}

fn parse_gpu_type(value: &str) -> Result<AccelCategory> {
    match value.to_lowercase().as_str() {
        "auto" => Ok(AccelCategory::Auto),
        "nvidia" => Ok(AccelCategory::Nvidia),
        "amd" => Ok(AccelCategory::Amd),
        "intel" => Ok(AccelCategory::Intel),
        "apple" => Ok(AccelCategory::Apple),
        "cpu" => Ok(AccelCategory::Cpu),
        other => Err(anyhow::anyhow!(
            "Unknown gpu type '{}'. Expected one of: auto, nvidia, amd, intel, apple, cpu",
            other
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with timestamps and levels
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .init();

    info!("subburn v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration, then apply command line overrides
    info!("Loading configuration...");
    let mut config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if let Some(video_root) = args.video_root {
        config.video_root = video_root;
    }
    if let Some(subtitle_root) = args.subtitle_root {
        config.subtitle_root = subtitle_root;
    }
    if let Some(output_root) = args.output_root {
        config.output_root = output_root;
    }
    if let Some(fonts_dir) = args.fonts_dir {
        config.fonts_dir = fonts_dir;
    }
    if args.gpu {
        config.accel.enabled = true;
    }
    if let Some(gpu_type) = args.gpu_type.as_deref() {
        config.accel.category = parse_gpu_type(gpu_type)?;
    }
    if let Some(quality) = args.quality {
        config.accel.quality = Some(quality);
    }
    if let Some(font_size) = args.font_size {
        config.style.font_size = Some(font_size);
    }
    if let Some(margin_v) = args.margin_v {
        config.style.margin_v = Some(margin_v);
    }
    if let Some(alignment) = args.alignment {
        config.style.alignment = Some(alignment);
    }
    if let Some(font) = args.font {
        config.style.font = Some(font);
    }
    if let Some(outline) = args.outline {
        config.style.outline = Some(outline);
    }
    if let Some(shadow) = args.shadow {
        config.style.shadow = Some(shadow);
    }
    if args.no_auto_font {
        config.style.auto_font = false;
    }

    config::validate_config(&config)?;

    let engine = Engine::new(config.fonts_dir.clone());

    // Font queries short-circuit before any ffmpeg involvement
    if args.list_fonts {
        let assets = engine.list_font_assets();
        if assets.is_empty() {
            info!("No font files found in {}", config.fonts_dir.display());
        } else {
            for asset in assets {
                info!("{}  ({})", asset.name, asset.path.display());
            }
        }
        return Ok(());
    }

    if let Some(language) = args.recommend {
        for font in engine.recommend_font(&language) {
            info!("{}", font);
        }
        return Ok(());
    }

    // Startup validation
    info!("Checking ffmpeg...");
    match startup::check_ffmpeg() {
        Ok((major, minor, patch)) => {
            info!("ffmpeg version: {}.{}.{}", major, minor, patch);
        }
        Err(e) => {
            error!("ffmpeg check failed: {}", e);
            return Err(e);
        }
    }

    info!("Video root: {:?}", config.video_root);
    info!("Subtitle root: {:?}", config.subtitle_root);
    info!("Output root: {:?}", config.output_root);
    info!("Fonts dir: {:?}", config.fonts_dir);
    info!("Hardware acceleration: {}", config.accel.enabled);

    // Kick off the batch and stream its log
    if let Err(e) = engine.start(config) {
        error!("Failed to start batch: {}", e);
        return Err(e.into());
    }

    let mut printed = 0usize;
    let mut interrupt = Box::pin(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                info!("Interrupt received, stopping batch...");
                if let Err(e) = engine.request_stop().await {
                    warn!("Stop request rejected: {}", e);
                }
                interrupt = Box::pin(tokio::signal::ctrl_c());
            }
            _ = tokio::time::sleep(Duration::from_millis(300)) => {}
        }

        let status = engine.status();
        for line in status.logs.iter().skip(printed) {
            info!("{}", line);
        }
        printed = printed.max(status.logs.len());

        if !status.is_running {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            if status.is_done {
                info!(
                    "Batch completed: {}/{} tasks",
                    status.completed_count, status.total_count
                );
            } else if status.stop_requested {
                info!(
                    "Batch stopped: {}/{} tasks done",
                    status.completed_count, status.total_count
                );
            } else {
                let reason = status
                    .last_error
                    .unwrap_or_else(|| "unknown failure".to_string());
                error!("Batch failed: {}", reason);
                return Err(anyhow::anyhow!("batch failed: {}", reason));
            }
            break;
        }
    }

    Ok(())
}
