use std::path::PathBuf;

use clap::Parser;
use snafu::ResultExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lanms_core::{
    NmsConfigBuilder, NmsMethod,
    consts::DEFAULT_IOU_THRESHOLD,
    detections::{load_detections, save_detections, to_json},
    error::ConfigSnafu,
};

#[derive(Parser)]
#[command(name = "lanms")]
#[command(about = "Merge oriented text detections with (locality-aware) NMS")]
struct Args {
    #[arg(help = "Input JSON file with detections")]
    input: PathBuf,

    #[arg(short, long, help = "Output JSON file (stdout when omitted)")]
    output: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_enum,
        default_value_t = NmsMethod::LocalityAware,
        help = "Suppression strategy"
    )]
    method: NmsMethod,

    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_IOU_THRESHOLD,
        help = "IoU threshold in [0, 1]"
    )]
    iou_threshold: f32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = NmsConfigBuilder::default()
        .method(args.method)
        .iou_threshold(args.iou_threshold)
        .build()
        .context(ConfigSnafu)?;

    info!("Loading detections from: {}", args.input.display());
    let boxes = load_detections(&args.input)?;
    let candidates = boxes.len();

    if boxes.is_empty() {
        warn!("No detections in {}", args.input.display());
    }

    info!(
        "Applying {:?} NMS with IoU threshold: {}",
        config.method, config.iou_threshold
    );
    let start_time = std::time::Instant::now();
    let merged = config.apply(boxes);
    info!(
        "NMS completed in {}us. Kept {} out of {} detections",
        start_time.elapsed().as_micros(),
        merged.len(),
        candidates
    );

    match args.output {
        Some(path) => {
            save_detections(&path, &merged)?;
            info!("Merged detections saved to: {}", path.display());
        }
        None => println!("{}", to_json(&merged)?),
    }

    Ok(())
}
