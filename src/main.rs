use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use counter::{AppContext, Settings};

#[derive(Parser)]
#[command(name = "counter")]
#[command(about = "Count the objects detected in an image and update the running totals")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Minimum confidence score for a detection to be counted
    #[arg(value_name = "THRESHOLD", allow_negative_numbers = true)]
    threshold: f32,

    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();
    info!(image = ?args.image_path, threshold = args.threshold, "starting count");

    let image = tokio::fs::read(&args.image_path)
        .await
        .with_context(|| format!("Failed to read image {:?}", args.image_path))?;

    let context = AppContext::from_settings(&args.settings).await?;
    let result = context.count_action().execute(&image, args.threshold).await;
    context.shutdown().await;

    let response = result.inspect_err(|e| error!(error = %e, "count failed"))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
