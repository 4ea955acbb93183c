// Example runner for the `image_insight` library: decodes one image file,
// runs every analysis on the worker pool and prints the records as JSON.
//
// Usage: image_insight <image_path> [config.json]
// Set RUST_LOG=debug to see per-analysis timings.

use anyhow::Context;
use image_insight::parallel_pipeline::AnalysisSession;
use image_insight::{AnalysisConfig, AnalysisKind, ImageMetadata, PixelBuffer};
use std::env;
use std::path::Path;
use std::time::UNIX_EPOCH;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: image_insight <image_path> [config.json]");
        return Ok(());
    }
    let image_path = Path::new(&args[1]);

    let config = match args.get(2) {
        Some(config_path) => AnalysisConfig::from_json_file(config_path)?,
        None => AnalysisConfig::default(),
    };

    // --- Decode (the analyzers only ever see RGBA bytes) ---
    let decoded = image::open(image_path)
        .with_context(|| format!("failed to decode {}", image_path.display()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let buffer = PixelBuffer::new(width, height, decoded.into_raw())?;

    let file_metadata = std::fs::metadata(image_path)
        .with_context(|| format!("failed to stat {}", image_path.display()))?;
    let last_modified = file_metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_millis() as u64);
    let mime_type = image::ImageFormat::from_path(image_path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string());

    let metadata = ImageMetadata {
        size_bytes: file_metadata.len(),
        mime_type,
        last_modified,
    };

    // --- Analyze ---
    let session = AnalysisSession::new(config)?;
    let tag = session.select_image(buffer, metadata).await;
    let outcomes = session
        .analyze(tag, &AnalysisKind::ALL)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    session.shutdown().await;
    Ok(())
}
