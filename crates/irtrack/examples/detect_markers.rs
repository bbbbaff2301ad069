use std::{env, fs, path::PathBuf};

use irtrack::detect::detect_markers;
use irtrack::MarkerDetectorParams;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "tracing"))]
use log::{info, warn, LevelFilter};

#[cfg(feature = "tracing")]
use tracing::{info, warn};

#[cfg(feature = "tracing")]
use irtrack::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use irtrack::core::init_with_level;

#[derive(Debug, Deserialize)]
struct ExampleConfig {
    image_path: String,
    #[serde(default)]
    output_path: Option<String>,
    #[serde(default)]
    visualization_path: Option<String>,
    #[serde(default)]
    detector: MarkerDetectorParams,
}

#[derive(Debug, Serialize)]
struct ExampleReport {
    image_path: String,
    config_path: String,
    params: MarkerDetectorParams,
    markers: Vec<[f32; 2]>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(not(feature = "tracing"))]
    init_with_level(LevelFilter::Info)?;

    #[cfg(feature = "tracing")]
    init_tracing(false);

    run()
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: detect_markers <config.json>")?;
    let cfg: ExampleConfig = serde_json::from_str(&fs::read_to_string(&config_path)?)?;

    let img = image::open(&cfg.image_path)?.to_luma8();
    let detection = detect_markers(&img, cfg.detector.clone());
    if detection.markers.is_empty() {
        warn!("no markers above threshold {}", cfg.detector.threshold);
    } else {
        info!("detected {} marker(s)", detection.markers.len());
    }

    if let Some(path) = &cfg.visualization_path {
        detection.visualization.save(path)?;
        info!("wrote visualization to {path}");
    }

    let report = ExampleReport {
        image_path: cfg.image_path.clone(),
        config_path: config_path.display().to_string(),
        params: cfg.detector,
        markers: detection.markers.iter().map(|p| [p.x, p.y]).collect(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &cfg.output_path {
        Some(path) => {
            fs::write(path, json)?;
            println!("wrote detection JSON to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
