use clap::Parser;
use fftreg::image::io::load_gray_image;
use fftreg::{estimate_translation_with_report, EstimateConfig, Image2, TranslationTransform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "FFT-based translation initialization (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for the pipeline stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageConfig {
    path: String,
    spacing: Option<[f64; 2]>,
    origin: Option<[f64; 2]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    fixed: ImageConfig,
    moving: ImageConfig,
    output_path: Option<String>,
    required_fraction_of_overlapping_pixels: f64,
    masked_pixel_value: Option<f32>,
    initial_translation: Option<[f64; 2]>,
}

#[derive(Debug, Serialize)]
struct Output {
    translation: [f64; 2],
    composed: bool,
    peak_value: f64,
    regions: usize,
}

fn load(image: &ImageConfig) -> Result<Image2, Box<dyn std::error::Error>> {
    let loaded = load_gray_image(&image.path)?;
    let mut grid = loaded.grid().clone();
    if let Some(spacing) = image.spacing {
        grid = grid.with_spacing(spacing)?;
    }
    if let Some(origin) = image.origin {
        grid = grid.with_origin(origin)?;
    }
    Ok(loaded.with_grid(grid)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("fftreg=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.fixed.path.is_empty() || config.moving.path.is_empty() {
        return Err("fixed.path and moving.path must be set in the config".into());
    }

    let fixed = load(&config.fixed)?;
    let moving = load(&config.moving)?;

    let mut estimate =
        EstimateConfig::default().with_required_overlap(config.required_fraction_of_overlapping_pixels);
    if let Some(offset) = config.initial_translation {
        estimate = estimate.with_initial_transform(TranslationTransform::new(offset));
    }
    if let Some(value) = config.masked_pixel_value {
        estimate = estimate.with_masked_pixel_value(value);
    }

    let report = estimate_translation_with_report(&fixed, &moving, &estimate)?;
    tracing::info!(
        regions = report.regions,
        peak_value = report.peak_value,
        "estimate complete"
    );
    let output = Output {
        translation: report.transform.translation(),
        composed: report.transform.is_composed(),
        peak_value: report.peak_value,
        regions: report.regions,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
