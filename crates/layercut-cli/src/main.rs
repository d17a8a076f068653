//! layercut: split an image into luminance-banded stencil layers.
//!
//! Reads an image file, runs the stencil pipeline with configurable
//! parameters, prints per-stage diagnostics, and writes one PNG mask per
//! threshold plus the composite preview. Useful for:
//!
//! - Producing cut-ready layers without the browser front end
//! - Tuning thresholds, blur radius, and resize scale on real photos
//! - Measuring per-layer durations at different working resolutions
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin layercut -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use layercut_export::{ExportNaming, ExportedImage};
use layercut_pipeline::{
    MedianMode, PipelineConfig, QualityPreset, ResampleFilter, RgbaImage, StencilResult,
    SystemClock, Thresholds,
};
use tracing_subscriber::EnvFilter;

/// Split an image into stencil layers for multi-layer paper cuts.
///
/// Each threshold point produces one binary mask: white where the
/// working luminance is at or below the threshold.
#[derive(Parser)]
#[command(name = "layercut", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Directory to write PNG masks and the composite into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Filename stem for written PNGs (defaults to the image's stem).
    #[arg(long)]
    stem: Option<String>,

    /// Threshold points, comma-separated (1-4 values in 0-255).
    #[arg(long, value_delimiter = ',')]
    thresholds: Option<Vec<u8>>,

    /// Quality preset; sets resize scale and blur radius.
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Gaussian blur radius. Overrides the preset.
    #[arg(long)]
    blur_radius: Option<f32>,

    /// Resize factor applied before blurring. Overrides the preset.
    #[arg(long)]
    resize_scale: Option<f64>,

    /// Median window radius (0 disables smoothing).
    #[arg(long)]
    smoothing_radius: Option<u32>,

    /// Median smoothing strategy.
    #[arg(long, value_enum)]
    median: Option<Median>,

    /// Resize filter.
    #[arg(long, value_enum)]
    filter: Option<Filter>,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Also write a posterized preview with every band in one image.
    #[arg(long)]
    posterize: bool,

    /// Run and report without writing any PNGs.
    #[arg(long)]
    no_write: bool,
}

/// Quality preset selection.
#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Half resolution, light blur, no smoothing.
    Low,
    /// 70% resolution, moderate blur.
    Medium,
    /// Full resolution, strong blur.
    High,
}

/// Median smoothing selection.
#[derive(Clone, Copy, ValueEnum)]
enum Median {
    /// Horizontal then vertical 1-D median (fast).
    Separable,
    /// Full square-window median.
    Exact,
}

/// Resize filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

const fn preset_to_pipeline(p: Preset) -> QualityPreset {
    match p {
        Preset::Low => QualityPreset::Low,
        Preset::Medium => QualityPreset::Medium,
        Preset::High => QualityPreset::High,
    }
}

const fn median_to_pipeline(m: Median) -> MedianMode {
    match m {
        Median::Separable => MedianMode::Separable,
        Median::Exact => MedianMode::Exact,
    }
}

const fn filter_to_pipeline(f: Filter) -> ResampleFilter {
    match f {
        Filter::Nearest => ResampleFilter::Nearest,
        Filter::Triangle => ResampleFilter::Triangle,
        Filter::CatmullRom => ResampleFilter::CatmullRom,
        Filter::Gaussian => ResampleFilter::Gaussian,
        Filter::Lanczos3 => ResampleFilter::Lanczos3,
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise the preset (if
/// any) is applied first and explicit numeric flags override it.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut config = cli.preset.map_or_else(PipelineConfig::default, |p| {
        PipelineConfig::from_preset(preset_to_pipeline(p))
    });

    if let Some(ref points) = cli.thresholds {
        config.thresholds = Thresholds::new(points.clone())
            .map_err(|e| format!("Invalid --thresholds: {e}"))?;
    }
    if let Some(radius) = cli.blur_radius {
        config.blur_radius = radius;
    }
    if let Some(scale) = cli.resize_scale {
        config.resize_scale = scale;
    }
    if let Some(radius) = cli.smoothing_radius {
        config.smoothing_radius = radius;
    }
    if let Some(median) = cli.median {
        config.median_mode = median_to_pipeline(median);
    }
    if let Some(filter) = cli.filter {
        config.resample_filter = filter_to_pipeline(filter);
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("layercut=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image = match image::open(&cli.image_path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({}x{})",
        cli.image_path.display(),
        image.width(),
        image.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!();

    let (result, diagnostics) =
        match layercut_pipeline::process_with_diagnostics(&image, &config, &SystemClock) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    if cli.no_write {
        return ExitCode::SUCCESS;
    }

    let naming = cli.stem.as_deref().map_or_else(
        || {
            cli.image_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map_or_else(ExportNaming::default, ExportNaming::new)
        },
        ExportNaming::new,
    );

    let posterized = if cli.posterize {
        match layercut_pipeline::posterize_image(&image, &config) {
            Ok(img) => Some(img),
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    match write_outputs(&result, posterized.as_ref(), &naming, &cli.out_dir) {
        Ok(count) => {
            eprintln!("Wrote {count} files to {}", cli.out_dir.display());
            ExitCode::SUCCESS
        }
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

/// Encode every mask, the composite, and the optional posterized
/// preview, then write them to `out_dir`.
///
/// Returns the number of files written.
fn write_outputs(
    result: &StencilResult,
    posterized: Option<&RgbaImage>,
    naming: &ExportNaming,
    out_dir: &Path,
) -> Result<usize, String> {
    let mut files = layercut_export::export_all_masks(Some(result), naming)
        .map_err(|e| format!("Export error: {e}"))?;
    files.push(
        layercut_export::export_composite(Some(result), naming)
            .map_err(|e| format!("Export error: {e}"))?,
    );
    if let Some(img) = posterized {
        files.push(
            layercut_export::export_posterized(img, naming)
                .map_err(|e| format!("Export error: {e}"))?,
        );
    }

    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Error creating {}: {e}", out_dir.display()))?;

    for ExportedImage { filename, bytes } in &files {
        let path = out_dir.join(filename);
        std::fs::write(&path, bytes)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote file");
    }

    Ok(files.len())
}
