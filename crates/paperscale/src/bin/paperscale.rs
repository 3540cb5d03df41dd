//! paperscale CLI: measure objects in a photo against a reference sheet.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use paperscale::{
    detect_reference_plane, measure_distance, measure_photo, measure_polygon_area, CalibrationRecord,
    MeasureConfig,
};
use serde_json::json;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "paperscale")]
#[command(about = "Measure objects in a photo using a sheet of paper as the scale reference")]
#[command(version)]
struct Cli {
    /// JSON file overriding sheet and object parameters.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find and rectify the reference sheet; print scale and transform.
    Detect(ImageArgs),

    /// Detect the sheet, then measure every object on it.
    Measure {
        #[command(flatten)]
        image: ImageArgs,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Distance between two canvas points, in mm.
    Distance {
        /// Millimetres per canvas pixel.
        #[arg(long)]
        scale: f64,

        /// Two points as `x,y`.
        #[arg(value_parser = parse_point, num_args = 1.., allow_hyphen_values = true)]
        points: Vec<[f64; 2]>,
    },

    /// Area of a polygon through canvas points, in mm^2.
    Area {
        /// Millimetres per canvas pixel.
        #[arg(long)]
        scale: f64,

        /// Three or more points as `x,y`.
        #[arg(value_parser = parse_point, num_args = 1.., allow_hyphen_values = true)]
        points: Vec<[f64; 2]>,
    },
}

#[derive(Debug, Clone, Args)]
struct ImageArgs {
    /// Input photo (any format the `image` crate decodes).
    image: PathBuf,

    /// Write the rectified canvas to this path.
    #[arg(long)]
    canvas_out: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<[f64; 2], String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate {v:?}: {e}"))
    };
    Ok([parse(x)?, parse(y)?])
}

fn init_logging(verbose: u8) {
    #[cfg(feature = "tracing")]
    {
        let _ = verbose;
        let _ = tracing_log::LogTracer::init();
        paperscale::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        };
        let _ = paperscale::core::init_with_level(level);
    }
}

fn load_config(path: Option<&Path>) -> CliResult<MeasureConfig> {
    match path {
        Some(p) => Ok(MeasureConfig::load(p)?),
        None => Ok(MeasureConfig::default()),
    }
}

fn open_rgb(path: &Path) -> CliResult<image::RgbImage> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("failed to open image {}: {e}", path.display()).into()
    })?;
    log::info!("loaded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img.to_rgb8())
}

fn save_canvas(record: &CalibrationRecord, out: Option<&Path>) -> CliResult<()> {
    if let Some(path) = out {
        record.canvas.save(path)?;
        log::info!("canvas written to {}", path.display());
    }
    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> CliResult<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Detect(args) => {
            let config = load_config(cli.config.as_deref())?;
            let photo = open_rgb(&args.image)?;
            let record = detect_reference_plane(&photo, &config.sheet)?;
            save_canvas(&record, args.canvas_out.as_deref())?;
            let (w, h) = record.canvas_size();
            print_json(
                &json!({
                    "scale_mm_per_px": record.scale_mm_per_px,
                    "canvas_width": w,
                    "canvas_height": h,
                    "transform": record.transform.to_array(),
                }),
                true,
            )
        }
        Commands::Measure { image, pretty } => {
            let config = load_config(cli.config.as_deref())?;
            let photo = open_rgb(&image.image)?;
            let (record, report) = measure_photo(&photo, &config)?;
            save_canvas(&record, image.canvas_out.as_deref())?;
            print_json(
                &json!({
                    "scale_mm_per_px": record.scale_mm_per_px,
                    "count": report.count,
                    "objects": report.objects,
                }),
                pretty,
            )
        }
        Commands::Distance { scale, points } => {
            let mm = measure_distance(&points, scale)?;
            print_json(&json!({ "distance_mm": mm }), false)
        }
        Commands::Area { scale, points } => {
            let mm2 = measure_polygon_area(&points, scale)?;
            print_json(&json!({ "area_mm2": mm2 }), false)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
