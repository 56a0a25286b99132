//! urclimask CLI - urban core and rural vicinity masks for climate-model grids

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use urclimask_algorithms::components::Connectivity;
use urclimask_algorithms::vector::{polygon_coverage, CityOutline, FRACTION_VARIABLE};
use urclimask_algorithms::vicinity::{MaskSet, StaticLayers, UrbanVicinity, VicinityParams};
use urclimask_core::io::{read_geotiff, write_geotiff, write_metadata, GeoTiffOptions};
use urclimask_core::{GridCoords, Mask, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "urclimask")]
#[command(author, version, about = "Urban and rural vicinity masks for gridded climate data", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delineate the urban core and its rural vicinity
    Vicinity {
        #[command(flatten)]
        layers: LayerArgs,
        /// Output GeoTIFF (a JSON sidecar is written next to it)
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Write the intermediate urban, surrounding, elevation and land masks
    Masks {
        #[command(flatten)]
        layers: LayerArgs,
        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Urban fraction (%) of each cell of a grid, from GeoJSON city polygons
    Fraction {
        /// GeoJSON Polygon, MultiPolygon, Feature or FeatureCollection
        #[arg(long)]
        city: PathBuf,
        /// Raster defining the target grid
        #[arg(long)]
        grid: PathBuf,
        /// Output GeoTIFF (a JSON sidecar is written next to it)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

#[derive(Args)]
struct LayerArgs {
    /// Urban fraction raster
    #[arg(long)]
    urban: PathBuf,
    /// Surface elevation raster (m)
    #[arg(long)]
    elevation: PathBuf,
    /// Land fraction raster (%)
    #[arg(long)]
    land: PathBuf,
    /// Crop the layers around the city center before processing
    #[arg(long)]
    crop: bool,
    /// Grid resolution in km, needed to crop curvilinear grids
    #[arg(long)]
    resolution_km: Option<f64>,
}

/// Parameter overrides; anything unset keeps the value from `--config` or the default
#[derive(Args)]
struct ParamArgs {
    /// JSON file with engine parameters
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Urban fraction threshold
    #[arg(long)]
    urban_th: Option<f64>,
    /// Surrounding urban fraction threshold
    #[arg(long)]
    urban_sur_th: Option<f64>,
    /// Elevation tolerance around the urban envelope (m)
    #[arg(long)]
    orog_diff: Option<f64>,
    /// Land fraction threshold (%)
    #[arg(long)]
    sftlf_th: Option<f64>,
    /// Vicinity to urban cell ratio
    #[arg(long, visible_alias = "scale")]
    ratio: Option<f64>,
    /// Minimum urban region size in cells
    #[arg(long)]
    min_city_size: Option<usize>,
    /// City center latitude
    #[arg(long, allow_hyphen_values = true)]
    lat_city: Option<f64>,
    /// City center longitude
    #[arg(long, allow_hyphen_values = true)]
    lon_city: Option<f64>,
    /// Half-height of the crop window (degrees)
    #[arg(long)]
    lat_lim: Option<f64>,
    /// Half-width of the crop window (degrees)
    #[arg(long)]
    lon_lim: Option<f64>,
    /// Climate model name, recorded in the output attributes
    #[arg(long)]
    model: Option<String>,
    /// Model domain, recorded in the output attributes
    #[arg(long)]
    domain: Option<String>,
    /// Urban fraction variable name, recorded in the output attributes
    #[arg(long)]
    urban_var: Option<String>,
    /// Connectivity joining urban cells into regions
    #[arg(long, value_enum)]
    connectivity: Option<ConnectivityArg>,
    /// Upper bound on growth iterations
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    Four,
    Eight,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Four => Connectivity::Four,
            ConnectivityArg::Eight => Connectivity::Eight,
        }
    }
}

impl ParamArgs {
    /// Defaults, then the config file, then flags
    fn resolve(&self) -> Result<VicinityParams> {
        let mut p = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => VicinityParams::default(),
        };

        if let Some(v) = self.urban_th {
            p.urban_th = v;
        }
        if let Some(v) = self.urban_sur_th {
            p.urban_sur_th = v;
        }
        if let Some(v) = self.orog_diff {
            p.orog_diff = v;
        }
        if let Some(v) = self.sftlf_th {
            p.sftlf_th = v;
        }
        if let Some(v) = self.ratio {
            p.ratio_r2u = v;
        }
        if let Some(v) = self.min_city_size {
            p.min_city_size = v;
        }
        if self.lat_city.is_some() {
            p.lat_city = self.lat_city;
        }
        if self.lon_city.is_some() {
            p.lon_city = self.lon_city;
        }
        if let Some(v) = self.lat_lim {
            p.lat_lim = v;
        }
        if let Some(v) = self.lon_lim {
            p.lon_lim = v;
        }
        if self.model.is_some() {
            p.model = self.model.clone();
        }
        if self.domain.is_some() {
            p.domain = self.domain.clone();
        }
        if self.urban_var.is_some() {
            p.urban_var = self.urban_var.clone();
        }
        if let Some(v) = self.connectivity {
            p.connectivity = v.into();
        }
        if self.max_iterations.is_some() {
            p.max_iterations = self.max_iterations;
        }
        Ok(p)
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_layer(path: &Path, name: &str) -> Result<Raster<f64>> {
    let pb = spinner(&format!("Reading {}...", name));
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read {} layer {}", name, path.display()))?;
    pb.finish_and_clear();
    info!("{}: {} x {}", name, raster.cols(), raster.rows());
    Ok(raster)
}

fn load_layers(args: &LayerArgs, engine: &UrbanVicinity) -> Result<StaticLayers> {
    let layers = StaticLayers::new(
        read_layer(&args.urban, "urban fraction")?,
        read_layer(&args.elevation, "elevation")?,
        read_layer(&args.land, "land fraction")?,
    )
    .context("Input layers are not co-registered")?
    .with_transform_coords()?;

    if !args.crop {
        return Ok(layers);
    }
    let cropped = engine
        .crop_layers(&layers, args.resolution_km)
        .context("Failed to crop layers around the city")?;
    Ok(cropped)
}

fn write_mask(mask: &Mask, path: &Path) -> Result<()> {
    write_geotiff(&mask.to_raster(), path, Some(GeoTiffOptions::default()))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn write_mask_set(masks: &MaskSet, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let pb = spinner("Writing masks...");
    let urban = dir.join("urban.tif");
    write_mask(&masks.urban, &urban)?;
    write_mask(&masks.surrounding, &dir.join("surrounding.tif"))?;
    write_mask(&masks.elevation, &dir.join("elevation.tif"))?;
    write_mask(&masks.land, &dir.join("land.tif"))?;

    let summary = serde_json::json!({
        "envelope": masks.envelope,
        "urban_cells": masks.urban.count(),
        "surrounding_cells": masks.surrounding.count(),
        "demoted_cells": masks.demoted_cells,
        "used_fallback": masks.used_fallback,
    });
    write_metadata(&urban, &summary).context("Failed to write mask summary")?;
    pb.finish_and_clear();
    Ok(())
}

fn read_city(path: &Path) -> Result<CityOutline> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Invalid GeoJSON {}", path.display()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_layer(&input, "raster")?;
            let (rows, cols) = raster.shape();
            let transform = raster.transform();
            let bounds = transform.bounds(cols, rows);
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", transform.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        // ── Vicinity ─────────────────────────────────────────────────
        Commands::Vicinity {
            layers,
            output,
            params,
        } => {
            let engine = UrbanVicinity::new(params.resolve()?).context("Invalid parameters")?;
            let input = load_layers(&layers, &engine)?;

            let start = Instant::now();
            let (_, mask) = engine
                .delineate(&input)
                .context("Failed to delineate urban vicinity")?;
            let elapsed = start.elapsed();

            let pb = spinner("Writing output...");
            mask.write(&output).context("Failed to write output")?;
            pb.finish_and_clear();

            let report = mask.report();
            println!(
                "Urban cells: {}, vicinity cells: {} (ratio {:.2}, {:?} after {} iterations)",
                report.urban_cells,
                report.vicinity_cells,
                report.achieved_ratio,
                report.termination,
                report.iterations
            );
            println!(
                "Elevation envelope: [{:.1}, {:.1}] m",
                mask.envelope().lower(),
                mask.envelope().upper()
            );
            done("Vicinity mask", &output, elapsed);
        }

        // ── Fraction ─────────────────────────────────────────────────
        Commands::Fraction { city, grid, output } => {
            let polygons = read_city(&city)?
                .to_multi_polygon()
                .context("Invalid city outline")?;
            let template = read_layer(&grid, "grid")?;
            let (rows, cols) = template.shape();
            let coords = GridCoords::from_transform(template.transform(), rows, cols);

            let start = Instant::now();
            let fraction = polygon_coverage(&polygons, &coords)
                .context("Failed to compute urban fraction")?;
            let elapsed = start.elapsed();

            write_geotiff(&fraction, &output, Some(GeoTiffOptions::default()))
                .with_context(|| format!("Failed to write {}", output.display()))?;
            let attrs = serde_json::json!({
                "variable": FRACTION_VARIABLE,
                "long_name": "urban fraction of the cell covered by city polygons",
                "units": "%",
                "polygons": polygons.0.len(),
            });
            write_metadata(&output, &attrs).context("Failed to write sidecar")?;

            info!("{} polygons over {} x {} cells", polygons.0.len(), cols, rows);
            done("Urban fraction", &output, elapsed);
        }

        // ── Masks ────────────────────────────────────────────────────
        Commands::Masks {
            layers,
            out_dir,
            params,
        } => {
            let engine = UrbanVicinity::new(params.resolve()?).context("Invalid parameters")?;
            let input = load_layers(&layers, &engine)?;

            let start = Instant::now();
            let masks = engine
                .define_masks(&input)
                .context("Failed to define masks")?;
            let elapsed = start.elapsed();

            write_mask_set(&masks, &out_dir)?;
            done("Masks", &out_dir, elapsed);
        }
    }

    Ok(())
}
