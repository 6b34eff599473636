//! Pfinder CLI: threshold previews and bead displacement correction.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::log_setup::{setup_logging, LogOptions};
use pfinder::{
    analyze, build_mask, correct_beads, load_grayscale, read_beads, save_image, write_records,
    CenterReference, Config, FitOrientation, RadiusJoin,
};

#[derive(Parser, Debug)]
#[command(
    name = "pfinder",
    version,
    about = "Spheroid boundary segmentation and normal-projected bead displacement"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Directory for rotated log files (console only when omitted)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the spheroid mask for one or more threshold scales and save previews
    Mask {
        /// Registered grayscale image of the spheroid
        image: PathBuf,

        /// Threshold scale to try; repeat to compare several
        #[arg(long = "threshold-scale", num_args = 1.., default_values_t = [0.9])]
        threshold_scales: Vec<f32>,

        /// Output directory for previews and masks
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// YAML or JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Correct bead displacements and write the normalized table
    Correct {
        /// Registered grayscale image of the spheroid
        image: PathBuf,

        /// CSV with x1,y1,x2,y2 and an optional contour_index column
        beads: PathBuf,

        /// Output CSV with c_dist,c_disp,r
        #[arg(short, long)]
        output: PathBuf,

        /// Prepend the input row index of each bead to the output
        #[arg(long)]
        with_index: bool,

        /// Save an annotated overlay image
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Save the filled spheroid mask
        #[arg(long)]
        mask_output: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Write the default configuration to a YAML or JSON file
    Config {
        /// Destination, format chosen from the extension
        output: PathBuf,
    },
}

/// Command-line values that take precedence over the configuration file.
#[derive(Args, Debug)]
struct Overrides {
    /// YAML or JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    threshold_scale: Option<f32>,

    /// Half width of the angular fit window in degrees
    #[arg(long)]
    half_range: Option<f64>,

    /// Degree of the local boundary polynomial
    #[arg(long)]
    fit_degree: Option<usize>,

    /// y-of-x, x-of-y or auto
    #[arg(long)]
    orientation: Option<FitOrientation>,

    /// Center for bead angles: contour-mean or centroid
    #[arg(long)]
    center: Option<CenterReference>,

    /// Radius join for beads without contour_index: nearest-angle or positional
    #[arg(long)]
    radius_join: Option<RadiusJoin>,
}

impl Overrides {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(scale) = self.threshold_scale {
            config.mask.threshold_scale = scale;
        }
        if let Some(half_range) = self.half_range {
            config.correction.fit.half_range_deg = half_range;
        }
        if let Some(degree) = self.fit_degree {
            config.correction.fit.degree = degree;
        }
        if let Some(orientation) = self.orientation {
            config.correction.fit.orientation = orientation;
        }
        if let Some(center) = self.center {
            config.correction.center = center;
        }
        if let Some(radius_join) = self.radius_join {
            config.correction.radius_join = radius_join;
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(LogOptions {
        base_level: &cli.log_level,
        file_prefix: "pfinder",
        log_dir: cli.log_dir.as_deref(),
    })?;

    match &cli.command {
        Command::Mask {
            image,
            threshold_scales,
            output_dir,
            config,
        } => run_mask(image, threshold_scales, output_dir, config.as_deref()),
        Command::Correct {
            image,
            beads,
            output,
            with_index,
            overlay,
            mask_output,
            overrides,
        } => {
            let config = overrides.apply(load_config(overrides.config.as_deref())?);
            run_correct(
                image,
                beads,
                output,
                *with_index,
                overlay.as_deref(),
                mask_output.as_deref(),
                &config,
            )
        }
        Command::Config { output } => {
            common::config_file::save(&Config::default(), output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Default configuration written to {}", output.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config: Config = common::config_file::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

fn run_mask(
    image_path: &Path,
    threshold_scales: &[f32],
    output_dir: &Path,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let image = load_grayscale(image_path)
        .with_context(|| format!("Failed to load spheroid image {}", image_path.display()))?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    println!("{:>8} {:>10} {:>9}", "scale", "area px", "contours");
    for &scale in threshold_scales {
        let mut mask_config = config.mask;
        mask_config.threshold_scale = scale;

        let mask = match build_mask(&image, &mask_config) {
            Ok(mask) => mask,
            Err(err) if !matches!(err, pfinder::Error::InvalidConfig(_)) => {
                tracing::warn!("Threshold scale {}: {}", scale, err);
                println!("{:>8} {:>10} {:>9}", scale, "-", 0);
                continue;
            }
            Err(err) => return Err(err).context("Invalid mask configuration"),
        };

        let preview_path = output_dir.join(format!("preview_{:.3}.png", scale));
        save_image(pfinder::overlay::render_mask_preview(&image, &mask), &preview_path)?;
        let mask_path = output_dir.join(format!("mask_{:.3}.png", scale));
        save_image(mask.mask().clone(), &mask_path)?;

        println!(
            "{:>8} {:>10} {:>9}",
            scale,
            mask.area(),
            mask.contours().len()
        );
    }

    Ok(())
}

fn run_correct(
    image_path: &Path,
    beads_path: &Path,
    output: &Path,
    with_index: bool,
    overlay: Option<&Path>,
    mask_output: Option<&Path>,
    config: &Config,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let image = load_grayscale(image_path)
        .with_context(|| format!("Failed to load spheroid image {}", image_path.display()))?;
    let beads = read_beads(beads_path)
        .with_context(|| format!("Failed to read bead table {}", beads_path.display()))?;

    let analysis = analyze(&image, &config.mask)
        .with_context(|| format!("Failed to segment spheroid in {}", image_path.display()))?;

    let report = correct_beads(
        &beads,
        &analysis.contour,
        analysis.centroid,
        &config.correction,
    )
    .context("Bead correction failed")?;

    write_records(output, &report, with_index)?;

    if let Some(path) = mask_output {
        save_image(analysis.mask.mask().clone(), path)?;
    }
    if let Some(path) = overlay {
        let rendered =
            pfinder::overlay::render_overlay(&image, &analysis.contour, analysis.centroid, &report);
        save_image(rendered, path)?;
    }

    println!("{}", report.summary());
    for skipped in &report.skipped {
        println!("  bead {}: {}", skipped.index, skipped.reason);
    }
    println!("Records written to {}", output.display());

    Ok(())
}
