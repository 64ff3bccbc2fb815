use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod color;
mod config;
mod density;
mod display;
mod geometry;
mod grid;
mod heatmap;
mod indexing;
mod measurement;
mod renderer;

use color::ColorScheme;
use config::Config;
use density::DensityStrategy;
use display::OutputMode;
use geometry::Vec2;

#[derive(Parser, Debug)]
#[command(name = "densemap")]
#[command(author, version, about = "Focal-point density remapping of sample grids")]
struct Args {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remap a uniform sample grid towards a focal point
    Remap(RemapArgs),
    /// Render kernel-time heatmaps from measurement logs
    Heatmap(HeatmapArgs),
    /// Print the packed-texture area assignment of every buffer cell
    Indices(IndicesArgs),
    /// Write a commented config template
    InitConfig {
        /// Target path (defaults to ~/.config/densemap/config.toml)
        path: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(ClapArgs, Debug, Default)]
pub struct RemapArgs {
    /// Grid width in samples
    #[arg(long)]
    pub width: Option<usize>,

    /// Grid height in samples
    #[arg(long)]
    pub height: Option<usize>,

    /// Focal point x in [0, 1]
    #[arg(short = 'x', long)]
    pub focal_x: Option<f64>,

    /// Focal point y in [0, 1]
    #[arg(short = 'y', long)]
    pub focal_y: Option<f64>,

    /// Half width of the high-density band
    #[arg(short, long)]
    pub radius: Option<f64>,

    /// Density multiplier inside the band
    #[arg(short, long)]
    pub density_factor: Option<f64>,

    /// Middle band slope for the mid-linear strategy
    #[arg(long)]
    pub mid_linear_slope: Option<f64>,

    #[arg(short, long, value_enum)]
    pub strategy: Option<DensityStrategy>,

    /// Build the grid in [0, 1] coordinates instead of pixels
    #[arg(long)]
    pub normalized: bool,

    #[arg(long, value_enum)]
    pub colors: Option<ColorScheme>,

    #[arg(short, long, value_enum, default_value = "terminal")]
    pub output: OutputMode,

    /// PNG path for `--output png`
    #[arg(long, default_value = "remap.png")]
    pub png: PathBuf,
}

#[derive(ClapArgs, Debug, Default)]
pub struct HeatmapArgs {
    /// Measurement log to render
    #[arg(required_unless_present = "dir", conflicts_with = "dir")]
    pub log: Option<PathBuf>,

    /// Render every ms_data*.txt below this directory
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Reference image under the points (single log only)
    #[arg(short, long, conflicts_with = "dir")]
    pub image: Option<PathBuf>,

    /// Output PNG (single log only)
    #[arg(short, long, default_value = "heatmap.png", conflicts_with = "dir")]
    pub out: PathBuf,

    /// Output directory for batch mode (defaults to each log's directory)
    #[arg(long, requires = "dir")]
    pub out_dir: Option<PathBuf>,

    /// Print the mouse x, mouse y and kernel time sequences instead of rendering
    #[arg(long)]
    pub print_axes: bool,

    #[arg(long, value_enum)]
    pub colors: Option<ColorScheme>,

    /// Disc radius per measurement in pixels
    #[arg(long)]
    pub point_radius: Option<f64>,

    /// Disc opacity (0.0-1.0)
    #[arg(long)]
    pub opacity: Option<f32>,

    /// Color bar width, 0 disables it
    #[arg(long)]
    pub colorbar_width: Option<usize>,

    /// Skip measurements the renderer repeated at the same position
    #[arg(long)]
    pub single_only: bool,
}

#[derive(ClapArgs, Debug)]
struct IndicesArgs {
    /// Texture width in texels
    #[arg(long, default_value = "16")]
    tex_width: i64,

    /// Texture height in texels
    #[arg(long, default_value = "9")]
    tex_height: i64,

    /// Steps of areas C, B and A
    #[arg(long, num_args = 3, value_names = ["C", "B", "A"], default_values = ["4", "2", "1"])]
    steps: Vec<i64>,

    /// Size of area A relative to the texture
    #[arg(long, num_args = 2, value_names = ["X", "Y"], default_values = ["0.3", "0.2"])]
    ell1: Vec<f64>,

    /// Size of area B relative to the texture
    #[arg(long, num_args = 2, value_names = ["X", "Y"], default_values = ["0.5", "0.4"])]
    ell2: Vec<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging on stderr so text output and the terminal UI stay clean
    let directive = if args.verbose { "densemap=debug" } else { "densemap=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    match args.command {
        Command::Remap(remap_args) => {
            let mut config = load_config(args.config.as_ref())?;
            config.merge_remap_args(&remap_args);
            run_remap(config, &remap_args).await?;
        }
        Command::Heatmap(heatmap_args) => {
            let mut config = load_config(args.config.as_ref())?;
            config.merge_heatmap_args(&heatmap_args);
            run_heatmap(&config, &heatmap_args).await?;
        }
        Command::Indices(indices_args) => run_indices(&indices_args)?,
        Command::InitConfig { path } => {
            let path = Config::init_default_config(path.as_deref())?;
            println!("Config written to {}", path.display());
        }
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "densemap", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::load_from_default_path().unwrap_or_default()),
    }
}

async fn run_remap(config: Config, args: &RemapArgs) -> Result<()> {
    info!(
        "Remapping {}x{} grid towards {} with {} strategy",
        config.remap.width,
        config.remap.height,
        config.remap.focal(),
        config.remap.strategy
    );

    match args.output {
        OutputMode::Terminal => display::terminal::run(config).await?,
        OutputMode::Png => {
            let grid = display::build_grid(&config)?;
            display::write_png(&grid, config.remap.focal(), &config, &args.png)?;
        }
        OutputMode::Text => {
            let grid = display::build_grid(&config)?;
            let mut out = std::io::stdout().lock();
            display::write_text(&grid, &mut out)?;
            out.flush()?;
        }
        OutputMode::Curve => {
            let mut out = std::io::stdout().lock();
            display::write_curve(&config.remap, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

async fn run_heatmap(config: &Config, args: &HeatmapArgs) -> Result<()> {
    if let Some(dir) = &args.dir {
        let sets = heatmap::batch::discover(dir)?;
        if sets.is_empty() {
            bail!("No ms_data*.txt logs found below {}", dir.display());
        }

        if args.print_axes {
            let mut out = std::io::stdout().lock();
            for set in &sets {
                writeln!(out, "{}", set.log.display())?;
                print_axes(&set.log, &mut out)?;
            }
            return Ok(());
        }

        info!("Rendering {} measurement sets from {}", sets.len(), dir.display());
        let report = heatmap::batch::run(sets, &config.heatmap, args.out_dir.as_deref()).await?;
        for path in &report.rendered {
            println!("{}", path.display());
        }
        if !report.failed.is_empty() {
            bail!("{} of the measurement sets failed", report.failed.len());
        }
        return Ok(());
    }

    let Some(log) = &args.log else {
        bail!("A measurement log or --dir is required");
    };

    if args.print_axes {
        return print_axes(log, &mut std::io::stdout().lock());
    }

    let heatmap = heatmap::render_file(log, args.image.as_deref(), &args.out, &config.heatmap)
        .with_context(|| format!("Failed to render heatmap for {}", log.display()))?;
    debug!("Skipped {} out-of-bounds measurements", heatmap.skipped);
    println!("{}", args.out.display());
    Ok(())
}

fn print_axes(log: &Path, out: &mut impl Write) -> Result<()> {
    let measurements =
        measurement::read(log).with_context(|| format!("Failed to read {}", log.display()))?;
    measurement::write_axes(&measurements, out)?;
    Ok(())
}

fn run_indices(args: &IndicesArgs) -> Result<()> {
    let layout = indexing::AreaLayout::new(
        args.tex_width,
        args.tex_height,
        (args.steps[0], args.steps[1], args.steps[2]),
        Vec2::new(args.ell1[0], args.ell1[1]),
        Vec2::new(args.ell2[0], args.ell2[1]),
    )?;

    let mut out = std::io::stdout().lock();
    writeln!(
        out,
        "texture {}x{}  C: {} ({:.2})  B: {} ({:.2})  A: {} ({:.2})  side: {}",
        layout.tex_width,
        layout.tex_height,
        layout.dim_c,
        layout.a_c,
        layout.dim_b,
        layout.a_b,
        layout.dim_a,
        layout.a_a,
        layout.side
    )?;
    for cell in layout.assign() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}{}",
            cell.coord,
            cell.index_1d,
            cell.area.name(),
            cell.mapped_index,
            cell.global_id,
            if layout.in_texture(cell.global_id) { "" } else { "\toutside" }
        )?;
    }
    Ok(())
}
