pub mod braille;
pub mod terminal;

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{Config, RemapConfig};
use crate::density::{Band, Bands, DensityStrategy};
use crate::geometry::Vec2;
use crate::grid::SampleGrid;
use crate::renderer::scatter::{self, ScatterOptions};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Interactive braille scatter in the terminal
    #[default]
    Terminal,
    /// Scatter plot written to a PNG file
    Png,
    /// x and y sequences printed to stdout
    Text,
    /// One-dimensional remap of the x axis, with the band layout
    Curve,
}

/// Fresh, not yet remapped grid in the configured coordinate space.
pub fn uniform_grid(remap: &RemapConfig) -> SampleGrid {
    if remap.normalized {
        SampleGrid::normalized(remap.width, remap.height)
    } else {
        SampleGrid::pixel(remap.width, remap.height)
    }
}

/// Build the configured grid and remap it towards the focal point.
pub fn build_grid(config: &Config) -> Result<SampleGrid> {
    let remap = &config.remap;
    let mut grid = uniform_grid(remap);
    ensure!(
        !grid.is_empty(),
        "Grid needs at least one sample, got {}x{}",
        remap.width,
        remap.height
    );
    grid.remap(remap.focal(), remap.strategy, &remap.params())
        .with_context(|| {
            format!(
                "Cannot remap towards {} with radius {} and density factor {}",
                remap.focal(),
                remap.radius,
                remap.density_factor
            )
        })?;
    if let Some((lo, hi)) = grid.bounds() {
        debug!("Remapped grid spans {} to {}", lo, hi);
    }
    Ok(grid)
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print `x_array` and `y_array` as two whitespace separated lines.
pub fn write_text(grid: &SampleGrid, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", join(&grid.x_array()))?;
    writeln!(out, "{}", join(&grid.y_array()))?;
    Ok(())
}

/// Print `width` evenly spaced inputs in [0, 1] and their remapped values
/// towards `focal_x`. The piecewise strategy also prints its band layout as
/// `#` comment lines.
pub fn write_curve(remap: &RemapConfig, out: &mut impl Write) -> Result<()> {
    let focal = remap.focal_x;
    let params = remap.params();

    if remap.strategy == DensityStrategy::Piecewise {
        let bands = Bands::new(focal, params.radius, params.density_factor)
            .with_context(|| format!("Cannot build bands around {}", focal))?;
        let (left, mid, right) = bands.widths();
        let (lo, hi) = bands.middle_range();
        writeln!(
            out,
            "# widths {:.6} {:.6} {:.6} lrp {:.6} pp {:.6} rrp {:.6} middle [{:.6}, {:.6}]",
            left,
            mid,
            right,
            bands.lrp(),
            bands.pp(),
            bands.rrp(),
            lo,
            hi
        )?;
        writeln!(
            out,
            "# slopes {:.6} {:.6} {:.6}",
            bands.slope(Band::Left),
            bands.slope(Band::Middle),
            bands.slope(Band::Right)
        )?;
    }

    let n = remap.width.max(2);
    let inputs: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
    let outputs = inputs
        .iter()
        .map(|&x| remap.strategy.remap(x, focal, &params))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Cannot remap towards {} with {}", focal, remap.strategy))?;

    writeln!(out, "{}", join(&inputs))?;
    writeln!(out, "{}", join(&outputs))?;
    Ok(())
}

pub fn write_png(grid: &SampleGrid, focal: Vec2, config: &Config, path: &Path) -> Result<()> {
    let options = ScatterOptions {
        size: (config.preview.png_width, config.preview.png_height),
        point_radius: config.preview.point_radius,
        ..ScatterOptions::default()
    };
    let canvas = scatter::render_grid(grid, focal, &config.preview.color_scheme, &options);
    canvas
        .save_png(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} ({} samples)", path.display(), grid.len());
    Ok(())
}
