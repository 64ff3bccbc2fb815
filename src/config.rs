use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color::ColorScheme;
use crate::density::{DensityStrategy, RemapParams};
use crate::geometry::Vec2;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub remap: RemapConfig,
    pub heatmap: HeatmapConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemapConfig {
    pub width: usize,
    pub height: usize,
    pub focal_x: f64,
    pub focal_y: f64,
    pub radius: f64,
    pub density_factor: f64,
    pub mid_linear_slope: f64,
    pub strategy: DensityStrategy,
    /// Build the grid in [0, 1] coordinates instead of pixel coordinates
    pub normalized: bool,
}

impl Default for RemapConfig {
    fn default() -> Self {
        let params = RemapParams::default();
        Self {
            width: 40,
            height: 30,
            focal_x: 0.7,
            focal_y: 0.8,
            radius: params.radius,
            density_factor: params.density_factor,
            mid_linear_slope: params.mid_linear_slope,
            strategy: DensityStrategy::Piecewise,
            normalized: false,
        }
    }
}

impl RemapConfig {
    pub fn focal(&self) -> Vec2 {
        Vec2::new(self.focal_x, self.focal_y)
    }

    pub fn set_focal(&mut self, focal: Vec2) {
        self.focal_x = focal.x;
        self.focal_y = focal.y;
    }

    pub fn params(&self) -> RemapParams {
        RemapParams {
            mid_linear_slope: self.mid_linear_slope,
            ..RemapParams::new(self.radius, self.density_factor)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeatmapConfig {
    pub color_scheme: ColorScheme,
    /// Disc radius per measurement, in image pixels
    pub point_radius: f64,
    pub opacity: f32,
    /// Width of the color bar appended on the right, 0 to disable
    pub colorbar_width: usize,
    /// Also plot samples the renderer repeated at the same position
    pub include_repeated: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Heat,
            point_radius: 6.0,
            opacity: 0.8,
            colorbar_width: 24,
            include_repeated: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreviewConfig {
    pub color_scheme: ColorScheme,
    /// Point radius for PNG scatter output
    pub point_radius: f64,
    pub png_width: usize,
    pub png_height: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Heat,
            point_radius: 1.5,
            png_width: 800,
            png_height: 600,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/densemap/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("densemap").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists.
    /// Returns None if the file doesn't exist, warns on parse errors.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("{:#}. Using defaults.", e);
                    None
                }
            }
        } else {
            None
        }
    }

    /// Write the config template to `path`, or to the XDG path when `None`.
    pub fn init_default_config(path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, Self::generate_config_template())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r#"# densemap configuration

[remap]
# Sample grid size
width = 40
height = 30
# Focal point in normalized [0, 1] coordinates
focal_x = 0.7
focal_y = 0.8
# Half width of the high-density band around the focal point (0 < radius < 0.5)
radius = 0.07
# Share of the output range given to the band: 2 * radius * density_factor (< 1)
density_factor = 3.0
# Middle band slope for the mid-linear strategy
mid_linear_slope = 0.5
# Strategy: "piecewise", "mid-linear", "sinus"
strategy = "piecewise"
# Build the grid in [0, 1] coordinates instead of pixel coordinates
normalized = false

[heatmap]
# Color scheme: "heat", "spectrum", "fire", "ocean", "purple", "monochrome"
color_scheme = "heat"
# Disc radius per measurement in image pixels
point_radius = 6.0
# Opacity of the discs over the reference image (0.0-1.0)
opacity = 0.8
# Width of the color bar on the right, 0 disables it
colorbar_width = 24
# Also plot measurements the renderer repeated at the same position
include_repeated = true

[preview]
color_scheme = "heat"
# Point radius for PNG scatter output
point_radius = 1.5
# Size of the plot area in PNG output
png_width = 800
png_height = 600
"#
        .to_string()
    }

    /// Merge remap arguments into config (CLI takes priority)
    pub fn merge_remap_args(&mut self, args: &crate::RemapArgs) {
        if let Some(width) = args.width {
            self.remap.width = width;
        }
        if let Some(height) = args.height {
            self.remap.height = height;
        }
        if let Some(x) = args.focal_x {
            self.remap.focal_x = x;
        }
        if let Some(y) = args.focal_y {
            self.remap.focal_y = y;
        }
        if let Some(radius) = args.radius {
            self.remap.radius = radius;
        }
        if let Some(factor) = args.density_factor {
            self.remap.density_factor = factor;
        }
        if let Some(slope) = args.mid_linear_slope {
            self.remap.mid_linear_slope = slope;
        }
        if let Some(strategy) = args.strategy {
            self.remap.strategy = strategy;
        }
        if args.normalized {
            self.remap.normalized = true;
        }
        if let Some(colors) = args.colors {
            self.preview.color_scheme = colors;
        }
    }

    /// Merge heatmap arguments into config (CLI takes priority)
    pub fn merge_heatmap_args(&mut self, args: &crate::HeatmapArgs) {
        if let Some(colors) = args.colors {
            self.heatmap.color_scheme = colors;
        }
        if let Some(radius) = args.point_radius {
            self.heatmap.point_radius = radius;
        }
        if let Some(opacity) = args.opacity {
            self.heatmap.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(width) = args.colorbar_width {
            self.heatmap.colorbar_width = width;
        }
        if args.single_only {
            self.heatmap.include_repeated = false;
        }
    }
}
