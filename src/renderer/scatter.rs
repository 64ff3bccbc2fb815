//! Scatter plot of a remapped sample grid.

use super::Canvas;
use crate::color::ColorScheme;
use crate::geometry::Vec2;
use crate::grid::{GridSpace, SampleGrid};

const BACKGROUND: (u8, u8, u8) = (18, 18, 24);
const FOCAL_MARKER: (u8, u8, u8) = (255, 255, 255);

/// Grid cells in normalized `[0, 1]` space, x-major.
pub fn normalized_points(grid: &SampleGrid) -> Vec<Vec2> {
    let scale = match grid.space() {
        GridSpace::Pixel => Vec2::new(grid.width().max(1) as f64, grid.height().max(1) as f64),
        GridSpace::Normalized => Vec2::splat(1.0),
    };
    grid.cells()
        .iter()
        .map(|c| Vec2::new(c.x / scale.x, c.y / scale.y))
        .collect()
}

/// 1.0 at the focal point, falling to 0.0 at the far corner of the unit square.
pub fn proximity(point: Vec2, focal: Vec2) -> f32 {
    let d = point.distance(focal) / std::f64::consts::SQRT_2;
    (1.0 - d).clamp(0.0, 1.0) as f32
}

pub struct ScatterOptions {
    /// Output size of the unit square in pixels.
    pub size: (usize, usize),
    pub point_radius: f64,
    pub margin: usize,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            size: (800, 600),
            point_radius: 1.5,
            margin: 16,
        }
    }
}

/// Draw the grid as points on a dark background, y axis pointing up.
pub fn render_grid(
    grid: &SampleGrid,
    focal: Vec2,
    scheme: &ColorScheme,
    options: &ScatterOptions,
) -> Canvas {
    let (w, h) = options.size;
    let m = options.margin;
    let mut canvas = Canvas::filled(w + 2 * m, h + 2 * m, BACKGROUND);

    let to_pixel = |p: Vec2| -> (f64, f64) {
        (
            m as f64 + p.x * w as f64,
            m as f64 + (1.0 - p.y) * h as f64,
        )
    };

    for p in normalized_points(grid) {
        let (px, py) = to_pixel(p);
        let rgb = scheme.ramp(proximity(p, focal));
        canvas.fill_disc(px, py, options.point_radius, rgb, 1.0);
    }

    let (fx, fy) = to_pixel(focal);
    canvas.fill_disc(fx, fy, options.point_radius * 2.5, FOCAL_MARKER, 0.35);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::tests::pixel;

    #[test]
    fn pixel_grid_is_normalized() {
        let grid = SampleGrid::pixel(4, 2);
        let points = normalized_points(&grid);
        assert_eq!(points.len(), 8);
        assert_eq!(points[7], Vec2::new(0.75, 0.5));
    }

    #[test]
    fn proximity_peaks_at_focal_point() {
        let focal = Vec2::new(0.7, 0.8);
        assert_eq!(proximity(focal, focal), 1.0);
        assert!(proximity(Vec2::new(0.0, 0.0), focal) < proximity(Vec2::new(0.6, 0.7), focal));
    }

    #[test]
    fn renders_points_inside_margin() {
        let grid = SampleGrid::normalized(2, 2);
        let options = ScatterOptions {
            size: (100, 100),
            point_radius: 1.0,
            margin: 10,
        };
        let canvas = render_grid(&grid, Vec2::new(0.9, 0.9), &ColorScheme::Heat, &options);
        assert_eq!((canvas.width, canvas.height), (120, 120));
        // origin sample sits at the bottom left corner of the plot area
        assert_ne!(pixel(&canvas, 10, 110), (18, 18, 24, 255));
        assert_eq!(pixel(&canvas, 60, 30), (18, 18, 24, 255));
    }
}
