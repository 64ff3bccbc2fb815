//! Uniform sample grid and the per-axis remap pass.

use crate::density::{DensityStrategy, RemapError, RemapParams};
use crate::geometry::Vec2;

/// Coordinate space a grid was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSpace {
    /// Cell (x, y) holds `(x, y)`.
    Pixel,
    /// Cell (x, y) holds `(x / width, y / height)`.
    Normalized,
}

/// A `width` x `height` array of sample coordinates.
///
/// Cells are stored x-major, matching the order of [`SampleGrid::x_array`]
/// and [`SampleGrid::y_array`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    space: GridSpace,
    cells: Vec<Vec2>,
}

impl SampleGrid {
    pub fn pixel(width: usize, height: usize) -> Self {
        Self::uniform(width, height, GridSpace::Pixel)
    }

    pub fn normalized(width: usize, height: usize) -> Self {
        Self::uniform(width, height, GridSpace::Normalized)
    }

    fn uniform(width: usize, height: usize, space: GridSpace) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for x in 0..width {
            for y in 0..height {
                let cell = match space {
                    GridSpace::Pixel => Vec2::new(x as f64, y as f64),
                    GridSpace::Normalized => {
                        Vec2::new(x as f64 / width as f64, y as f64 / height as f64)
                    }
                };
                cells.push(cell);
            }
        }
        Self {
            width,
            height,
            space,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn space(&self) -> GridSpace {
        self.space
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Vec2] {
        &self.cells
    }

    /// Flattened x coordinates, x-major.
    pub fn x_array(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.x).collect()
    }

    /// Flattened y coordinates, x-major.
    pub fn y_array(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.y).collect()
    }

    /// Replace every cell with `f(cell, width, height)`.
    pub fn modify(&mut self, f: impl Fn(Vec2, usize, usize) -> Vec2) {
        let (w, h) = (self.width, self.height);
        for cell in &mut self.cells {
            *cell = f(*cell, w, h);
        }
    }

    /// Remap every cell towards `focal` (normalized coordinates), one axis at a time.
    /// Both axis maps are validated before any cell changes.
    ///
    /// Pixel grids are normalized by width and height before remapping and
    /// scaled back afterwards.
    pub fn remap(
        &mut self,
        focal: Vec2,
        strategy: DensityStrategy,
        params: &RemapParams,
    ) -> Result<(), RemapError> {
        let x_map = strategy.axis(focal.x, params)?;
        let y_map = strategy.axis(focal.y, params)?;
        let scale = match self.space {
            GridSpace::Pixel => Vec2::new(self.width as f64, self.height as f64),
            GridSpace::Normalized => Vec2::splat(1.0),
        };
        self.modify(|cell, _, _| {
            let n = Vec2::new(cell.x / scale.x, cell.y / scale.y);
            Vec2::new(x_map.eval(n.x), y_map.eval(n.y)).mul_elem(scale)
        });
        Ok(())
    }

    /// Bounds of the coordinates currently in the grid, as (min, max).
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let first = *self.cells.first()?;
        Some(self.cells.iter().fold((first, first), |(lo, hi), c| {
            (
                Vec2::new(lo.x.min(c.x), lo.y.min(c.y)),
                Vec2::new(hi.x.max(c.x), hi.y.max(c.y)),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(grid: &SampleGrid, x: usize, y: usize) -> Vec2 {
        grid.cells()[x * grid.height() + y]
    }

    #[test]
    fn uniform_grid_layout() {
        let grid = SampleGrid::pixel(4, 3);
        assert_eq!(grid.len(), 12);
        assert!(!grid.is_empty());
        assert_eq!(at(&grid, 2, 1), Vec2::new(2.0, 1.0));
        assert_eq!(grid.x_array()[..4], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(grid.y_array()[..4], [0.0, 1.0, 2.0, 0.0]);

        let norm = SampleGrid::normalized(4, 2);
        assert_eq!(norm.space(), GridSpace::Normalized);
        assert_eq!(at(&norm, 3, 1), Vec2::new(0.75, 0.5));

        let empty = SampleGrid::pixel(0, 3);
        assert!(empty.is_empty());
        assert_eq!(empty.bounds(), None);
    }

    #[test]
    fn remap_keeps_shape_and_ordering() {
        let mut grid = SampleGrid::pixel(40, 30);
        let before = grid.clone();
        grid.remap(Vec2::new(0.7, 0.8), DensityStrategy::Piecewise, &RemapParams::default())
            .unwrap();

        assert_eq!(grid.width(), 40);
        assert_eq!(grid.height(), 30);
        assert_eq!(grid.len(), 40 * 30);
        assert_eq!(grid.x_array().len(), 1200);
        assert_eq!(grid.y_array().len(), 1200);

        // each axis is remapped on its own, so rows and columns stay aligned
        // and the monotonic transform keeps every cell in its place
        for x in 0..40 {
            for y in 0..30 {
                let cell = at(&grid, x, y);
                if x + 1 < 40 {
                    assert!(at(&grid, x + 1, y).x > cell.x);
                    assert_eq!(at(&grid, x, (y + 1) % 30).x, cell.x);
                }
                if y + 1 < 30 {
                    assert!(at(&grid, x, y + 1).y > cell.y);
                    assert_eq!(at(&grid, (x + 1) % 40, y).y, cell.y);
                }
            }
        }
        assert_eq!(at(&grid, 0, 0), at(&before, 0, 0));
    }

    #[test]
    fn remap_clusters_samples_near_focal_point() {
        let mut grid = SampleGrid::normalized(100, 1);
        grid.remap(Vec2::new(0.5, 0.5), DensityStrategy::Piecewise, &RemapParams::new(0.1, 3.0))
            .unwrap();
        let xs = grid.x_array();
        let near = xs.iter().filter(|&&x| (x - 0.5).abs() <= 0.1).count();
        // uniform sampling would put about 20 samples into that band
        assert!(near >= 55, "only {} samples near the focal point", near);
    }

    #[test]
    fn failed_remap_leaves_grid_untouched() {
        let mut grid = SampleGrid::normalized(10, 10);
        let before = grid.clone();
        // x axis is fine, y axis is degenerate
        let err = grid.remap(
            Vec2::new(0.5, 0.97),
            DensityStrategy::Piecewise,
            &RemapParams::new(0.07, 3.0),
        );
        assert!(err.is_err());
        assert_eq!(grid, before);
    }

    #[test]
    fn modify_receives_grid_dimensions() {
        let mut grid = SampleGrid::pixel(5, 2);
        grid.modify(|c, w, h| Vec2::new(c.x / w as f64, c.y / h as f64));
        assert_eq!(at(&grid, 4, 1), Vec2::new(0.8, 0.5));
        assert_eq!(grid.bounds(), Some((Vec2::new(0.0, 0.0), Vec2::new(0.8, 0.5))));
    }
}
