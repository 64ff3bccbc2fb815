//! Index arithmetic for packing several resolution areas into one texture.
//!
//! Area C covers the whole texture at the coarsest step `g.x`, area B a
//! mid-sized window at step `g.y` and area A a small window at full step
//! `g.z`. The areas are laid out one after another in a square buffer and
//! every buffer cell is traced back to the texel it renders.

use anyhow::{ensure, Result};
use std::fmt;

use crate::geometry::Vec2;

/// Integer 2D index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Round both components down to a multiple of `step`.
    pub fn snap(self, step: i64) -> Coord {
        Coord::new(self.x - self.x.rem_euclid(step), self.y - self.y.rem_euclid(step))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Row-major 1D index of `coord` in a buffer `m` wide.
pub fn index_from_2d(coord: Coord, m: i64) -> i64 {
    coord.y * m + coord.x
}

pub fn coord_from_1d(index: i64, m: i64) -> Coord {
    Coord::new(index.rem_euclid(m), index.div_euclid(m))
}

/// Where the `index`-th sample of a pass with step `g` lands in an `m` wide
/// texture: samples advance `g` texels per step and `g` rows per wrap.
pub fn mapped_2d_index_from_1d(index: i64, m: i64, g: i64) -> Coord {
    let stepped = index * g;
    Coord::new(stepped.rem_euclid(m), stepped.div_euclid(m) * g)
}

pub fn mapped_index(index: i64, m: i64, g: i64) -> i64 {
    index_from_2d(mapped_2d_index_from_1d(index, m, g), m)
}

pub fn old_2d_to_new_2d_coord(old: Coord, m: i64, g: i64, old_m: i64) -> Coord {
    mapped_2d_index_from_1d(index_from_2d(old, old_m), m, g)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    A,
    B,
    C,
}

impl Area {
    pub fn name(&self) -> &'static str {
        match self {
            Area::A => "A",
            Area::B => "B",
            Area::C => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub coord: Coord,
    pub index_1d: i64,
    pub area: Area,
    /// Row-major texel index the sample lands on before snapping.
    pub mapped_index: i64,
    pub global_id: Coord,
}

/// Layout of the three areas in a packed square buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaLayout {
    pub tex_width: i64,
    pub tex_height: i64,
    /// Steps for areas C, B and A.
    pub steps: (i64, i64, i64),
    pub dim_a: Vec2,
    pub dim_b: Vec2,
    pub dim_c: Vec2,
    /// Cumulative sample counts at the end of C, B and A.
    pub a_c: f64,
    pub a_b: f64,
    pub a_a: f64,
    /// Side length of the packed square buffer.
    pub side: i64,
}

impl AreaLayout {
    /// `ell1` and `ell2` are the sizes of the A and B windows relative to the texture.
    pub fn new(
        tex_width: i64,
        tex_height: i64,
        steps: (i64, i64, i64),
        ell1: Vec2,
        ell2: Vec2,
    ) -> Result<Self> {
        ensure!(
            tex_width > 0 && tex_height > 0,
            "Texture size must be positive, got {}x{}",
            tex_width,
            tex_height
        );
        ensure!(
            steps.0 > 0 && steps.1 > 0 && steps.2 > 0,
            "Area steps must be positive, got {:?}",
            steps
        );

        let tex = Vec2::new(tex_width as f64, tex_height as f64);
        let dim_c = tex * (1.0 / steps.0 as f64);
        let dim_b = ell2.mul_elem(tex) * (1.0 / steps.1 as f64);
        let dim_a = ell1.mul_elem(tex) * (1.0 / steps.2 as f64);

        let a_c = dim_c.area();
        let a_b = dim_b.area() + a_c;
        let a_a = dim_a.area() + a_b;
        let side = a_a.sqrt().ceil() as i64 + 1;

        Ok(Self {
            tex_width,
            tex_height,
            steps,
            dim_a,
            dim_b,
            dim_c,
            a_c,
            a_b,
            a_a,
            side,
        })
    }

    pub fn area_of(&self, index_1d: i64) -> Area {
        let i = index_1d as f64;
        if i < self.a_c {
            Area::C
        } else if i < self.a_b {
            Area::B
        } else {
            Area::A
        }
    }

    fn step(&self, area: Area) -> i64 {
        match area {
            Area::C => self.steps.0,
            Area::B => self.steps.1,
            Area::A => self.steps.2,
        }
    }

    /// Trace every cell of the packed buffer, in index order.
    pub fn assign(&self) -> Vec<Assignment> {
        (0..self.side * self.side)
            .map(|index_1d| {
                let coord = coord_from_1d(index_1d, self.side);
                let area = self.area_of(index_1d);
                let g = self.step(area);
                Assignment {
                    coord,
                    index_1d,
                    area,
                    mapped_index: mapped_index(index_1d, self.tex_width, g),
                    global_id: old_2d_to_new_2d_coord(coord, self.tex_width, g, self.side).snap(g),
                }
            })
            .collect()
    }

    /// Whether a global id lies inside the texture.
    pub fn in_texture(&self, id: Coord) -> bool {
        (0..self.tex_width).contains(&id.x) && (0..self.tex_height).contains(&id.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_and_two_dimensional_indices_round_trip() {
        for m in [1, 7, 16] {
            for i in 0..100 {
                assert_eq!(index_from_2d(coord_from_1d(i, m), m), i);
            }
        }
        assert_eq!(coord_from_1d(17, 16), Coord::new(1, 1));
    }

    #[test]
    fn mapped_index_steps_by_g() {
        // every step advances 4 texels, wrapping onto row 4 after 16
        assert_eq!(mapped_2d_index_from_1d(0, 16, 4), Coord::new(0, 0));
        assert_eq!(mapped_2d_index_from_1d(3, 16, 4), Coord::new(12, 0));
        assert_eq!(mapped_2d_index_from_1d(4, 16, 4), Coord::new(0, 4));
        assert_eq!(mapped_2d_index_from_1d(5, 16, 4), Coord::new(4, 4));
        assert_eq!(mapped_index(5, 16, 4), 4 * 16 + 4);
        assert_eq!(mapped_index(5, 16, 1), 5);
        assert_eq!(old_2d_to_new_2d_coord(Coord::new(1, 1), 16, 2, 4), Coord::new(10, 0));
    }

    #[test]
    fn layout_thresholds() {
        let layout =
            AreaLayout::new(16, 9, (4, 2, 1), Vec2::new(0.3, 0.2), Vec2::new(0.5, 0.4)).unwrap();
        assert!((layout.a_c - 4.0 * 2.25).abs() < 1e-9);
        assert!((layout.a_b - (layout.a_c + 4.0 * 1.8)).abs() < 1e-9);
        assert!((layout.a_a - (layout.a_b + 4.8 * 1.8)).abs() < 1e-9);
        assert_eq!(layout.side, (layout.a_a.sqrt().ceil() as i64) + 1);

        assert_eq!(layout.area_of(0), Area::C);
        assert_eq!(layout.area_of(9), Area::B);
        assert_eq!(layout.area_of(17), Area::A);
    }

    #[test]
    fn assignments_cover_buffer_and_snap_to_step() {
        let layout =
            AreaLayout::new(16, 9, (4, 2, 1), Vec2::new(0.3, 0.2), Vec2::new(0.5, 0.4)).unwrap();
        let cells = layout.assign();
        assert_eq!(cells.len() as i64, layout.side * layout.side);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.index_1d, i as i64);
            let g = match cell.area {
                Area::C => 4,
                Area::B => 2,
                Area::A => 1,
            };
            assert_eq!(cell.global_id.x % g, 0);
            assert_eq!(cell.global_id.y % g, 0);
            assert!(cell.global_id.x < 16);
            assert_eq!(cell.coord, Coord::new(i as i64 % layout.side, i as i64 / layout.side));
            assert_eq!(cell.mapped_index, mapped_index(cell.index_1d, 16, g));
        }

        // first B cell: index 9 at step 2 lands 18 texels in, i.e. (2, 2)
        assert_eq!(cells[9].area, Area::B);
        assert_eq!(cells[9].mapped_index, 2 * 16 + 2);
        assert_eq!(cells[9].global_id, Coord::new(2, 2));
        assert!(layout.in_texture(cells[9].global_id));
        assert!(!layout.in_texture(Coord::new(0, 9)));
    }

    #[test]
    fn rejects_zero_step() {
        assert!(AreaLayout::new(16, 9, (0, 2, 1), Vec2::splat(0.3), Vec2::splat(0.5)).is_err());
    }
}
