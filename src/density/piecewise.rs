use super::RemapError;

/// One of the three contiguous bands of the piecewise transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Left,
    Middle,
    Right,
}

/// Straight line `y = m * x + d`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    m: f64,
    d: f64,
}

impl Line {
    #[inline]
    fn at(&self, x: f64) -> f64 {
        self.m * x + self.d
    }
}

/// Piecewise-affine density transform for one axis.
///
/// The input range is split at `lrp` and `lrp + pp`. The middle piece gets an
/// output share of `pp = 2 * radius * density_factor` and maps onto the
/// `[focal - radius, focal + radius]` band, so it is sampled `density_factor`
/// times as densely as a uniform grid. The outer pieces share the rest in
/// proportion to the width of their bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    left_width: f64,
    mid_width: f64,
    right_width: f64,
    lrp: f64,
    rrp: f64,
    pp: f64,
    left: Line,
    middle: Line,
    right: Line,
}

impl Bands {
    pub fn new(focal: f64, radius: f64, density_factor: f64) -> Result<Self, RemapError> {
        if !(focal.is_finite() && radius.is_finite() && density_factor.is_finite()) {
            return Err(RemapError::degenerate(format!(
                "non-finite input (focal {}, radius {}, density factor {})",
                focal, radius, density_factor
            )));
        }
        if radius <= 0.0 || radius >= 0.5 {
            return Err(RemapError::degenerate(format!(
                "radius {} must lie in (0, 0.5)",
                radius
            )));
        }
        if density_factor <= 0.0 {
            return Err(RemapError::degenerate(format!(
                "density factor {} must be positive",
                density_factor
            )));
        }

        let l = focal - radius;
        let mid = 2.0 * radius;
        let r = 1.0 - l - mid;

        if r <= 0.0 {
            return Err(RemapError::degenerate(format!(
                "right band is empty (focal {} + radius {} >= 1)",
                focal, radius
            )));
        }
        if l <= 0.0 {
            return Err(RemapError::degenerate(format!(
                "left band is empty (focal {} - radius {} <= 0)",
                focal, radius
            )));
        }

        let ratio_plus_one = l / r + 1.0;
        if ratio_plus_one == 0.0 {
            return Err(RemapError::degenerate("left/right band ratio is -1"));
        }

        let pp = mid * density_factor;
        if pp >= 1.0 {
            return Err(RemapError::degenerate(format!(
                "middle band would cover the whole output (2 * {} * {} >= 1)",
                radius, density_factor
            )));
        }

        let one_minus_pp = 1.0 - pp;
        let lrp = one_minus_pp * (1.0 - 1.0 / ratio_plus_one);
        let rrp = one_minus_pp / ratio_plus_one;
        if lrp <= 0.0 || rrp <= 0.0 {
            return Err(RemapError::degenerate(format!(
                "outer band output width collapsed (lrp {}, rrp {})",
                lrp, rrp
            )));
        }

        let lm = l / lrp;
        let mm = mid / pp;
        let rm = r / rrp;

        // offsets chosen so neighbouring lines meet at lrp and lrp + pp
        let md = lrp * lm - lrp * mm;
        let rd = ((lrp + pp) * mm + md) - (lrp + pp) * rm;

        Ok(Self {
            left_width: l,
            mid_width: mid,
            right_width: r,
            lrp,
            rrp,
            pp,
            left: Line { m: lm, d: 0.0 },
            middle: Line { m: mm, d: md },
            right: Line { m: rm, d: rd },
        })
    }

    /// Which band `x` falls into.
    pub fn band(&self, x: f64) -> Band {
        if x < self.lrp {
            Band::Left
        } else if x > self.lrp + self.pp {
            Band::Right
        } else {
            Band::Middle
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        if x == 1.0 {
            return 1.0;
        }
        self.eval_band(self.band(x), x)
    }

    /// Evaluate the affine function of `band` at `x`, regardless of whether `x`
    /// lies inside that band.
    pub fn eval_band(&self, band: Band, x: f64) -> f64 {
        match band {
            Band::Left => self.left.at(x),
            Band::Middle => self.middle.at(x),
            Band::Right => self.right.at(x),
        }
    }

    pub fn slope(&self, band: Band) -> f64 {
        match band {
            Band::Left => self.left.m,
            Band::Middle => self.middle.m,
            Band::Right => self.right.m,
        }
    }

    /// Input widths of the left, middle and right bands.
    pub fn widths(&self) -> (f64, f64, f64) {
        (self.left_width, self.mid_width, self.right_width)
    }

    /// Output share of the left band, which is also where the middle piece starts.
    pub fn lrp(&self) -> f64 {
        self.lrp
    }

    pub fn rrp(&self) -> f64 {
        self.rrp
    }

    pub fn pp(&self) -> f64 {
        self.pp
    }

    /// Range the middle piece maps onto.
    pub fn middle_range(&self) -> (f64, f64) {
        (
            self.middle.at(self.lrp),
            self.middle.at(self.lrp + self.pp),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::remap;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn reference_scenario_band_layout() {
        let bands = Bands::new(0.2, 0.05, 2.0).unwrap();
        let (l, mid, r) = bands.widths();
        assert!(close(l, 0.15));
        assert!(close(mid, 0.10));
        assert!(close(r, 0.75));
        assert!(close(bands.pp(), 0.2));
        assert!(close(bands.lrp() + bands.rrp() + bands.pp(), 1.0));
        // outer bands split 1 - pp in proportion to 0.15 : 0.75
        assert!(close(bands.lrp(), 0.8 * 0.15 / 0.9));
    }

    #[test]
    fn reference_scenario_focal_lands_in_middle_band() {
        let bands = Bands::new(0.2, 0.05, 2.0).unwrap();
        let (lo, hi) = bands.middle_range();
        assert!(close(lo, 0.15));
        assert!(close(hi, 0.25));

        let at_focal = remap(0.2, 0.2, 0.05, 2.0).unwrap();
        let outside = remap(0.05, 0.2, 0.05, 2.0).unwrap();
        assert!(at_focal >= lo && at_focal <= hi);

        let center = (lo + hi) / 2.0;
        assert!((at_focal - center).abs() < (outside - center).abs());
    }

    #[test]
    fn continuous_at_band_boundaries() {
        for (focal, radius, factor) in [
            (0.2, 0.05, 2.0),
            (0.3, 0.07, 2.5),
            (0.7, 0.07, 3.0),
            (0.5, 0.2, 1.5),
            (0.9, 0.05, 0.5),
        ] {
            let bands = Bands::new(focal, radius, factor).unwrap();
            let a = bands.lrp();
            let b = bands.lrp() + bands.pp();
            assert!(close(bands.eval_band(Band::Left, a), bands.eval_band(Band::Middle, a)));
            assert!(close(bands.eval_band(Band::Middle, b), bands.eval_band(Band::Right, b)));
        }
    }

    #[test]
    fn monotonic_across_all_bands() {
        for (focal, radius, factor) in [(0.2, 0.05, 2.0), (0.7, 0.07, 3.0), (0.4, 0.1, 4.0)] {
            let bands = Bands::new(focal, radius, factor).unwrap();
            for band in [Band::Left, Band::Middle, Band::Right] {
                assert!(bands.slope(band) > 0.0);
            }
            let mut prev = bands.eval(0.0);
            for i in 1..=1000 {
                let y = bands.eval(i as f64 / 1000.0);
                assert!(y >= prev, "not monotonic at {} for focal {}", i, focal);
                prev = y;
            }
        }
    }

    #[test]
    fn middle_band_is_denser() {
        let bands = Bands::new(0.5, 0.1, 3.0).unwrap();
        // smaller slope means more input samples per unit of output
        assert!(bands.slope(Band::Middle) < bands.slope(Band::Left));
        assert!(bands.slope(Band::Middle) < bands.slope(Band::Right));
        // l = r = 0.4, lrp = rrp = 0.2, so outer slope 2 against middle slope 1/3
        assert!(close(bands.slope(Band::Left) / bands.slope(Band::Middle), 6.0));
    }

    #[test]
    fn collapsed_bands_are_errors() {
        assert!(Bands::new(0.5, 0.5, 3.0).is_err());
        assert!(Bands::new(0.05, 0.07, 3.0).is_err());
        assert!(Bands::new(0.95, 0.07, 3.0).is_err());
        assert!(Bands::new(0.5, 0.0, 3.0).is_err());
        assert!(Bands::new(0.5, -0.1, 3.0).is_err());
        assert!(Bands::new(0.5, 0.1, 0.0).is_err());
        assert!(Bands::new(0.5, 0.1, 5.0).is_err());
        assert!(Bands::new(f64::NAN, 0.1, 2.0).is_err());
    }
}
