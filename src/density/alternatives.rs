//! Earlier density experiments. Both keep the endpoints fixed but neither gives
//! the symmetric, radius-controlled density of [`super::Bands`].

use std::f64::consts::PI;

use super::RemapError;

/// Three straight lines with a fixed middle slope.
///
/// The outer slopes are whatever is left over to reach 0 and 1, so the density
/// left of the focal point differs from the density right of it unless the
/// focal point sits at 0.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidLinear {
    focal: f64,
    radius: f64,
    slope: f64,
}

impl MidLinear {
    pub fn new(focal: f64, radius: f64, slope: f64) -> Result<Self, RemapError> {
        if !(focal.is_finite() && radius.is_finite() && slope.is_finite()) {
            return Err(RemapError::degenerate("non-finite mid-linear input"));
        }
        if radius <= 0.0 || slope <= 0.0 {
            return Err(RemapError::degenerate(format!(
                "radius {} and middle slope {} must be positive",
                radius, slope
            )));
        }
        if focal - radius <= 0.0 || 1.0 - focal - radius <= 0.0 {
            return Err(RemapError::degenerate(format!(
                "band [{} - {}, {} + {}] touches the domain edge",
                focal, radius, focal, radius
            )));
        }
        if slope * radius >= focal || focal + slope * radius >= 1.0 {
            return Err(RemapError::degenerate(format!(
                "middle slope {} leaves no room for the outer bands",
                slope
            )));
        }
        Ok(Self { focal, radius, slope })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let (p, rad, ires) = (self.focal, self.radius, self.slope);
        if x < p - rad {
            let left_p = p - rad * ires;
            x * left_p / (p - rad)
        } else if x > p + rad {
            let right_p = p + rad * ires;
            let m = (1.0 - right_p) / (1.0 - p - rad);
            m * x + right_p - m * (p + rad)
        } else {
            ires * x + p * (1.0 - ires)
        }
    }
}

/// `y * sin(2π t / period + phase)`
pub fn harmonic_sinus(t: f64, amplitude: f64, period: f64, phase: f64) -> f64 {
    let omega = 2.0 * PI / period;
    amplitude * (omega * t + phase).sin()
}

/// Two quarter sine waves joined at the focal point with zero slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sinus {
    focal: f64,
}

impl Sinus {
    pub fn new(focal: f64) -> Result<Self, RemapError> {
        if !focal.is_finite() || !(0.0..=1.0).contains(&focal) {
            return Err(RemapError::degenerate(format!(
                "focal {} must lie in [0, 1]",
                focal
            )));
        }
        Ok(Self { focal })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let p = self.focal;
        if x <= p {
            if p == 0.0 {
                return 0.0;
            }
            harmonic_sinus(x, p, 4.0 * p, 0.0)
        } else {
            let q = 1.0 - p;
            if q == 0.0 {
                return x;
            }
            let period = 4.0 * q;
            let omega = 2.0 * PI / period;
            harmonic_sinus(x, q, period, -omega) + 1.0
        }
    }
}

/// See [`MidLinear`].
pub fn mid_linear(x: f64, focal: f64, radius: f64, slope: f64) -> Result<f64, RemapError> {
    Ok(MidLinear::new(focal, radius, slope)?.eval(x))
}

/// See [`Sinus`].
pub fn assembled_sinus(x: f64, focal: f64) -> Result<f64, RemapError> {
    Ok(Sinus::new(focal)?.eval(x))
}
