//! Adaptive point density remapping.
//!
//! A remap takes a uniform coordinate in `[0, 1]` and returns a warped
//! coordinate in the same range, such that evenly spaced inputs come out
//! clustered around a focal point. Every strategy keeps `0 -> 0` and
//! `1 -> 1`, so remapped samples stay inside the rendering bounds.
//!
//! [`DensityStrategy::Piecewise`] is the canonical transform: three affine
//! bands, continuous and monotonic. The other two strategies are older
//! experiments kept for comparison.

mod alternatives;
mod piecewise;

pub use alternatives::{assembled_sinus, mid_linear, MidLinear, Sinus};
pub use piecewise::{Band, Bands};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_RADIUS: f64 = 0.07;
pub const DEFAULT_DENSITY_FACTOR: f64 = 3.0;
pub const DEFAULT_MID_LINEAR_SLOPE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemapError {
    #[error("degenerate remap parameters: {0}")]
    DegenerateParameters(String),
}

impl RemapError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        RemapError::DegenerateParameters(reason.into())
    }
}

/// Per-invocation remap parameters. The focal point is passed separately since
/// it differs per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemapParams {
    /// Half width of the high-density band around the focal point.
    pub radius: f64,
    /// Multiplier for the share of the output range given to the middle band.
    pub density_factor: f64,
    /// Slope of the middle band for [`DensityStrategy::MidLinear`].
    #[serde(default = "default_mid_linear_slope")]
    pub mid_linear_slope: f64,
}

fn default_mid_linear_slope() -> f64 {
    DEFAULT_MID_LINEAR_SLOPE
}

impl Default for RemapParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            density_factor: DEFAULT_DENSITY_FACTOR,
            mid_linear_slope: DEFAULT_MID_LINEAR_SLOPE,
        }
    }
}

impl RemapParams {
    pub fn new(radius: f64, density_factor: f64) -> Self {
        Self {
            radius,
            density_factor,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DensityStrategy {
    /// Three affine bands, boundary and continuity preserving
    #[default]
    Piecewise,
    /// Fixed middle slope, asymmetric density on either side of the focal point
    MidLinear,
    /// Two sine arcs meeting at the focal point, ignores radius and factor
    Sinus,
}

impl DensityStrategy {
    pub fn all() -> &'static [DensityStrategy] {
        &[
            DensityStrategy::Piecewise,
            DensityStrategy::MidLinear,
            DensityStrategy::Sinus,
        ]
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let current = all.iter().position(|s| s == self).unwrap_or(0);
        all[(current + 1) % all.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DensityStrategy::Piecewise => "piecewise",
            DensityStrategy::MidLinear => "mid-linear",
            DensityStrategy::Sinus => "sinus",
        }
    }

    /// Validate the parameters for one axis and return the prepared mapping.
    pub fn axis(&self, focal: f64, params: &RemapParams) -> Result<AxisMap, RemapError> {
        match self {
            DensityStrategy::Piecewise => {
                Bands::new(focal, params.radius, params.density_factor).map(AxisMap::Piecewise)
            }
            DensityStrategy::MidLinear => {
                MidLinear::new(focal, params.radius, params.mid_linear_slope)
                    .map(AxisMap::MidLinear)
            }
            DensityStrategy::Sinus => Sinus::new(focal).map(AxisMap::Sinus),
        }
    }

    /// Remap a single coordinate.
    pub fn remap(&self, x: f64, focal: f64, params: &RemapParams) -> Result<f64, RemapError> {
        match self {
            DensityStrategy::Piecewise => remap(x, focal, params.radius, params.density_factor),
            DensityStrategy::MidLinear => {
                check_finite(x)?;
                mid_linear(x, focal, params.radius, params.mid_linear_slope)
            }
            DensityStrategy::Sinus => {
                check_finite(x)?;
                assembled_sinus(x, focal)
            }
        }
    }
}

impl fmt::Display for DensityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DensityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "piecewise" | "change-density" => Ok(Self::Piecewise),
            "mid-linear" | "midlinear" => Ok(Self::MidLinear),
            "sinus" | "assembled-sinus" => Ok(Self::Sinus),
            _ => Err(format!("Unknown density strategy: {}", s)),
        }
    }
}

/// A validated one-dimensional remap, ready to be evaluated for many samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisMap {
    Piecewise(Bands),
    MidLinear(MidLinear),
    Sinus(Sinus),
}

impl AxisMap {
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            AxisMap::Piecewise(bands) => bands.eval(x),
            AxisMap::MidLinear(m) => m.eval(x),
            AxisMap::Sinus(s) => s.eval(x),
        }
    }
}

/// Remap `x` towards `focal` with the piecewise-affine transform.
///
/// Fails with [`RemapError::DegenerateParameters`] when the focal point and
/// radius collapse one of the three bands.
pub fn remap(x: f64, focal: f64, radius: f64, density_factor: f64) -> Result<f64, RemapError> {
    check_finite(x)?;
    Ok(Bands::new(focal, radius, density_factor)?.eval(x))
}

fn check_finite(x: f64) -> Result<(), RemapError> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(RemapError::degenerate(format!("coordinate {} is not finite", x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn every_strategy_preserves_boundaries() {
        let params = RemapParams::default();
        for strategy in DensityStrategy::all() {
            for focal in [0.2, 0.3, 0.5, 0.7, 0.8] {
                let lo = strategy.remap(0.0, focal, &params).unwrap();
                let hi = strategy.remap(1.0, focal, &params).unwrap();
                assert!(lo.abs() < EPS, "{} f(0) = {} at {}", strategy, lo, focal);
                assert!((hi - 1.0).abs() < EPS, "{} f(1) = {} at {}", strategy, hi, focal);
            }
        }
    }

    #[test]
    fn piecewise_endpoints_are_exact() {
        assert_eq!(remap(0.0, 0.3, 0.07, 2.5).unwrap(), 0.0);
        assert_eq!(remap(1.0, 0.3, 0.07, 2.5).unwrap(), 1.0);
    }

    #[test]
    fn degenerate_parameters_are_rejected() {
        let err = remap(0.4, 0.5, 0.5, 3.0).unwrap_err();
        assert!(matches!(err, RemapError::DegenerateParameters(_)));
        assert!(err.to_string().starts_with("degenerate remap parameters"));
    }

    #[test]
    fn non_finite_coordinate_is_rejected() {
        let params = RemapParams::default();
        for strategy in DensityStrategy::all() {
            assert!(strategy.remap(f64::NAN, 0.5, &params).is_err());
        }
        assert!(remap(f64::INFINITY, 0.5, 0.07, 3.0).is_err());
    }

    #[test]
    fn strategy_remap_matches_free_functions() {
        let params = RemapParams::new(0.07, 2.5);
        for x in [0.0, 0.1, 0.3, 0.35, 0.9] {
            assert_eq!(
                DensityStrategy::Piecewise.remap(x, 0.3, &params).unwrap(),
                remap(x, 0.3, 0.07, 2.5).unwrap()
            );
            assert_eq!(
                DensityStrategy::MidLinear.remap(x, 0.3, &params).unwrap(),
                mid_linear(x, 0.3, 0.07, params.mid_linear_slope).unwrap()
            );
            assert_eq!(
                DensityStrategy::Sinus.remap(x, 0.3, &params).unwrap(),
                assembled_sinus(x, 0.3).unwrap()
            );
        }
    }

    #[test]
    fn strategy_cycles_and_parses() {
        assert_eq!(DensityStrategy::Piecewise.next(), DensityStrategy::MidLinear);
        assert_eq!(DensityStrategy::Sinus.next(), DensityStrategy::Piecewise);
        for s in DensityStrategy::all() {
            assert_eq!(s.name().parse::<DensityStrategy>().unwrap(), *s);
        }
        assert!("spline".parse::<DensityStrategy>().is_err());
    }
}
