use clap::ValueEnum;
use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Blue (cold, fast) to red (hot, slow)
    #[default]
    Heat,
    Spectrum,
    Fire,
    Ocean,
    Purple,
    Monochrome,
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heat" => Ok(Self::Heat),
            "spectrum" => Ok(Self::Spectrum),
            "fire" => Ok(Self::Fire),
            "ocean" => Ok(Self::Ocean),
            "purple" => Ok(Self::Purple),
            "mono" | "monochrome" => Ok(Self::Monochrome),
            _ => Err(format!("Unknown color scheme: {}", s)),
        }
    }
}

impl ColorScheme {
    /// Get color for a given position (0.0 to 1.0) and intensity (0.0 to 1.0)
    pub fn get_color(&self, position: f32, intensity: f32) -> (u8, u8, u8) {
        let position = position.clamp(0.0, 1.0);
        let intensity = intensity.clamp(0.0, 1.0);
        let (h, s, l) = match self {
            ColorScheme::Heat => {
                // Blue -> cyan -> green -> yellow -> red
                let hue = 240.0 - position * 240.0;
                (hue, 0.9, 0.35 + intensity * 0.2)
            }
            ColorScheme::Spectrum => {
                // Classic spectrum: purple -> blue -> cyan -> green -> yellow -> red
                let hue = 270.0 - (position * 270.0);
                (hue, 0.9, 0.4 + intensity * 0.3)
            }
            ColorScheme::Fire => {
                // Red -> orange -> yellow
                let hue = position * 60.0;
                (hue, 0.95, 0.3 + intensity * 0.4)
            }
            ColorScheme::Ocean => {
                // Deep blue -> cyan -> teal
                let hue = 180.0 + position * 60.0;
                (hue, 0.8, 0.3 + intensity * 0.35)
            }
            ColorScheme::Purple => {
                // Deep purple -> magenta -> pink
                let hue = 270.0 + position * 60.0;
                (hue, 0.8, 0.35 + intensity * 0.3)
            }
            ColorScheme::Monochrome => {
                // Gray ramp driven by position
                (0.0, 0.0, 0.1 + position * 0.8)
            }
        };

        let hsl = Hsl::new(h, s, l);
        let rgb: Srgb = hsl.into_color();

        (
            (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
            (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
            (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
        )
    }

    /// Color for a normalized value, at full intensity.
    pub fn ramp(&self, t: f32) -> (u8, u8, u8) {
        self.get_color(t, 1.0)
    }

    pub fn all() -> &'static [ColorScheme] {
        &[
            ColorScheme::Heat,
            ColorScheme::Spectrum,
            ColorScheme::Fire,
            ColorScheme::Ocean,
            ColorScheme::Purple,
            ColorScheme::Monochrome,
        ]
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let current = all.iter().position(|c| c == self).unwrap_or(0);
        all[(current + 1) % all.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorScheme::Heat => "heat",
            ColorScheme::Spectrum => "spectrum",
            ColorScheme::Fire => "fire",
            ColorScheme::Ocean => "ocean",
            ColorScheme::Purple => "purple",
            ColorScheme::Monochrome => "monochrome",
        }
    }
}

/// Interpolate between two colors
pub fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: f32) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    (
        (a.0 as f32 + (b.0 as f32 - a.0 as f32) * t).round() as u8,
        (a.1 as f32 + (b.1 as f32 - a.1 as f32) * t).round() as u8,
        (a.2 as f32 + (b.2 as f32 - a.2 as f32) * t).round() as u8,
    )
}
