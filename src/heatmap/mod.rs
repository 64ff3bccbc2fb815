//! Kernel-time heatmaps over reference renders.

pub mod batch;

use image::RgbaImage;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::HeatmapConfig;
use crate::measurement::{self, Measurement, MeasurementError};
use crate::renderer::Canvas;

const BACKGROUND: (u8, u8, u8) = (24, 24, 28);
const COLORBAR_GAP: usize = 8;

#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("no measurements to plot")]
    Empty,
    #[error(transparent)]
    Measurement(#[from] MeasurementError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Rendered heatmap plus what went into it.
#[derive(Debug)]
pub struct Heatmap {
    pub canvas: Canvas,
    pub drawn: usize,
    pub skipped: usize,
    pub min_kernel_time: f64,
    pub max_kernel_time: f64,
}

/// Map kernel times onto [0, 1]. A constant series maps to 0.5.
pub fn normalize(values: &[f64]) -> Vec<f32> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if range > 0.0 {
                ((v - min) / range) as f32
            } else {
                0.5
            }
        })
        .collect()
}

/// Draw one disc per measurement at its mouse position, colored by kernel time,
/// and append a color bar on the right.
pub fn render(
    measurements: &[Measurement],
    background: Option<&RgbaImage>,
    config: &HeatmapConfig,
) -> Result<Heatmap, HeatmapError> {
    let selected: Vec<&Measurement> = measurements
        .iter()
        .filter(|m| config.include_repeated || m.single_measurement())
        .collect();
    if selected.is_empty() {
        return Err(HeatmapError::Empty);
    }

    let times: Vec<f64> = selected.iter().map(|m| m.kernel_time()).collect();
    let levels = normalize(&times);
    let min_kernel_time = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max_kernel_time = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut canvas = match background {
        Some(image) => Canvas::from_image(image),
        None => {
            let radius = config.point_radius.ceil() as usize;
            let max_x = selected.iter().map(|m| m.mouse_position().0.max(0)).max().unwrap_or(0);
            let max_y = selected.iter().map(|m| m.mouse_position().1.max(0)).max().unwrap_or(0);
            Canvas::filled(max_x as usize + radius + 1, max_y as usize + radius + 1, BACKGROUND)
        }
    };
    let plot_height = canvas.height;

    let mut drawn = 0;
    let mut skipped = 0;
    for (m, &level) in selected.iter().zip(&levels) {
        let (x, y) = m.mouse_position();
        if !canvas.contains(x as i64, y as i64) {
            debug!(
                "Measurement at {} (+{} ms, grid cell {:?}) lies outside the image at ({}, {})",
                m.system_time(),
                m.elapsed_time(),
                m.grid_position(),
                x,
                y
            );
            skipped += 1;
            continue;
        }
        let rgb = config.color_scheme.ramp(level);
        canvas.fill_disc(x as f64, y as f64, config.point_radius, rgb, config.opacity);
        drawn += 1;
    }
    if skipped > 0 {
        debug!("Skipped {} measurements outside the image", skipped);
    }

    if config.colorbar_width > 0 {
        let x = canvas.width + COLORBAR_GAP;
        canvas.extend_right(config.colorbar_width + 2 * COLORBAR_GAP, BACKGROUND);
        let inset = plot_height / 10;
        canvas.color_bar(
            x,
            inset,
            config.colorbar_width,
            plot_height.saturating_sub(2 * inset),
            &config.color_scheme,
        );
    }

    Ok(Heatmap {
        canvas,
        drawn,
        skipped,
        min_kernel_time,
        max_kernel_time,
    })
}

pub fn load_image(path: &Path) -> Result<RgbaImage, HeatmapError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Read a log, render it over `image_path` (if any) and write the PNG to `out_path`.
pub fn render_file(
    log_path: &Path,
    image_path: Option<&Path>,
    out_path: &Path,
    config: &HeatmapConfig,
) -> Result<Heatmap, HeatmapError> {
    let measurements = measurement::read(log_path)?;
    let background = image_path.map(load_image).transpose()?;
    let heatmap = render(&measurements, background.as_ref(), config)?;

    heatmap.canvas.save_png(out_path)?;

    info!(
        "Wrote {} ({} points, kernel time {:.3} - {:.3})",
        out_path.display(),
        heatmap.drawn,
        heatmap.min_kernel_time,
        heatmap.max_kernel_time
    );
    Ok(heatmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;
    use crate::measurement::tests::sample_log;
    use crate::renderer::tests::pixel;

    /// Parse `(mouse_x, mouse_y, kernel_time, single)` samples through a log.
    fn samples(points: &[(i32, i32, f64, bool)]) -> Vec<Measurement> {
        let lines: Vec<String> = points
            .iter()
            .map(|&(x, y, t, single)| {
                format!("12:00\t0\t{}\t({}, {})\t(0, 0)\t{}", t, x, y, if single { 0 } else { 1 })
            })
            .collect();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        measurement::parse(&sample_log(&lines)).unwrap()
    }

    fn config() -> HeatmapConfig {
        HeatmapConfig {
            color_scheme: ColorScheme::Heat,
            point_radius: 2.0,
            opacity: 1.0,
            colorbar_width: 0,
            include_repeated: true,
        }
    }

    #[test]
    fn normalize_spans_unit_range() {
        assert_eq!(normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(normalize(&[7.0, 7.0]), vec![0.5, 0.5]);
    }

    #[test]
    fn slow_and_fast_points_get_different_colors() {
        let data = samples(&[(5, 5, 1.0, true), (20, 5, 9.0, true)]);
        let heatmap = render(&data, None, &config()).unwrap();
        assert_eq!(heatmap.drawn, 2);
        let (r_fast, _, b_fast, _) = pixel(&heatmap.canvas, 5, 5);
        let (r_slow, _, b_slow, _) = pixel(&heatmap.canvas, 20, 5);
        assert!(b_fast > r_fast);
        assert!(r_slow > b_slow);
        assert_eq!(heatmap.min_kernel_time, 1.0);
        assert_eq!(heatmap.max_kernel_time, 9.0);
    }

    #[test]
    fn points_outside_background_are_skipped() {
        let background = RgbaImage::from_pixel(10, 10, image::Rgba([0, 0, 0, 255]));
        let data = samples(&[(5, 5, 1.0, true), (50, 5, 2.0, true), (-1, 2, 3.0, true)]);
        let heatmap = render(&data, Some(&background), &config()).unwrap();
        assert_eq!(heatmap.drawn, 1);
        assert_eq!(heatmap.skipped, 2);
        assert_eq!((heatmap.canvas.width, heatmap.canvas.height), (10, 10));
    }

    #[test]
    fn repeated_measurements_can_be_excluded() {
        let data = samples(&[(1, 1, 1.0, false)]);
        let mut cfg = config();
        cfg.include_repeated = false;
        assert!(matches!(render(&data, None, &cfg), Err(HeatmapError::Empty)));
    }

    #[test]
    fn color_bar_widens_canvas() {
        let background = RgbaImage::from_pixel(40, 40, image::Rgba([0, 0, 0, 255]));
        let mut cfg = config();
        cfg.colorbar_width = 6;
        let heatmap = render(&samples(&[(1, 1, 1.0, true)]), Some(&background), &cfg).unwrap();
        assert_eq!(heatmap.canvas.width, 40 + 6 + 2 * COLORBAR_GAP);
        assert_ne!(pixel(&heatmap.canvas, 40 + COLORBAR_GAP, 20), (24, 24, 28, 255));
    }

    #[test]
    fn render_file_writes_canvas_as_png() {
        let dir = std::env::temp_dir().join(format!("densemap-render-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let log = dir.join("ms_data.txt");
        let out = dir.join("heatmap.png");
        std::fs::write(
            &log,
            sample_log(&["12:00\t0\t1.0\t(2, 2)\t(0, 0)\t0", "12:00\t5\t3.0\t(8, 4)\t(0, 0)\t0"]),
        )
        .unwrap();

        let heatmap = render_file(&log, None, &out, &config()).unwrap();
        let written = image::open(&out).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (heatmap.canvas.width as u32, heatmap.canvas.height as u32));
        assert_eq!(written.as_raw(), &heatmap.canvas.data);

        let missing = render_file(&dir.join("missing.txt"), None, &out, &config());
        assert!(matches!(missing, Err(HeatmapError::Measurement(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
