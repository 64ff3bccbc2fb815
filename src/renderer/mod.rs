//! Pixel renderer
//!
//! Scatter plots and heatmaps render to an owned RGBA pixel buffer
//! (`Canvas`), which converts to an `image::RgbaImage` for PNG output.

pub mod scatter;

use image::error::{ImageError, ParameterError, ParameterErrorKind};
use image::{ColorType, ImageFormat, RgbaImage};
use std::path::Path;

use crate::color::{lerp_color, ColorScheme};

/// Owned RGBA pixel buffer.
///
/// Internal format is 4 bytes per pixel in straight (non pre-multiplied)
/// **RGBA** order, the layout `image` uses.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0u8; width * height * 4],
            width,
            height,
        }
    }

    /// Canvas filled with an opaque background color.
    pub fn filled(width: usize, height: usize, rgb: (u8, u8, u8)) -> Self {
        let mut canvas = Self::new(width, height);
        canvas.fill(rgb);
        canvas
    }

    pub fn from_image(image: &RgbaImage) -> Self {
        Self {
            data: image.as_raw().clone(),
            width: image.width() as usize,
            height: image.height() as usize,
        }
    }

    pub fn fill(&mut self, (r, g, b): (u8, u8, u8)) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Overwrite a pixel with an opaque color.
    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, r: u8, g: u8, b: u8) {
        let idx = (y * self.width + x) * 4;
        if x < self.width && idx + 3 < self.data.len() {
            self.data[idx..idx + 4].copy_from_slice(&[r, g, b, 255]);
        }
    }

    /// Blend a color over the pixel at (x, y) with the given opacity.
    #[inline]
    pub fn blend_pixel(&mut self, x: usize, y: usize, rgb: (u8, u8, u8), opacity: f32) {
        let idx = (y * self.width + x) * 4;
        if x >= self.width || idx + 3 >= self.data.len() {
            return;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        let dst = (self.data[idx], self.data[idx + 1], self.data[idx + 2]);
        let (r, g, b) = lerp_color(dst, rgb, opacity);
        let a = self.data[idx + 3] as f32 / 255.0;
        let out_a = opacity + a * (1.0 - opacity);
        self.data[idx] = r;
        self.data[idx + 1] = g;
        self.data[idx + 2] = b;
        self.data[idx + 3] = (out_a * 255.0).round() as u8;
    }

    /// Filled disc centred on (cx, cy). Pixels outside the canvas are clipped.
    pub fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, rgb: (u8, u8, u8), opacity: f32) {
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if !self.contains(x, y) {
                    continue;
                }
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(x as usize, y as usize, rgb, opacity);
                }
            }
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, rgb: (u8, u8, u8)) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.put_pixel(px, py, rgb.0, rgb.1, rgb.2);
            }
        }
    }

    /// Grow the canvas to the right by `extra` columns filled with `rgb`.
    pub fn extend_right(&mut self, extra: usize, rgb: (u8, u8, u8)) {
        if self.width == 0 {
            *self = Self::filled(extra, self.height, rgb);
            return;
        }
        let new_width = self.width + extra;
        let mut data = Vec::with_capacity(new_width * self.height * 4);
        for row in self.data.chunks_exact(self.width * 4) {
            data.extend_from_slice(row);
            for _ in 0..extra {
                data.extend_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
            }
        }
        self.data = data;
        self.width = new_width;
    }

    /// Vertical color bar in the rectangle (x, y, w, h), low values at the bottom.
    pub fn color_bar(&mut self, x: usize, y: usize, w: usize, h: usize, scheme: &ColorScheme) {
        if h == 0 {
            return;
        }
        for row in 0..h {
            let t = 1.0 - row as f32 / (h.max(2) - 1) as f32;
            let rgb = scheme.ramp(t);
            self.fill_rect(x, y + row, w, 1, rgb);
        }
    }

    /// Encode the buffer as PNG without copying it.
    pub fn save_png(&self, path: &Path) -> Result<(), ImageError> {
        if self.data.len() != self.width * self.height * 4 {
            return Err(ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            )));
        }
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width as u32,
            self.height as u32,
            ColorType::Rgba8,
            ImageFormat::Png,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// RGBA values at (x, y).
    pub(crate) fn pixel(canvas: &Canvas, x: usize, y: usize) -> (u8, u8, u8, u8) {
        let idx = (y * canvas.width + x) * 4;
        let px = &canvas.data[idx..idx + 4];
        (px[0], px[1], px[2], px[3])
    }

    #[test]
    fn disc_is_clipped_to_canvas() {
        let mut canvas = Canvas::filled(10, 10, (0, 0, 0));
        canvas.fill_disc(0.0, 0.0, 3.0, (255, 0, 0), 1.0);
        assert_eq!(pixel(&canvas, 0, 0), (255, 0, 0, 255));
        assert_eq!(pixel(&canvas, 2, 2), (255, 0, 0, 255));
        assert_eq!(pixel(&canvas, 3, 3), (0, 0, 0, 255));
    }

    #[test]
    fn blend_mixes_with_background() {
        let mut canvas = Canvas::filled(1, 1, (0, 0, 0));
        canvas.blend_pixel(0, 0, (200, 100, 0), 0.5);
        assert_eq!(pixel(&canvas, 0, 0), (100, 50, 0, 255));
    }

    #[test]
    fn extend_right_keeps_rows() {
        let mut canvas = Canvas::filled(2, 2, (1, 2, 3));
        canvas.put_pixel(1, 1, 9, 9, 9);
        canvas.extend_right(3, (0, 0, 0));
        assert_eq!(canvas.width, 5);
        assert_eq!(canvas.data.len(), 5 * 2 * 4);
        assert_eq!(pixel(&canvas, 1, 1), (9, 9, 9, 255));
        assert_eq!(pixel(&canvas, 4, 1), (0, 0, 0, 255));
    }

    #[test]
    fn color_bar_runs_low_at_bottom() {
        let mut canvas = Canvas::new(1, 10);
        canvas.color_bar(0, 0, 1, 10, &ColorScheme::Heat);
        let (r_top, _, b_top, _) = pixel(&canvas, 0, 0);
        let (r_bot, _, b_bot, _) = pixel(&canvas, 0, 9);
        assert!(r_top > b_top);
        assert!(b_bot > r_bot);
    }

    #[test]
    fn saves_png_and_rejects_mismatched_buffer() {
        let path = std::env::temp_dir().join(format!("densemap-canvas-{}.png", std::process::id()));
        let canvas = Canvas::filled(3, 2, (5, 6, 7));
        canvas.save_png(&path).unwrap();
        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [5, 6, 7, 255]);
        assert_eq!(Canvas::from_image(&image).data, canvas.data);
        std::fs::remove_file(&path).unwrap();

        let mut broken = Canvas::filled(3, 2, (0, 0, 0));
        broken.data.pop();
        assert!(matches!(broken.save_png(&path), Err(ImageError::Parameter(_))));
        assert!(!path.exists());
    }
}
