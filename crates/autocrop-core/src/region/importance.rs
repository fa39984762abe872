//! Per-pixel importance and its summed-area table.
//!
//! Importance combines three signals computed on a downscaled copy of the
//! image:
//!
//! - **detail**: a Laplacian of BT.709 luminance, clamped to 0-1
//! - **skin**: closeness of the pixel's color direction to a reference skin
//!   tone, inside a brightness window
//! - **saturation**: HSL saturation, inside a brightness window
//!
//! Values are quantized to integers before accumulation, so region sums are
//! exact and equal-content regions compare equal.

use std::borrow::Cow;

use image::imageops::{self, FilterType};

use super::SelectorOptions;
use crate::decode::DecodedImage;
use crate::transform::CropRect;

/// Fixed-point scale applied to importance before summing.
const QUANTIZATION: f32 = 1000.0;

// ITU-R BT.709 luminance coefficients
const LUMINANCE_R: f32 = 0.2126;
const LUMINANCE_G: f32 = 0.7152;
const LUMINANCE_B: f32 = 0.0722;

#[inline]
fn luminance(rgb: [f32; 3]) -> f32 {
    LUMINANCE_R * rgb[0] + LUMINANCE_G * rgb[1] + LUMINANCE_B * rgb[2]
}

#[inline]
fn normalized(rgb: [u8; 3]) -> [f32; 3] {
    [
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    ]
}

#[inline]
fn in_window(value: f32, (lo, hi): (f32, f32)) -> bool {
    value >= lo && value <= hi
}

/// Rescale `value` above `threshold` into 0-1; anything at or below is 0.
#[inline]
fn above_threshold(value: f32, threshold: f32) -> f32 {
    if value <= threshold || threshold >= 1.0 {
        0.0
    } else {
        ((value - threshold) / (1.0 - threshold)).min(1.0)
    }
}

/// 1 minus the distance between the pixel's unit color vector and the skin
/// reference.
fn skin_likeness(rgb: [f32; 3], skin: [f32; 3]) -> f32 {
    let mag = (rgb[0] * rgb[0] + rgb[1] * rgb[1] + rgb[2] * rgb[2]).sqrt();
    if mag == 0.0 {
        return 0.0;
    }
    let dr = rgb[0] / mag - skin[0];
    let dg = rgb[1] / mag - skin[1];
    let db = rgb[2] / mag - skin[2];
    1.0 - (dr * dr + dg * dg + db * db).sqrt()
}

/// HSL saturation.
fn saturation(rgb: [f32; 3]) -> f32 {
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    let min = rgb[0].min(rgb[1]).min(rgb[2]);
    if max == min {
        return 0.0;
    }
    let lightness = (max + min) / 2.0;
    let delta = max - min;
    if lightness > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    }
}

/// Importance of each pixel, row-major, not yet quantized.
fn pixel_importance(image: &DecodedImage, options: &SelectorOptions) -> Vec<f32> {
    let (w, h) = (image.width as usize, image.height as usize);
    let colors: Vec<[f32; 3]> = image
        .pixels
        .chunks_exact(3)
        .map(|p| normalized([p[0], p[1], p[2]]))
        .collect();
    let lum: Vec<f32> = colors.iter().copied().map(luminance).collect();

    let mut out = Vec::with_capacity(w * h);
    for y in 0..h {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(h - 1);
        for x in 0..w {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(w - 1);
            let idx = y * w + x;

            let laplacian = 4.0 * lum[idx]
                - lum[y * w + left]
                - lum[y * w + right]
                - lum[up * w + x]
                - lum[down * w + x];
            let detail = laplacian.clamp(0.0, 1.0);

            let rgb = colors[idx];
            let skin = if in_window(lum[idx], options.skin_brightness) {
                above_threshold(skin_likeness(rgb, options.skin_color), options.skin_threshold)
            } else {
                0.0
            };
            let sat = if in_window(lum[idx], options.saturation_brightness) {
                above_threshold(saturation(rgb), options.saturation_threshold)
            } else {
                0.0
            };

            out.push(
                detail * options.detail_weight
                    + skin * (detail + options.skin_bias) * options.skin_weight
                    + sat * (detail + options.saturation_bias) * options.saturation_weight,
            );
        }
    }
    out
}

/// Downscaled copy for analysis, or the image itself if it is small enough.
fn analysis_raster(image: &DecodedImage, max_edge: u32) -> Cow<'_, DecodedImage> {
    let long_edge = image.width.max(image.height);
    if max_edge == 0 || long_edge <= max_edge {
        return Cow::Borrowed(image);
    }
    let Some(rgb) = image.to_rgb_image() else {
        return Cow::Borrowed(image);
    };

    let scale = max_edge as f64 / long_edge as f64;
    let width = ((image.width as f64 * scale).round() as u32).max(1);
    let height = ((image.height as f64 * scale).round() as u32).max(1);
    let resized = imageops::resize(&rgb, width, height, FilterType::Triangle);
    Cow::Owned(DecodedImage::from_rgb_image(resized))
}

/// Summed-area table of quantized importance over the analysis raster.
#[derive(Debug)]
pub(crate) struct ImportanceMap {
    width: u32,
    height: u32,
    /// Analysis pixels per source pixel, per axis.
    scale_x: f64,
    scale_y: f64,
    /// `(width + 1) * (height + 1)` prefix sums; row 0 and column 0 are zero.
    integral: Vec<u64>,
}

impl ImportanceMap {
    pub(crate) fn compute(image: &DecodedImage, options: &SelectorOptions) -> Self {
        let analysis = analysis_raster(image, options.analysis_max_edge);
        let importance = pixel_importance(&analysis, options);

        let (w, h) = (analysis.width as usize, analysis.height as usize);
        let stride = w + 1;
        let mut integral = vec![0u64; stride * (h + 1)];
        for y in 0..h {
            let mut row_sum = 0u64;
            for x in 0..w {
                row_sum += (importance[y * w + x].max(0.0) * QUANTIZATION).round() as u64;
                integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
            }
        }

        Self {
            width: analysis.width,
            height: analysis.height,
            scale_x: analysis.width as f64 / image.width as f64,
            scale_y: analysis.height as f64 / image.height as f64,
            integral,
        }
    }

    /// Aggregate importance of a source-space rectangle.
    ///
    /// The rectangle is mapped to analysis space with a size that depends only
    /// on its extent, so equally sized candidates are compared over equally
    /// sized windows.
    pub(crate) fn score(&self, rect: CropRect) -> u64 {
        let (x0, x1) = Self::span(rect.x, rect.width, self.scale_x, self.width);
        let (y0, y1) = Self::span(rect.y, rect.height, self.scale_y, self.height);

        let stride = self.width as usize + 1;
        let at = |x: u32, y: u32| self.integral[y as usize * stride + x as usize];
        at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0)
    }

    fn span(origin: u32, extent: u32, scale: f64, limit: u32) -> (u32, u32) {
        let len = ((extent as f64 * scale).round() as u32).clamp(1, limit);
        let start = ((origin as f64 * scale).round() as u32).min(limit - len);
        (start, start + len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, rgb: [u8; 3]) -> DecodedImage {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_luminance_coefficients_sum_to_one() {
        let sum = LUMINANCE_R + LUMINANCE_G + LUMINANCE_B;
        assert!((sum - 1.0).abs() < 1e-6);
        assert!((luminance([1.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_skin_tone_is_recognized() {
        let options = SelectorOptions::default();
        let skin = normalized([200, 146, 113]);
        let gray = normalized([128, 128, 128]);

        assert!(skin_likeness(skin, options.skin_color) > options.skin_threshold);
        assert!(skin_likeness(gray, options.skin_color) < options.skin_threshold);
        assert_eq!(skin_likeness([0.0, 0.0, 0.0], options.skin_color), 0.0);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(saturation([0.5, 0.5, 0.5]), 0.0);
        assert!((saturation([1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_above_threshold() {
        assert_eq!(above_threshold(0.3, 0.4), 0.0);
        assert!((above_threshold(0.7, 0.4) - 0.5).abs() < 1e-6);
        assert_eq!(above_threshold(0.9, 1.0), 0.0);
    }

    #[test]
    fn test_flat_image_has_no_importance() {
        let img = flat(40, 30, [128, 128, 128]);
        let map = ImportanceMap::compute(&img, &SelectorOptions::default());
        assert_eq!(map.score(CropRect::full(40, 30)), 0);
    }

    #[test]
    fn test_edges_add_importance() {
        let mut img = flat(20, 20, [20, 20, 20]);
        // A single bright pixel is a strong Laplacian peak
        let idx = (10 * 20 + 10) * 3;
        img.pixels[idx..idx + 3].copy_from_slice(&[255, 255, 255]);

        let map = ImportanceMap::compute(&img, &SelectorOptions::default());
        assert!(map.score(CropRect::new(8, 8, 5, 5)) > 0);
        assert_eq!(map.score(CropRect::new(0, 0, 5, 5)), 0);
    }

    #[test]
    fn test_large_image_is_downscaled() {
        let img = flat(2000, 1000, [90, 90, 90]);
        let options = SelectorOptions {
            analysis_max_edge: 100,
            ..SelectorOptions::default()
        };
        let map = ImportanceMap::compute(&img, &options);

        assert_eq!((map.width, map.height), (100, 50));
        assert!((map.scale_x - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_span_keeps_window_inside() {
        assert_eq!(ImportanceMap::span(0, 10, 1.0, 20), (0, 10));
        assert_eq!(ImportanceMap::span(15, 10, 1.0, 20), (10, 20));
        assert_eq!(ImportanceMap::span(3, 1, 0.1, 20), (0, 1));
    }
}
