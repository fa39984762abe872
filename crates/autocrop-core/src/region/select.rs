//! Best-fit crop selection.

use super::importance::ImportanceMap;
use super::{RegionError, SelectorOptions};
use crate::decode::DecodedImage;
use crate::transform::CropRect;

/// Select the crop rectangle for a `target_width x target_height` output
/// using the default heuristic weights.
///
/// See [`select_crop_region_with`].
pub fn select_crop_region(
    image: &DecodedImage,
    target_width: u32,
    target_height: u32,
) -> Result<CropRect, RegionError> {
    select_crop_region_with(
        image,
        target_width,
        target_height,
        &SelectorOptions::default(),
    )
}

/// Select the crop rectangle with the highest aggregate importance.
///
/// The rectangle is exactly `target_width x target_height` when the target
/// fits inside the image. Otherwise it is the largest rectangle with the
/// target's aspect ratio that fits (see [`crop_size`]); a target larger than
/// the image in both directions with a matching aspect selects the whole
/// image.
///
/// Candidates sit on a grid with `options.search_step` spacing plus the far
/// edge of each axis. Ties in importance go to the candidate whose center is
/// closest to the image center, then to the first candidate in row-major
/// order.
pub fn select_crop_region_with(
    image: &DecodedImage,
    target_width: u32,
    target_height: u32,
    options: &SelectorOptions,
) -> Result<CropRect, RegionError> {
    let expected = image.width as usize * image.height as usize * 3;
    if image.pixels.len() != expected {
        return Err(RegionError::MalformedRaster {
            expected,
            actual: image.pixels.len(),
        });
    }

    let (crop_w, crop_h) = crop_size(image.width, image.height, target_width, target_height)?;
    if crop_w == image.width && crop_h == image.height {
        return Ok(CropRect::full(image.width, image.height));
    }

    let map = ImportanceMap::compute(image, options);
    let xs = candidate_offsets(image.width - crop_w, options.search_step);
    let ys = candidate_offsets(image.height - crop_h, options.search_step);

    let mut best: Option<(u64, u64, CropRect)> = None;
    for &y in &ys {
        for &x in &xs {
            let rect = CropRect::new(x, y, crop_w, crop_h);
            let score = map.score(rect);
            let distance = center_distance(rect, image.width, image.height);

            let better = match best {
                None => true,
                Some((best_score, best_distance, _)) => {
                    score > best_score || (score == best_score && distance < best_distance)
                }
            };
            if better {
                best = Some((score, distance, rect));
            }
        }
    }

    // Both offset lists always hold at least 0.
    best.map(|(_, _, rect)| rect)
        .ok_or(RegionError::AspectUnsatisfiable {
            target_width,
            target_height,
            image_width: image.width,
            image_height: image.height,
        })
}

/// Dimensions of the crop for a target on a `src_w x src_h` image.
///
/// A target that fits is used as-is. A target that does not fit is scaled
/// down to the largest same-aspect rectangle inside the image, rounding the
/// free dimension to the nearest pixel.
pub fn crop_size(
    src_w: u32,
    src_h: u32,
    target_w: u32,
    target_h: u32,
) -> Result<(u32, u32), RegionError> {
    if src_w == 0 || src_h == 0 {
        return Err(RegionError::EmptyImage {
            width: src_w,
            height: src_h,
        });
    }
    if target_w == 0 || target_h == 0 {
        return Err(RegionError::EmptyTarget {
            width: target_w,
            height: target_h,
        });
    }
    if target_w <= src_w && target_h <= src_h {
        return Ok((target_w, target_h));
    }

    let (sw, sh, tw, th) = (src_w as u64, src_h as u64, target_w as u64, target_h as u64);
    let (w, h) = if sw * th <= sh * tw {
        (sw, div_round(sw * th, tw).min(sh))
    } else {
        (div_round(sh * tw, th).min(sw), sh)
    };

    if w == 0 || h == 0 {
        return Err(RegionError::AspectUnsatisfiable {
            target_width: target_w,
            target_height: target_h,
            image_width: src_w,
            image_height: src_h,
        });
    }
    // Both are bounded by the source dimensions
    Ok((w as u32, h as u32))
}

#[inline]
fn div_round(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// `0, step, 2*step, ...` up to `slack`, always ending at `slack`.
fn candidate_offsets(slack: u32, step: u32) -> Vec<u32> {
    let mut offsets: Vec<u32> = (0..=slack).step_by(step.max(1) as usize).collect();
    if offsets.last() != Some(&slack) {
        offsets.push(slack);
    }
    offsets
}

/// Squared distance between rectangle and image centers, in half pixels.
fn center_distance(rect: CropRect, width: u32, height: u32) -> u64 {
    let dx = 2 * rect.x as i64 + rect.width as i64 - width as i64;
    let dy = 2 * rect.y as i64 + rect.height as i64 - height as i64;
    (dx * dx + dy * dy) as u64
}


// ============================================================================
// Property-Based Tests
// ============================================================================
