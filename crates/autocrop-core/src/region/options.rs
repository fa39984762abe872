//! Tuning knobs for content-aware region selection.

use serde::{Deserialize, Serialize};

/// Weights and thresholds of the importance heuristic.
///
/// The defaults follow the smartcrop heuristics: edge detail is the base
/// signal, skin-toned and saturated pixels add importance in proportion to
/// the detail around them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorOptions {
    /// Distance in source pixels between neighbouring candidate origins.
    pub search_step: u32,
    /// Long-edge size of the downscaled copy the importance map is built on.
    /// 0 analyses the image at full resolution.
    pub analysis_max_edge: u32,

    pub detail_weight: f32,

    /// Reference skin tone (normalized RGB).
    pub skin_color: [f32; 3],
    pub skin_weight: f32,
    pub skin_bias: f32,
    /// Minimum skin likeness (0-1) before a pixel counts as skin.
    pub skin_threshold: f32,
    /// Luminance window (0-1) a skin pixel must fall in.
    pub skin_brightness: (f32, f32),

    pub saturation_weight: f32,
    pub saturation_bias: f32,
    /// Minimum HSL saturation (0-1) before a pixel counts as saturated.
    pub saturation_threshold: f32,
    /// Luminance window (0-1) a saturated pixel must fall in.
    pub saturation_brightness: (f32, f32),
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            search_step: 8,
            analysis_max_edge: 512,
            detail_weight: 0.2,
            skin_color: [0.78, 0.57, 0.44],
            skin_weight: 1.8,
            skin_bias: 0.01,
            skin_threshold: 0.8,
            skin_brightness: (0.2, 1.0),
            saturation_weight: 0.1,
            saturation_bias: 0.2,
            saturation_threshold: 0.4,
            saturation_brightness: (0.05, 0.9),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let options: SelectorOptions = serde_json::from_str(r#"{"search_step": 4}"#).unwrap();
        assert_eq!(options.search_step, 4);
        assert_eq!(options.analysis_max_edge, 512);
        assert_eq!(options.skin_color, [0.78, 0.57, 0.44]);
    }
}
