use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    consts::DEFAULT_IOU_THRESHOLD,
    nms::{BoundingBox, locality_aware_nms, standard_nms},
};

/// Which suppression strategy to run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum NmsMethod {
    /// Greedy suppression by descending score.
    Standard,
    /// Row-wise weighted merge followed by greedy suppression.
    #[default]
    LocalityAware,
}

impl NmsMethod {
    /// Runs the strategy over `boxes`.
    ///
    /// Unlike [`locality_aware_nms`], an empty input is accepted and yields an empty output.
    pub fn apply(self, boxes: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
        if boxes.is_empty() {
            return boxes;
        }

        match self {
            NmsMethod::Standard => standard_nms(boxes, iou_threshold),
            NmsMethod::LocalityAware => locality_aware_nms(boxes, iou_threshold),
        }
    }
}

/// Configuration for merging candidate quadrilaterals
///
/// # Example
/// ```
/// use lanms_core::{NmsConfigBuilder, NmsMethod};
/// let config = NmsConfigBuilder::default()
///     .method(NmsMethod::Standard)
///     .iou_threshold(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.iou_threshold, 0.5);
///
/// assert!(NmsConfigBuilder::default().iou_threshold(1.5).build().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct NmsConfig {
    /// Suppression strategy
    ///
    /// Default: [`NmsMethod::LocalityAware`]
    pub method: NmsMethod,

    /// IoU threshold for merging and suppression (0.0 to 1.0, inclusive)
    ///
    /// Two boxes whose IoU is at least this value are treated as one detection.
    ///
    /// Default: 0.3
    pub iou_threshold: f32,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            method: NmsMethod::default(),
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}

impl NmsConfig {
    pub fn apply(&self, boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
        self.method.apply(boxes, self.iou_threshold)
    }
}

impl NmsConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.iou_threshold {
            Some(threshold) if !(0.0..=1.0).contains(&threshold) => Err(format!(
                "iou_threshold must be in [0, 1], got {threshold}"
            )),
            _ => Ok(()),
        }
    }
}
