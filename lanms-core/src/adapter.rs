//! Conversion between flat detector tensors and [`BoundingBox`] values.
//!
//! A detector emits `n` quadrilaterals as an `(n, 4, 2)` vertex tensor and their
//! confidences as an `(n, 1)` tensor. The merged result is returned as an
//! `(m, 4, 2)` vertex tensor and an `(m,)` score tensor.

use glam::Vec2;
use ndarray::{Array1, Array3, ArrayViewD, Ix2, Ix3};
use snafu::{ResultExt, ensure};
use tracing::*;

use crate::{
    config::{NmsConfig, NmsMethod},
    consts::{POINT_DIMS, QUAD_VERTICES},
    error::*,
    nms::BoundingBox,
};

/// Merged detections in tensor form.
#[derive(Debug, Clone, PartialEq)]
pub struct NmsOutput {
    /// `(m, 4, 2)` vertices
    pub vertices: Array3<f32>,
    /// `(m,)` scores
    pub scores: Array1<f32>,
}

impl NmsOutput {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Decodes `(n, 4, 2)` vertices and `(n, 1)` scores into boxes.
pub fn decode_boxes(
    vertices: ArrayViewD<'_, f32>,
    scores: ArrayViewD<'_, f32>,
) -> Result<Vec<BoundingBox>, LanmsError> {
    let vertices = vertices
        .into_dimensionality::<Ix3>()
        .context(ShapeSnafu { stage: "vertices" })?;
    let (n, corners, dims) = vertices.dim();
    ensure!(
        corners == QUAD_VERTICES && dims == POINT_DIMS,
        VertexShapeSnafu {
            shape: vertices.shape().to_vec()
        }
    );

    let scores = scores
        .into_dimensionality::<Ix2>()
        .context(ShapeSnafu { stage: "probs" })?;
    let (m, width) = scores.dim();
    ensure!(
        width == 1,
        ScoreShapeSnafu {
            shape: scores.shape().to_vec()
        }
    );
    ensure!(
        n == m,
        CountMismatchSnafu {
            vertices: n,
            scores: m
        }
    );

    let boxes = vertices
        .outer_iter()
        .zip(scores.outer_iter())
        .map(|(quad, score)| {
            BoundingBox::new(
                std::array::from_fn(|k| Vec2::new(quad[[k, 0]], quad[[k, 1]])),
                score[0],
            )
        })
        .collect();

    Ok(boxes)
}

/// Encodes boxes into `(m, 4, 2)` vertices and `(m,)` scores.
pub fn encode_boxes(boxes: &[BoundingBox]) -> Result<NmsOutput, LanmsError> {
    let flat: Vec<f32> = boxes
        .iter()
        .flat_map(|bbox| bbox.poly.iter().flat_map(|p| [p.x, p.y]))
        .collect();

    let vertices = Array3::from_shape_vec((boxes.len(), QUAD_VERTICES, POINT_DIMS), flat)
        .context(ShapeSnafu { stage: "encode" })?;
    let scores = boxes.iter().map(|bbox| bbox.score).collect::<Array1<f32>>();

    Ok(NmsOutput { vertices, scores })
}

/// Validates the inputs, runs the configured NMS and encodes the result.
///
/// An empty batch yields an empty output without running the merge.
#[tracing::instrument(skip_all, fields(method = ?config.method, iou_threshold = config.iou_threshold))]
pub fn run_nms(
    vertices: ArrayViewD<'_, f32>,
    scores: ArrayViewD<'_, f32>,
    config: &NmsConfig,
) -> Result<NmsOutput, LanmsError> {
    ensure!(
        (0.0..=1.0).contains(&config.iou_threshold),
        InvalidThresholdSnafu {
            value: config.iou_threshold
        }
    );

    let boxes = decode_boxes(vertices, scores)?;
    let candidates = boxes.len();

    if boxes.is_empty() {
        debug!("no candidates, skipping nms");
        return encode_boxes(&boxes);
    }

    let merged = config.apply(boxes);
    info!("nms kept {} of {} candidates", merged.len(), candidates);

    encode_boxes(&merged)
}

/// Locality-aware NMS over detector tensors.
///
/// # Example
/// ```
/// use ndarray::{Array2, Array3};
/// use lanms_core::adapter::locality_aware_nms_tensors;
/// let vertices = Array3::from_shape_vec(
///     (2, 4, 2),
///     vec![
///         0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0,
///         2.0, 0.0, 12.0, 0.0, 12.0, 10.0, 2.0, 10.0,
///     ],
/// )
/// .unwrap();
/// let probs = Array2::from_elem((2, 1), 1.0f32);
/// let output = locality_aware_nms_tensors(vertices.view().into_dyn(), probs.view().into_dyn(), 0.3).unwrap();
/// assert_eq!(output.len(), 1);
/// assert_eq!(output.scores[0], 2.0);
/// ```
pub fn locality_aware_nms_tensors(
    vertices: ArrayViewD<'_, f32>,
    scores: ArrayViewD<'_, f32>,
    iou_threshold: f32,
) -> Result<NmsOutput, LanmsError> {
    let config = NmsConfig {
        method: NmsMethod::LocalityAware,
        iou_threshold,
    };

    run_nms(vertices, scores, &config)
}
