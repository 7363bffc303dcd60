use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{consts::QUAD_VERTICES, geometry::intersection_over_union};

/// An oriented quadrilateral detection with its confidence score.
///
/// The vertices are ordered clockwise and every candidate is expected to start
/// from the same visual corner. [`BoundingBox::weighted_merge`] pairs vertices
/// by position and relies on that convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The four corners of the quadrilateral.
    pub poly: [Vec2; QUAD_VERTICES],
    /// The non-negative confidence of the detection.
    pub score: f32,
}

impl BoundingBox {
    /// Creates a new box from its four corners and a score.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use lanms_core::BoundingBox;
    /// let bbox = BoundingBox::new(
    ///     [
    ///         Vec2::new(0.0, 0.0),
    ///         Vec2::new(10.0, 0.0),
    ///         Vec2::new(10.0, 10.0),
    ///         Vec2::new(0.0, 10.0),
    ///     ],
    ///     0.9,
    /// );
    /// assert_eq!(bbox.min_y(), 0.0);
    /// ```
    pub fn new(poly: [Vec2; QUAD_VERTICES], score: f32) -> Self {
        Self { poly, score }
    }

    /// The smallest y coordinate of the four corners, i.e. the top of the box in image coordinates.
    ///
    /// Used as the row key of locality-aware NMS.
    pub fn min_y(&self) -> f32 {
        self.poly[1..]
            .iter()
            .fold(self.poly[0].y, |y_min, p| if p.y < y_min { p.y } else { y_min })
    }

    /// Intersection over union of the two quadrilaterals.
    pub fn iou(&self, other: &Self) -> f32 {
        intersection_over_union(&self.poly, &other.poly)
    }

    /// Returns whether `other` overlaps this box enough to be treated as the same detection.
    ///
    /// The threshold is inclusive. A `NaN` IoU never merges.
    pub fn should_merge(&self, other: &Self, iou_threshold: f32) -> bool {
        self.iou(other) >= iou_threshold
    }

    /// Merges two boxes into their score-weighted average, as described in the EAST paper.
    ///
    /// Vertex `k` of `self` is averaged with vertex `k` of `other`; no alignment
    /// of the starting corner is attempted. The scores are added, so a cluster of
    /// overlapping detections outweighs a lone detection in the final suppression.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use lanms_core::BoundingBox;
    /// let corners = |x: f32| [
    ///     Vec2::new(x, 0.0),
    ///     Vec2::new(x + 10.0, 0.0),
    ///     Vec2::new(x + 10.0, 10.0),
    ///     Vec2::new(x, 10.0),
    /// ];
    /// let merged = BoundingBox::new(corners(0.0), 1.0).weighted_merge(&BoundingBox::new(corners(4.0), 1.0));
    /// assert_eq!(merged.poly[0], Vec2::new(2.0, 0.0));
    /// assert_eq!(merged.score, 2.0);
    /// ```
    pub fn weighted_merge(&self, other: &Self) -> Self {
        let score = self.score + other.score;
        let poly = std::array::from_fn(|k| {
            (self.poly[k] * self.score + other.poly[k] * other.score) / score
        });

        Self { poly, score }
    }
}
