use rayon::prelude::*;
use tracing::*;

use crate::consts::PARALLEL_SCAN_MIN_CANDIDATES;

use super::bbox::BoundingBox;

fn assert_threshold(iou_threshold: f32) {
    assert!(
        (0.0..=1.0).contains(&iou_threshold),
        "iou_threshold must be in [0, 1], got {iou_threshold}"
    );
}

/// Indices from `remaining` whose box does not merge with `boxes[kept]`, in their original order.
fn survivors(
    boxes: &[BoundingBox],
    kept: usize,
    remaining: &[usize],
    iou_threshold: f32,
) -> Vec<usize> {
    let kept = &boxes[kept];

    if remaining.len() >= PARALLEL_SCAN_MIN_CANDIDATES {
        remaining
            .par_iter()
            .copied()
            .filter(|&candidate| !kept.should_merge(&boxes[candidate], iou_threshold))
            .collect()
    } else {
        remaining
            .iter()
            .copied()
            .filter(|&candidate| !kept.should_merge(&boxes[candidate], iou_threshold))
            .collect()
    }
}

/// Greedy non-maximum suppression.
///
/// # Algorithm
///
/// 1. Sort candidates by score, highest first (ties keep their input order)
/// 2. Keep the best remaining candidate
/// 3. Drop every remaining candidate whose IoU with it reaches `iou_threshold`
/// 4. Repeat until no candidates remain
///
/// The kept boxes are returned unmodified, in the order they were selected.
///
/// # Panics
///
/// Panics if `iou_threshold` is not in `[0, 1]`.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use lanms_core::{BoundingBox, standard_nms};
/// let square = |x: f32, score: f32| BoundingBox::new(
///     [
///         Vec2::new(x, 0.0),
///         Vec2::new(x + 10.0, 0.0),
///         Vec2::new(x + 10.0, 10.0),
///         Vec2::new(x, 10.0),
///     ],
///     score,
/// );
/// let kept = standard_nms(vec![square(2.0, 0.9), square(0.0, 1.0)], 0.5);
/// assert_eq!(kept, vec![square(0.0, 1.0)]);
/// ```
#[tracing::instrument(level = "debug", skip(boxes), fields(candidates = boxes.len()))]
pub fn standard_nms(boxes: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    assert_threshold(iou_threshold);

    let mut candidates: Vec<usize> = (0..boxes.len()).collect();
    candidates.sort_by(|&i, &j| boxes[j].score.total_cmp(&boxes[i].score));

    let mut keep = Vec::new();
    while let Some(&current) = candidates.first() {
        keep.push(current);
        let remaining = survivors(&boxes, current, &candidates[1..], iou_threshold);
        candidates = remaining;
    }

    debug!("standard nms kept {} of {} boxes", keep.len(), boxes.len());

    keep.into_iter().map(|index| boxes[index]).collect()
}

/// Locality-aware NMS as described in EAST (<https://arxiv.org/abs/1704.03155>).
///
/// # Algorithm
///
/// 1. Sort the boxes row-wise, by their top-most y coordinate
/// 2. Walk the sorted boxes with a running accumulator: a box that merges with the
///    accumulator is folded into it with [`BoundingBox::weighted_merge`], any other
///    box flushes the accumulator and replaces it
/// 3. Run [`standard_nms`] over the folded boxes at the same threshold
///
/// Only row-adjacent boxes are folded. Two overlapping boxes separated by another
/// box in the sorted order are left to the final standard pass.
///
/// # Panics
///
/// Panics if `boxes` is empty or `iou_threshold` is not in `[0, 1]`.
#[tracing::instrument(level = "debug", skip(boxes), fields(candidates = boxes.len()))]
pub fn locality_aware_nms(mut boxes: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    assert_threshold(iou_threshold);

    boxes.sort_by(|a, b| a.min_y().total_cmp(&b.min_y()));

    let Some((&first, rest)) = boxes.split_first() else {
        panic!("locality-aware NMS needs at least one box");
    };

    let mut merged = Vec::new();
    let mut current = first;
    for candidate in rest {
        if current.should_merge(candidate, iou_threshold) {
            current = current.weighted_merge(candidate);
        } else {
            merged.push(current);
            current = *candidate;
        }
    }
    merged.push(current);

    debug!("folded {} boxes into {}", boxes.len(), merged.len());

    standard_nms(merged, iou_threshold)
}

#[cfg(test)]
mod tests {
    use glam::{Mat2, Vec2};

    use super::*;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32, score: f32) -> BoundingBox {
        BoundingBox::new(
            [
                Vec2::new(x0, y0),
                Vec2::new(x1, y0),
                Vec2::new(x1, y1),
                Vec2::new(x0, y1),
            ],
            score,
        )
    }

    fn translate(bbox: BoundingBox, offset: Vec2, score: f32) -> BoundingBox {
        BoundingBox::new(bbox.poly.map(|p| p + offset), score)
    }

    fn assert_box_close(expected: &BoundingBox, actual: &BoundingBox) {
        for (e, a) in expected.poly.iter().zip(actual.poly.iter()) {
            assert!(e.distance(*a) < 1e-3, "expected {expected:?}, got {actual:?}");
        }
        assert!((expected.score - actual.score).abs() < 1e-5);
    }

    #[test]
    fn test_standard_nms_empty_input() {
        assert!(standard_nms(Vec::new(), 0.5).is_empty());
    }

    #[test]
    fn test_standard_nms_single_box() {
        let b = rect(0.0, 0.0, 10.0, 10.0, 1.0);
        assert_eq!(standard_nms(vec![b], 0.5), vec![b]);
    }

    #[test]
    fn test_standard_nms_overlap() {
        let b1 = rect(0.0, 0.0, 10.0, 10.0, 1.0);
        let b2 = rect(2.0, 0.0, 12.0, 10.0, 0.9);

        // The higher score wins regardless of input order
        assert_eq!(standard_nms(vec![b1, b2], 0.5), vec![b1]);
        assert_eq!(standard_nms(vec![b2, b1], 0.5), vec![b1]);
    }

    #[test]
    fn test_standard_nms_no_overlap() {
        let b1 = rect(0.0, 0.0, 10.0, 10.0, 1.0);
        let b2 = rect(0.0, 20.0, 10.0, 30.0, 0.9);

        assert_eq!(standard_nms(vec![b2, b1], 0.5), vec![b1, b2]);
    }

    #[test]
    fn test_standard_nms_threshold_is_inclusive() {
        let b1 = rect(0.0, 0.0, 10.0, 10.0, 1.0);
        let b2 = rect(2.0, 0.0, 12.0, 10.0, 0.9);
        let iou = b1.iou(&b2);

        assert_eq!(standard_nms(vec![b1, b2], iou).len(), 1);
        assert_eq!(standard_nms(vec![b1, b2], (iou + 0.01).min(1.0)).len(), 2);
    }

    #[test]
    fn test_standard_nms_selection_order() {
        // b suppresses a, c survives and suppresses d
        let a = rect(0.0, 0.0, 10.0, 10.0, 0.8);
        let b = rect(1.0, 0.0, 11.0, 10.0, 0.95);
        let c = rect(100.0, 0.0, 110.0, 10.0, 0.7);
        let d = rect(100.0, 1.0, 110.0, 11.0, 0.6);

        assert_eq!(standard_nms(vec![a, c, d, b], 0.5), vec![b, c]);
    }

    #[test]
    fn test_standard_nms_ties_keep_input_order() {
        let b1 = rect(0.0, 0.0, 10.0, 10.0, 0.5);
        let b2 = rect(1.0, 0.0, 11.0, 10.0, 0.5);

        assert_eq!(standard_nms(vec![b2, b1], 0.5), vec![b2]);
        assert_eq!(standard_nms(vec![b1, b2], 0.5), vec![b1]);
    }

    #[test]
    fn test_standard_nms_chain_is_not_transitive() {
        // b overlaps both a and c, but a and c do not overlap each other.
        // Once b is suppressed by a, c survives.
        let a = rect(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = rect(4.0, 0.0, 14.0, 10.0, 0.9);
        let c = rect(8.0, 0.0, 18.0, 10.0, 0.8);

        assert_eq!(standard_nms(vec![c, b, a], 0.3), vec![a, c]);
    }

    #[test]
    fn test_standard_nms_parallel_scan_matches_sequential() {
        // A grid large enough to take the rayon path in the first rounds
        let mut boxes = Vec::new();
        for i in 0..PARALLEL_SCAN_MIN_CANDIDATES + 200 {
            let x = (i % 50) as f32 * 6.0;
            let y = (i / 50) as f32 * 6.0;
            let score = ((i * 7919) % 1000) as f32 / 1000.0;
            boxes.push(rect(x, y, x + 10.0, y + 10.0, score));
        }

        let parallel = standard_nms(boxes.clone(), 0.2);

        let mut order: Vec<usize> = (0..boxes.len()).collect();
        order.sort_by(|&i, &j| boxes[j].score.total_cmp(&boxes[i].score));
        let mut sequential: Vec<BoundingBox> = Vec::new();
        for i in order {
            if sequential.iter().all(|kept| !kept.should_merge(&boxes[i], 0.2)) {
                sequential.push(boxes[i]);
            }
        }

        assert_eq!(parallel, sequential);
    }

    #[test]
    #[should_panic(expected = "iou_threshold must be in [0, 1]")]
    fn test_standard_nms_rejects_threshold() {
        standard_nms(vec![rect(0.0, 0.0, 1.0, 1.0, 1.0)], 1.5);
    }

    #[test]
    fn test_locality_aware_nms_single_box() {
        let b = rect(0.0, 0.0, 10.0, 10.0, 0.7);
        assert_eq!(locality_aware_nms(vec![b], 0.3), vec![b]);
    }

    #[test]
    #[should_panic(expected = "at least one box")]
    fn test_locality_aware_nms_rejects_empty_input() {
        locality_aware_nms(Vec::new(), 0.3);
    }

    #[test]
    #[should_panic(expected = "iou_threshold must be in [0, 1]")]
    fn test_locality_aware_nms_rejects_nan_threshold() {
        locality_aware_nms(vec![rect(0.0, 0.0, 1.0, 1.0, 1.0)], f32::NAN);
    }

    #[test]
    fn test_locality_aware_nms_two_row_pairs() {
        let box1 = rect(50.0, 50.0, 150.0, 100.0, 1.0);
        let box2 = translate(box1, Vec2::new(10.0, 0.0), 1.0);
        let box3 = rect(50.0, 200.0, 150.0, 250.0, 1.0);
        let box4 = translate(box3, Vec2::new(10.0, 0.0), 1.0);

        let merged = locality_aware_nms(vec![box1, box2, box3, box4], 0.3);

        assert_eq!(
            merged,
            vec![
                rect(55.0, 50.0, 155.0, 100.0, 2.0),
                rect(55.0, 200.0, 155.0, 250.0, 2.0),
            ]
        );
    }

    #[test]
    fn test_locality_aware_nms_non_equal_weighted_merge() {
        let box1 = rect(50.0, 50.0, 150.0, 100.0, 0.7);
        let box2 = translate(box1, Vec2::new(10.0, 1.0), 0.8);
        let box3 = translate(box1, Vec2::new(15.0, 2.0), 0.9);

        // Given out of row order on purpose
        let merged = locality_aware_nms(vec![box3, box1, box2], 0.3);
        assert_eq!(merged.len(), 1);

        // Row order is box1, box2, box3, and merging folds left to right
        let mut expected = box1;
        for next in [box2, box3] {
            let score = expected.score + next.score;
            expected = BoundingBox::new(
                std::array::from_fn(|k| {
                    (expected.poly[k] * expected.score + next.poly[k] * next.score) / score
                }),
                score,
            );
        }

        assert_box_close(&expected, &merged[0]);
        assert!((merged[0].score - 2.4).abs() < 1e-5);
    }

    #[test]
    fn test_locality_aware_nms_commutes_with_rotation() {
        let box1 = rect(50.0, 50.0, 150.0, 100.0, 1.0);
        let box2 = translate(box1, Vec2::new(10.0, 0.0), 1.0);

        let rotation = Mat2::from_angle(std::f32::consts::PI / 8.0);
        let rotate = |b: BoundingBox| BoundingBox::new(b.poly.map(|p| rotation * p), b.score);

        let merged = locality_aware_nms(vec![box1, box2], 0.3);
        let merged_rotated = locality_aware_nms(vec![rotate(box1), rotate(box2)], 0.3);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged_rotated.len(), 1);
        assert_box_close(&rotate(merged[0]), &merged_rotated[0]);
        assert_eq!(merged_rotated[0].score, merged[0].score);
    }

    #[test]
    fn test_locality_aware_nms_row_sort_special_case() {
        // box3 sorts between box1 and box2, so the overlapping box1 and box2 are
        // not adjacent and are not folded. The final standard pass keeps box2,
        // the higher scoring one.
        let box1 = rect(50.0, 50.0, 150.0, 100.0, 0.8);
        let box2 = translate(box1, Vec2::new(10.0, 10.0), 0.9);
        let box3 = rect(250.0, 55.0, 350.0, 105.0, 1.0);

        let merged = locality_aware_nms(vec![box1, box2, box3], 0.3);

        assert_eq!(merged, vec![box3, box2]);
    }

    #[test]
    fn test_locality_aware_nms_fold_uses_accumulator() {
        // Each box overlaps the next one, so the whole row folds into one box
        let boxes: Vec<BoundingBox> = (0..4)
            .map(|i| rect(i as f32 * 2.0, i as f32, i as f32 * 2.0 + 20.0, i as f32 + 10.0, 1.0))
            .collect();

        let merged = locality_aware_nms(boxes, 0.3);

        assert_eq!(merged.len(), 1);
        assert!((merged[0].score - 4.0).abs() < 1e-5);
    }
}
