//! Convex polygon primitives used to score overlap between oriented boxes.
//!
//! All routines assume polygons that are
//! - ordered clockwise (in image coordinates, y pointing down),
//! - convex,
//! - free of runs of more than two collinear vertices,
//! - made of at least three vertices.
//!
//! Only the vertex count is checked; the other properties are caller contracts.

use glam::Vec2;

/// An ordered list of vertices. Clipping may produce an empty polygon.
pub type Polygon = Vec<Vec2>;

/// Calculates the area of a polygon with the shoelace formula.
///
/// The result is always non-negative, so the winding direction does not matter.
///
/// # Example
/// ```
/// use glam::Vec2;
/// use lanms_core::geometry::polygon_area;
/// let square = [
///     Vec2::new(0.0, 0.0),
///     Vec2::new(10.0, 0.0),
///     Vec2::new(10.0, 10.0),
///     Vec2::new(0.0, 10.0),
/// ];
/// assert_eq!(polygon_area(&square), 100.0);
/// ```
pub fn polygon_area(polygon: &[Vec2]) -> f32 {
    let n = polygon.len();
    let twice_area: f32 = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            polygon[i].x * polygon[j].y - polygon[j].x * polygon[i].y
        })
        .sum();

    (twice_area / 2.0).abs()
}

/// Computes the intersection of the segment `p1 -> p2` with the infinite line through `v1 -> v2`.
///
/// When the segment and the line are parallel the denominator vanishes and the
/// components come out as `inf` or `NaN`. Clipping only calls this for segments
/// whose endpoints straddle the line, where that cannot happen.
pub fn compute_intersection(p1: Vec2, p2: Vec2, v1: Vec2, v2: Vec2) -> Vec2 {
    let dc = v1 - v2;
    let dp = p2 - p1;
    let n1 = v1.x * v2.y - v1.y * v2.x;
    let n2 = p2.x * p1.y - p2.y * p1.x;
    let n3 = 1.0 / (dc.x * dp.y - dc.y * dp.x);

    Vec2::new((n1 * dp.x - n2 * dc.x) * n3, (n1 * dp.y - n2 * dc.y) * n3)
}

/// Returns whether `p` lies strictly on the interior (right) side of the directed edge `v1 -> v2`.
pub fn inside_edge(p: Vec2, v1: Vec2, v2: Vec2) -> bool {
    (v2.x - v1.x) * (p.y - v1.y) > (v2.y - v1.y) * (p.x - v1.x)
}

/// Clips `subject` against the convex `clip` polygon (Sutherland–Hodgman).
///
/// The subject is clipped against each edge of `clip` in turn, the output of one
/// edge feeding the next. The result is the convex intersection region, or an
/// empty polygon when the two do not overlap.
///
/// # Panics
/// Panics if either polygon has fewer than three vertices.
pub fn polygon_intersection(subject: &[Vec2], clip: &[Vec2]) -> Polygon {
    assert!(
        subject.len() >= 3 && clip.len() >= 3,
        "polygons need at least 3 vertices, got {} and {}",
        subject.len(),
        clip.len()
    );

    let mut output: Polygon = subject.to_vec();

    for i in 0..clip.len() {
        let v1 = clip[i];
        let v2 = clip[(i + 1) % clip.len()];

        let input = std::mem::take(&mut output);
        let n = input.len();

        for k in 0..n {
            let current = input[k];
            let prev = input[(k + n - 1) % n];

            match (inside_edge(current, v1, v2), inside_edge(prev, v1, v2)) {
                (true, true) => output.push(current),
                (true, false) => {
                    output.push(compute_intersection(prev, current, v1, v2));
                    output.push(current);
                }
                (false, true) => output.push(compute_intersection(prev, current, v1, v2)),
                (false, false) => {}
            }
        }
    }

    output
}

/// Ratio of the intersection area to the union area of two convex polygons.
///
/// Two zero-area polygons give `0 / 0 = NaN`. That value is left as is: any
/// threshold comparison against it is false.
pub fn intersection_over_union(a: &[Vec2], b: &[Vec2]) -> f32 {
    let intersection_area = polygon_area(&polygon_intersection(a, b));
    let union_area = polygon_area(a) + polygon_area(b) - intersection_area;

    intersection_area / union_area
}
