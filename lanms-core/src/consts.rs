/// Number of vertices of every candidate quadrilateral.
///
/// Detection heads emit one oriented box per candidate as four corners, ordered
/// clockwise and starting from the same visual corner for every candidate.
pub const QUAD_VERTICES: usize = 4;

/// Number of coordinates per vertex (x, y).
pub const POINT_DIMS: usize = 2;

/// Default IoU threshold for merging and suppressing candidates.
///
/// Two candidates whose IoU is greater than or equal to this value are
/// considered the same detection. The value 0.3 is the one used with
/// EAST-style text detectors:
/// - Lower values (0.1-0.2): merge loosely overlapping words into one line
/// - Higher values (0.5-0.7): keep neighbouring words apart
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

/// Number of remaining candidates above which the suppression scan of
/// standard NMS runs on the rayon thread pool.
///
/// Below this size, spawning work costs more than the IoU checks themselves.
pub const PARALLEL_SCAN_MIN_CANDIDATES: usize = 1024;
