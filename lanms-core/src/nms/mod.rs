pub mod bbox;
pub mod suppress;

pub use bbox::BoundingBox;
pub use suppress::{locality_aware_nms, standard_nms};
