pub mod adapter;
pub mod config;
pub mod consts;
pub mod detections;
pub mod error;
pub mod geometry;
pub mod nms;

// Re-export commonly used types
pub use config::{NmsConfig, NmsConfigBuilder, NmsMethod};
pub use error::LanmsError;
pub use nms::{BoundingBox, locality_aware_nms, standard_nms};
