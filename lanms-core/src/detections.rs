//! JSON persistence of detections.
//!
//! The format is a plain array of boxes:
//! `[{"poly": [[x, y], [x, y], [x, y], [x, y]], "score": 0.9}, ...]`

use std::path::Path;

use snafu::ResultExt;
use tracing::*;

use crate::{error::*, nms::BoundingBox};

pub fn from_json(json: &str) -> Result<Vec<BoundingBox>, LanmsError> {
    serde_json::from_str(json).context(JsonSnafu { stage: "decode" })
}

pub fn to_json(boxes: &[BoundingBox]) -> Result<String, LanmsError> {
    serde_json::to_string_pretty(boxes).context(JsonSnafu { stage: "encode" })
}

pub fn load_detections(path: impl AsRef<Path>) -> Result<Vec<BoundingBox>, LanmsError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).context(IoReadSnafu {
        path: path.display().to_string(),
    })?;

    let boxes = from_json(&json)?;
    debug!("loaded {} detections from {}", boxes.len(), path.display());

    Ok(boxes)
}

pub fn save_detections(path: impl AsRef<Path>, boxes: &[BoundingBox]) -> Result<(), LanmsError> {
    let path = path.as_ref();
    let json = to_json(boxes)?;

    std::fs::write(path, json).context(IoWriteSnafu {
        path: path.display().to_string(),
    })?;
    debug!("saved {} detections to {}", boxes.len(), path.display());

    Ok(())
}
