use snafu::prelude::*;

use crate::config::NmsConfigBuilderError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LanmsError {
    #[snafu(display("iou_threshold must be in [0, 1], got {}", value))]
    InvalidThreshold { value: f32 },
    #[snafu(display("vertices must be shape (?, 4, 2), got {:?}", shape))]
    VertexShape { shape: Vec<usize> },
    #[snafu(display("probs must be shape (?, 1), got {:?}", shape))]
    ScoreShape { shape: Vec<usize> },
    #[snafu(display("Got {} quadrilaterals but {} scores", vertices, scores))]
    CountMismatch { vertices: usize, scores: usize },
    #[snafu(display("Ndarray Shape error at stage `{}`: {}", stage, source))]
    Shape {
        source: ndarray::ShapeError,
        stage: String,
    },
    #[snafu(display("Build NMS config error: {}", source))]
    Config { source: NmsConfigBuilderError },
    #[snafu(display("Read `{}` error: {}", path, source))]
    IoRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Write `{}` error: {}", path, source))]
    IoWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Json `{}` error: {}", stage, source))]
    Json {
        source: serde_json::Error,
        stage: String,
    },
}
