use std::path::PathBuf;

use thiserror::Error;

use crate::types::DiseaseClass;

/// Raised when uploaded bytes are not a usable image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image could not be decoded: {0}")]
    Image(#[from] image::ImageError),
    #[error("image has zero area ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Deployment misconfiguration. Fatal at startup; at request time a missing
/// remedy degrades to a rejection instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: tch::TchError,
    },
    #[error("unexpected output shape from {path}: {shape:?}, expected [1, {expected}]")]
    ModelShape {
        path: PathBuf,
        shape: Vec<i64>,
        expected: usize,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("labels file {0} is empty")]
    NoLabels(PathBuf),
    #[error("{name} is not set")]
    MissingVar { name: &'static str },
    #[error("{name}={value:?} is not valid: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("leaf vocabulary {0} has no keywords")]
    EmptyVocabulary(String),
    #[error("unknown disease class {0:?} in remedy table")]
    UnknownClass(String),
    #[error("no remedy configured for {0}")]
    MissingRemedy(DiseaseClass),
}

/// Per-request adapter failure. The pipeline turns every variant into a
/// rejection.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<tch::TchError> for ClassifyError {
    fn from(e: tch::TchError) -> Self {
        ClassifyError::Inference(e.to_string())
    }
}
