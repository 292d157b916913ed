//! Grape leaf disease classification with a leaf-plausibility gate.

pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod remedy;
pub mod server;
pub mod types;

pub use error::{ClassifyError, ConfigError, DecodeError};
pub use gate::{LeafGate, LeafVocabulary};
pub use model::{DiseaseClassifier, GeneralClassifier};
pub use pipeline::{Pipeline, PipelineSettings};
pub use remedy::RemedyTable;
pub use types::{ClassificationOutcome, DiseaseClass, Image, LabelPrediction, RejectReason};
