use serde::{Deserialize, Serialize};
use std::{fmt, io::Cursor, sync::Arc};

use crate::error::DecodeError;

// ---------- Image ----------

/// Uploaded image bytes. Cheap to clone, never mutated.
#[derive(Debug, Clone)]
pub struct Image {
    bytes: Arc<[u8]>,
    pub filename: Option<String>,
}

impl Image {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width and height from the header, without decoding pixel data.
    pub fn declared_dimensions(&self) -> Result<(u32, u32), DecodeError> {
        let reader = image::ImageReader::new(Cursor::new(self.bytes()))
            .with_guessed_format()
            .map_err(image::ImageError::from)?;
        Ok(reader.into_dimensions()?)
    }
}

// ---------- Predictions ----------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPrediction {
    pub label: String,
    pub probability: f32, // 0.0..=1.0
}

impl LabelPrediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Disease classes in the order of the model's output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseClass {
    #[serde(rename = "Black Rot")]
    BlackRot,
    #[serde(rename = "Esca (Black Measles)")]
    Esca,
    #[serde(rename = "Leaf Blight")]
    LeafBlight,
    #[serde(rename = "Healthy")]
    Healthy,
}

impl DiseaseClass {
    /// Index i matches output i of the disease model.
    pub const ALL: [DiseaseClass; 4] = [
        DiseaseClass::BlackRot,
        DiseaseClass::Esca,
        DiseaseClass::LeafBlight,
        DiseaseClass::Healthy,
    ];

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            DiseaseClass::BlackRot => "Black Rot",
            DiseaseClass::Esca => "Esca (Black Measles)",
            DiseaseClass::LeafBlight => "Leaf Blight",
            DiseaseClass::Healthy => "Healthy",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for DiseaseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------- Outcome ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    #[serde(rename = "not a plausible leaf image")]
    NotALeaf,
    #[serde(rename = "image could not be processed")]
    Unprocessable,
    #[serde(rename = "low-confidence disease prediction")]
    LowConfidence,
    #[serde(rename = "disease class has no remedy configured")]
    UnhandledClass,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::NotALeaf => "not a plausible leaf image",
            RejectReason::Unprocessable => "image could not be processed",
            RejectReason::LowConfidence => "low-confidence disease prediction",
            RejectReason::UnhandledClass => "disease class has no remedy configured",
        }
    }

    /// Text shown to the person who uploaded the image.
    pub fn user_message(self) -> &'static str {
        match self {
            RejectReason::NotALeaf => {
                "This image doesn't seem to contain a grape leaf. Please upload a clear leaf image."
            }
            RejectReason::LowConfidence => {
                "This image doesn't appear to be a grape leaf. Please upload a clear leaf image."
            }
            RejectReason::Unprocessable | RejectReason::UnhandledClass => {
                "Error processing image. Please upload a valid image."
            }
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    Rejected {
        reason: RejectReason,
    },
    Classified {
        disease: DiseaseClass,
        confidence: f32, // percent, two decimals
        remedy: String,
    },
}

impl ClassificationOutcome {
    pub fn rejected(reason: RejectReason) -> Self {
        ClassificationOutcome::Rejected { reason }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            ClassificationOutcome::Rejected { reason } => Some(*reason),
            ClassificationOutcome::Classified { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ClassificationOutcome::Rejected { reason } => reason.user_message().to_string(),
            ClassificationOutcome::Classified {
                disease,
                confidence,
                ..
            } => format!("{} ({:.2}%)", disease, confidence),
        }
    }
}
