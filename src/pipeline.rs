//! Two-stage decision: leaf gate, then disease classification above a
//! confidence floor. Every per-request failure ends here as a rejection.

use crate::{
    gate::LeafGate,
    model::{DiseaseClassifier, GeneralClassifier},
    remedy::RemedyTable,
    types::{ClassificationOutcome, DiseaseClass, Image, RejectReason},
};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 75.0;
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub confidence_threshold: f32, // percent
    pub top_k: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Index and value of the maximum. The first index reaching the maximum
/// wins; NaN entries never do.
pub fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in probs.iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| p > b) {
            best = Some((i, p));
        }
    }
    best
}

/// `100 * p`, rounded to two decimals.
pub fn confidence_percent(p: f32) -> f32 {
    (p * 10_000.0).round() / 100.0
}

pub struct Pipeline {
    general: Box<dyn GeneralClassifier>,
    disease: Box<dyn DiseaseClassifier>,
    gate: LeafGate,
    remedies: RemedyTable,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        general: Box<dyn GeneralClassifier>,
        disease: Box<dyn DiseaseClassifier>,
        gate: LeafGate,
        remedies: RemedyTable,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            general,
            disease,
            gate,
            remedies,
            settings,
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    pub fn gate(&self) -> &LeafGate {
        &self.gate
    }

    /// Fail-closed: an adapter error counts as a gate failure.
    pub fn passes_gate(&self, image: &Image) -> bool {
        let predictions = match self.general.classify_general(image, self.settings.top_k) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("general classifier failed: {}", e);
                return false;
            }
        };
        for p in &predictions {
            tracing::debug!("general: {} ({:.2}%)", p.label, p.probability * 100.0);
        }

        match self.gate.find_match(&predictions) {
            Some((label, keyword)) => {
                tracing::info!(
                    "leaf gate passed: label={:?} keyword={:?} vocab={}",
                    label,
                    keyword,
                    self.gate.version()
                );
                true
            }
            None => {
                tracing::info!(
                    "leaf gate rejected: no keyword in top-{} vocab={}",
                    predictions.len(),
                    self.gate.version()
                );
                false
            }
        }
    }

    pub fn evaluate(&self, image: &Image) -> ClassificationOutcome {
        let outcome = self.decide(image);
        match &outcome {
            ClassificationOutcome::Rejected { reason } => {
                tracing::info!("rejected file={:?}: {}", image.filename, reason)
            }
            ClassificationOutcome::Classified {
                disease,
                confidence,
                ..
            } => tracing::info!(
                "classified file={:?}: {} ({:.2}%)",
                image.filename,
                disease,
                confidence
            ),
        }
        outcome
    }

    fn decide(&self, image: &Image) -> ClassificationOutcome {
        if !self.passes_gate(image) {
            return ClassificationOutcome::rejected(RejectReason::NotALeaf);
        }

        let probs = match self.disease.classify_disease(image) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("disease classifier failed: {}", e);
                return ClassificationOutcome::rejected(RejectReason::Unprocessable);
            }
        };
        if probs.len() != DiseaseClass::ALL.len() {
            tracing::warn!(
                "disease vector has {} entries, expected {}",
                probs.len(),
                DiseaseClass::ALL.len()
            );
            return ClassificationOutcome::rejected(RejectReason::Unprocessable);
        }

        let Some((index, p)) = argmax(&probs) else {
            tracing::warn!("disease vector has no finite maximum: {:?}", probs);
            return ClassificationOutcome::rejected(RejectReason::Unprocessable);
        };
        let confidence = confidence_percent(p);
        if confidence < self.settings.confidence_threshold {
            tracing::debug!(
                "confidence {:.2} below threshold {:.2}",
                confidence,
                self.settings.confidence_threshold
            );
            return ClassificationOutcome::rejected(RejectReason::LowConfidence);
        }

        // Length was checked against ALL above.
        let Some(disease) = DiseaseClass::from_index(index) else {
            return ClassificationOutcome::rejected(RejectReason::Unprocessable);
        };
        match self.remedies.lookup(disease) {
            Ok(remedy) => ClassificationOutcome::Classified {
                disease,
                confidence,
                remedy: remedy.to_string(),
            },
            Err(e) => {
                tracing::error!("{}", e);
                ClassificationOutcome::rejected(RejectReason::UnhandledClass)
            }
        }
    }
}
