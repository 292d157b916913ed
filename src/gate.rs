use serde::Deserialize;

use crate::{error::ConfigError, types::LabelPrediction};

/// Versioned set of plant/foliage keywords the leaf gate matches against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeafVocabulary {
    pub version: String,
    pub keywords: Vec<String>,
}

impl Default for LeafVocabulary {
    fn default() -> Self {
        const KEYWORDS: [&str; 17] = [
            "leaf", "plant", "tree", "foliage", "flower", "vegetation", "herb", "shrub", "vine",
            "maize", "corn", "banana", "sunflower", "potato", "cabbage", "lettuce", "grape",
        ];
        Self {
            version: "v1".to_string(),
            keywords: KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Accepts an image when any top-K label contains any keyword
/// (case-insensitive substring). Probabilities are not consulted.
#[derive(Debug, Clone)]
pub struct LeafGate {
    version: String,
    keywords: Vec<String>, // lowercased
}

impl LeafGate {
    pub fn new(vocab: LeafVocabulary) -> Result<Self, ConfigError> {
        let keywords: Vec<String> = vocab
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(ConfigError::EmptyVocabulary(vocab.version));
        }
        Ok(Self {
            version: vocab.version,
            keywords,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// First keyword found in a prediction, with that prediction's label.
    pub fn find_match<'a>(
        &'a self,
        predictions: &'a [LabelPrediction],
    ) -> Option<(&'a str, &'a str)> {
        predictions.iter().find_map(|p| {
            let label = p.label.to_lowercase();
            self.keywords
                .iter()
                .find(|k| label.contains(k.as_str()))
                .map(|k| (p.label.as_str(), k.as_str()))
        })
    }

    pub fn is_leaf(&self, predictions: &[LabelPrediction]) -> bool {
        self.find_match(predictions).is_some()
    }
}
