use std::collections::HashMap;

use crate::{error::ConfigError, types::DiseaseClass};

/// Treatment text per disease class.
#[derive(Debug, Clone, PartialEq)]
pub struct RemedyTable {
    entries: HashMap<DiseaseClass, String>,
}

impl Default for RemedyTable {
    fn default() -> Self {
        Self::from_entries([
            (
                DiseaseClass::BlackRot,
                "Remove infected leaves and apply fungicide like Mancozeb.",
            ),
            (
                DiseaseClass::Esca,
                "Prune affected vines and avoid overwatering.",
            ),
            (
                DiseaseClass::LeafBlight,
                "Use copper-based fungicides and ensure proper air circulation.",
            ),
            (
                DiseaseClass::Healthy,
                "No disease detected. Maintain regular vineyard monitoring.",
            ),
        ])
    }
}

impl RemedyTable {
    /// Not checked for totality; call [`RemedyTable::ensure_total`].
    pub fn from_entries<S: Into<String>>(
        entries: impl IntoIterator<Item = (DiseaseClass, S)>,
    ) -> Self {
        Self {
            entries: entries.into_iter().map(|(c, s)| (c, s.into())).collect(),
        }
    }

    /// Keys are class labels such as `"Black Rot"`. Unknown labels fail;
    /// classes left out keep their default remedy.
    pub fn with_overrides(
        mut self,
        overrides: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        for (label, text) in overrides {
            let class = DiseaseClass::from_label(label)
                .ok_or_else(|| ConfigError::UnknownClass(label.clone()))?;
            self.entries.insert(class, text.clone());
        }
        Ok(self)
    }

    pub fn lookup(&self, class: DiseaseClass) -> Result<&str, ConfigError> {
        self.entries
            .get(&class)
            .map(String::as_str)
            .ok_or(ConfigError::MissingRemedy(class))
    }

    pub fn ensure_total(&self) -> Result<(), ConfigError> {
        for class in DiseaseClass::ALL {
            self.lookup(class)?;
        }
        Ok(())
    }
}
