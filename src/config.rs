use serde::Deserialize;
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    error::ConfigError,
    gate::LeafVocabulary,
    pipeline::PipelineSettings,
    remedy::RemedyTable,
};

/// Optional JSON file named by `PIPELINE_CONFIG`. Absent fields keep defaults.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub confidence_threshold: Option<f32>,
    pub top_k: Option<usize>,
    pub leaf_vocabulary: Option<LeafVocabulary>,
    pub remedies: HashMap<String, String>, // class label -> remedy text
}

impl PipelineConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        Self::load_str(&data).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }

    pub fn load_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub general_model_path: PathBuf,
    pub general_labels_path: PathBuf,
    pub disease_model_path: PathBuf,
    pub port: u16,
    pub pipeline: PipelineSettings,
    pub vocabulary: LeafVocabulary,
    pub remedies: RemedyTable,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let get = |k: &str| std::env::var(k).ok();
        let file = match get("PIPELINE_CONFIG") {
            Some(path) => PipelineConfig::load(&path)?,
            None => PipelineConfig::default(),
        };
        Self::resolve(get, file)
    }

    /// Environment values (via `get`) take precedence over the file.
    pub fn resolve(
        get: impl Fn(&str) -> Option<String>,
        file: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            get(name)
                .map(PathBuf::from)
                .ok_or(ConfigError::MissingVar { name })
        };

        let port = parse_var(&get, "PORT")?.unwrap_or(8080);
        let confidence_threshold = parse_var(&get, "CONFIDENCE_THRESHOLD")?
            .or(file.confidence_threshold)
            .unwrap_or(PipelineSettings::default().confidence_threshold);
        let top_k = parse_var(&get, "TOP_K")?
            .or(file.top_k)
            .unwrap_or(PipelineSettings::default().top_k);

        if !(0.0..=100.0).contains(&confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                name: "CONFIDENCE_THRESHOLD",
                value: confidence_threshold.to_string(),
                reason: "must be a percentage between 0 and 100",
            });
        }
        if top_k == 0 {
            return Err(ConfigError::InvalidValue {
                name: "TOP_K",
                value: top_k.to_string(),
                reason: "must be at least 1",
            });
        }

        let remedies = RemedyTable::default().with_overrides(&file.remedies)?;
        remedies.ensure_total()?;

        Ok(Self {
            general_model_path: required("GENERAL_MODEL_PATH")?,
            general_labels_path: required("GENERAL_LABELS_PATH")?,
            disease_model_path: required("DISEASE_MODEL_PATH")?,
            port,
            pipeline: PipelineSettings {
                confidence_threshold,
                top_k,
            },
            vocabulary: file.leaf_vocabulary.unwrap_or_default(),
            remedies,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match get(name) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name,
                value: s,
                reason: "could not be parsed",
            }),
    }
}
