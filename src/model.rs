use std::{
    fs,
    path::{Path, PathBuf},
};
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::{
    error::{ClassifyError, ConfigError},
    preprocess::{self, InputSpec, PixelTensor, DISEASE_INPUT, GENERAL_INPUT},
    types::{DiseaseClass, Image, LabelPrediction},
};

// ---------- Adapter seams ----------

/// Pretrained general-purpose classifier (ImageNet-style label set).
pub trait GeneralClassifier: Send + Sync {
    /// Top `top_k` labels, highest probability first.
    fn classify_general(
        &self,
        image: &Image,
        top_k: usize,
    ) -> Result<Vec<LabelPrediction>, ClassifyError>;
}

/// Grape disease classifier.
pub trait DiseaseClassifier: Send + Sync {
    /// One probability per [`DiseaseClass::ALL`] entry, in that order.
    fn classify_disease(&self, image: &Image) -> Result<Vec<f32>, ClassifyError>;
}

// ---------- Output helpers ----------

/// Passes a distribution through unchanged, otherwise treats the values as
/// logits and applies softmax.
pub fn to_probabilities(mut v: Vec<f32>) -> Result<Vec<f32>, ClassifyError> {
    if v.is_empty() {
        return Err(ClassifyError::Inference("empty model output".into()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(ClassifyError::Inference("non-finite model output".into()));
    }
    let sum: f32 = v.iter().sum();
    if v.iter().all(|&x| x >= 0.0) && (sum - 1.0).abs() <= 1e-3 {
        return Ok(v);
    }

    let max = v.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut total = 0.0;
    for x in v.iter_mut() {
        *x = (*x - max).exp();
        total += *x;
    }
    for x in v.iter_mut() {
        *x /= total;
    }
    Ok(v)
}

/// Highest `k` entries, descending. Ties keep the lower index first.
pub fn top_k(probs: &[f32], labels: &[String], k: usize) -> Vec<LabelPrediction> {
    let mut idx: Vec<usize> = (0..probs.len().min(labels.len())).collect();
    idx.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));
    idx.into_iter()
        .take(k)
        .map(|i| LabelPrediction::new(labels[i].clone(), probs[i]))
        .collect()
}

/// Accepts plain labels or synset lines such as `n02085620 Chihuahua`;
/// keeps the first comma-separated name and turns `_` into spaces.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            let l = match l.split_once(' ') {
                Some((id, rest)) if is_synset_id(id) => rest,
                _ => l,
            };
            let name = l.split(',').next().unwrap_or(l).trim();
            name.replace('_', " ")
        })
        .collect()
}

fn is_synset_id(s: &str) -> bool {
    s.len() == 9 && s.starts_with('n') && s[1..].bytes().all(|b| b.is_ascii_digit())
}

// ---------- TorchScript backend ----------

struct TorchModule {
    module: CModule,
    device: Device,
    path: PathBuf,
    input: InputSpec,
}

impl TorchModule {
    /// Loads the module and probes it with a zero input; the output must be
    /// `[1, n_out]`.
    fn load(path: &Path, input: InputSpec, n_out: usize) -> Result<Self, ConfigError> {
        let device = Device::Cpu;
        let module = CModule::load_on_device(path, device).map_err(|source| {
            ConfigError::ModelLoad {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let s = input.size as i64;
        let dummy = Tensor::zeros([1, 3, s, s], (Kind::Float, device));
        let out = tch::no_grad(|| module.forward_ts(&[dummy])).map_err(|source| {
            ConfigError::ModelLoad {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let sz = out.size();
        if sz.len() != 2 || sz[0] != 1 || sz[1] != n_out as i64 {
            return Err(ConfigError::ModelShape {
                path: path.to_path_buf(),
                shape: sz,
                expected: n_out,
            });
        }

        Ok(Self {
            module,
            device,
            path: path.to_path_buf(),
            input,
        })
    }

    fn forward(&self, pixels: &PixelTensor) -> Result<Vec<f32>, ClassifyError> {
        debug_assert_eq!(pixels.size, self.input.size);
        let input = Tensor::from_slice(pixels.data.as_slice())
            .reshape(pixels.shape())
            .to_device(self.device);

        let out = tch::no_grad(|| self.module.forward_ts(&[input]))?;
        let flat = out.to_kind(Kind::Float).view([-1i64]);
        let raw = Vec::<f32>::try_from(&flat)?;
        to_probabilities(raw)
    }
}

pub struct TorchGeneralClassifier {
    inner: TorchModule,
    labels: Vec<String>,
}

impl TorchGeneralClassifier {
    pub fn load(model_path: &Path, labels_path: &Path) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(labels_path).map_err(|source| ConfigError::Read {
            path: labels_path.to_path_buf(),
            source,
        })?;
        let labels = parse_labels(&txt);
        if labels.is_empty() {
            return Err(ConfigError::NoLabels(labels_path.to_path_buf()));
        }

        let inner = TorchModule::load(model_path, GENERAL_INPUT, labels.len())?;
        tracing::info!(
            "loaded general classifier {} ({} labels)",
            inner.path.display(),
            labels.len()
        );
        Ok(Self { inner, labels })
    }
}

impl GeneralClassifier for TorchGeneralClassifier {
    fn classify_general(
        &self,
        image: &Image,
        top_k_n: usize,
    ) -> Result<Vec<LabelPrediction>, ClassifyError> {
        let pixels = preprocess::for_general(image)?;
        let probs = self.inner.forward(&pixels)?;
        Ok(top_k(&probs, &self.labels, top_k_n))
    }
}

pub struct TorchDiseaseClassifier {
    inner: TorchModule,
}

impl TorchDiseaseClassifier {
    pub fn load(model_path: &Path) -> Result<Self, ConfigError> {
        let inner = TorchModule::load(model_path, DISEASE_INPUT, DiseaseClass::ALL.len())?;
        tracing::info!("loaded disease classifier {}", inner.path.display());
        Ok(Self { inner })
    }
}

impl DiseaseClassifier for TorchDiseaseClassifier {
    fn classify_disease(&self, image: &Image) -> Result<Vec<f32>, ClassifyError> {
        let pixels = preprocess::for_disease(image)?;
        self.inner.forward(&pixels)
    }
}
