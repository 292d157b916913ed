//! Decoding and per-model input preparation.
//!
//! Each model was trained with its own input contract, so each gets its own
//! [`InputSpec`]. Both models were trained on nearest-neighbour resizes.
//! Everything here is a pure function of the input bytes.

use image::{imageops::FilterType, DynamicImage};

use crate::{error::DecodeError, types::Image};

/// How 8-bit channel values map to model input floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelScaling {
    /// `x / 127.5 - 1`, range [-1, 1] (MobileNetV2).
    Symmetric,
    /// `x / 255`, range [0, 1].
    Unit,
}

impl PixelScaling {
    fn apply(self, v: u8) -> f32 {
        match self {
            PixelScaling::Symmetric => v as f32 / 127.5 - 1.0,
            PixelScaling::Unit => v as f32 / 255.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub size: u32, // square side in pixels
    pub scaling: PixelScaling,
    pub filter: FilterType,
}

pub const GENERAL_INPUT: InputSpec = InputSpec {
    size: 224,
    scaling: PixelScaling::Symmetric,
    filter: FilterType::Nearest,
};

pub const DISEASE_INPUT: InputSpec = InputSpec {
    size: 150,
    scaling: PixelScaling::Unit,
    filter: FilterType::Nearest,
};

/// Model-ready pixels, CHW layout for a single RGB image.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelTensor {
    pub data: Vec<f32>,
    pub size: u32,
}

impl PixelTensor {
    /// NCHW shape with batch size 1.
    pub fn shape(&self) -> [i64; 4] {
        [1, 3, self.size as i64, self.size as i64]
    }
}

pub fn decode(image: &Image) -> Result<DynamicImage, DecodeError> {
    let img = image::load_from_memory(image.bytes())?;
    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::Empty {
            width: img.width(),
            height: img.height(),
        });
    }
    Ok(img)
}

pub fn prepare(img: &DynamicImage, spec: InputSpec) -> PixelTensor {
    let rgb = img
        .resize_exact(spec.size, spec.size, spec.filter)
        .to_rgb8();
    let plane = (spec.size * spec.size) as usize;

    let mut data = vec![0.0f32; 3 * plane];
    for (i, px) in rgb.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = spec.scaling.apply(px[c]);
        }
    }
    PixelTensor {
        data,
        size: spec.size,
    }
}

pub fn for_general(image: &Image) -> Result<PixelTensor, DecodeError> {
    Ok(prepare(&decode(image)?, GENERAL_INPUT))
}

pub fn for_disease(image: &Image) -> Result<PixelTensor, DecodeError> {
    Ok(prepare(&decode(image)?, DISEASE_INPUT))
}
