//! The codebook quantizer (C4) — an external collaborator. Its trainer and
//! its per-frame feature extractor live outside this crate; what the core
//! owns is the trait boundary and the normalization constants both sides
//! must agree on.

use serde::{Deserialize, Serialize};

/// Frames x descriptor-dimensions, row-major.
pub struct FrameMatrix {
    pub frames: Vec<Vec<f64>>,
}

impl FrameMatrix {
    pub fn new(frames: Vec<Vec<f64>>) -> Self {
        Self { frames }
    }
}

/// Per-dimension mean/std used to normalize descriptors before
/// quantization. Must be identical at index time and query time — shipped
/// as a fixed artifact alongside the codebook itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Normalization {
    pub fn normalize(&self, frame: &[f64]) -> Vec<f64> {
        frame
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let std = self.std.get(i).copied().unwrap_or(1.0);
                let mean = self.mean.get(i).copied().unwrap_or(0.0);
                if std.abs() < f64::EPSILON {
                    0.0
                } else {
                    (v - mean) / std
                }
            })
            .collect()
    }
}

/// Accept a per-frame descriptor matrix, return a non-negative integer
/// codeword-count histogram of length `k`. Implementations (the codebook
/// trainer's nearest-centroid assignment) live outside this crate.
pub trait Quantizer: Send + Sync {
    fn k(&self) -> usize;
    fn quantize(&self, frames: &FrameMatrix) -> Vec<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_centers_and_scales() {
        let norm = Normalization { mean: vec![1.0, 2.0], std: vec![2.0, 1.0] };
        let result = norm.normalize(&[3.0, 4.0]);
        assert_eq!(result, vec![1.0, 2.0]);
    }

    #[test]
    fn zero_std_dimension_normalizes_to_zero() {
        let norm = Normalization { mean: vec![1.0], std: vec![0.0] };
        assert_eq!(norm.normalize(&[5.0]), vec![0.0]);
    }
}
