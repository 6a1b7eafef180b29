//! Summary statistics for residuals and motion fields.
//!
//! Used for logging, reports and metrics; nothing in the core
//! depends on them.

use crate::capture::SignedFrame;
use crate::estimation::MotionField;

/// Error measures of a prediction residual.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualStatistics {
    /// Sum of absolute residual samples.
    pub sum_abs: u64,
    /// Mean squared residual.
    pub mse: f64,
    /// Peak signal-to-noise ratio in dB, `None` for a zero residual.
    pub psnr_db: Option<f64>,
    /// Largest absolute residual sample.
    pub max_abs: u16,
    /// Number of non-zero samples.
    pub nonzero: usize,
    /// Number of samples analyzed.
    pub sample_size: usize,
}

impl ResidualStatistics {
    /// Computes all measures in one pass.
    pub fn analyze(residual: &SignedFrame) -> Self {
        let samples = residual.samples();

        let mut sum_abs = 0u64;
        let mut sum_sq = 0u64;
        let mut max_abs = 0u16;
        let mut nonzero = 0usize;
        for &s in samples {
            let a = s.unsigned_abs();
            sum_abs += a as u64;
            sum_sq += (a as u64) * (a as u64);
            max_abs = max_abs.max(a);
            if a != 0 {
                nonzero += 1;
            }
        }

        let mse = if samples.is_empty() {
            0.0
        } else {
            sum_sq as f64 / samples.len() as f64
        };

        Self {
            sum_abs,
            mse,
            psnr_db: Self::compute_psnr(mse),
            max_abs,
            nonzero,
            sample_size: samples.len(),
        }
    }

    /// PSNR for 8-bit samples.
    fn compute_psnr(mse: f64) -> Option<f64> {
        if mse == 0.0 {
            return None;
        }
        Some(10.0 * (255.0f64 * 255.0 / mse).log10())
    }

    /// Mean absolute residual.
    pub fn mean_abs(&self) -> f64 {
        if self.sample_size == 0 {
            return 0.0;
        }
        self.sum_abs as f64 / self.sample_size as f64
    }
}

/// Shape of a motion field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStatistics {
    /// Number of vectors.
    pub blocks: usize,
    /// Vectors with zero displacement.
    pub zero_vectors: usize,
    /// Mean displacement length.
    pub mean_magnitude: f64,
    /// Longest displacement.
    pub max_magnitude: f64,
}

impl FieldStatistics {
    /// Summarizes the vectors of `field`.
    pub fn analyze(field: &MotionField) -> Self {
        let blocks = field.len();
        let zero_vectors = field.iter().filter(|mv| mv.is_zero()).count();
        let (sum, max) = field
            .iter()
            .map(|mv| mv.magnitude())
            .fold((0.0f64, 0.0f64), |(sum, max), m| (sum + m, max.max(m)));

        Self {
            blocks,
            zero_vectors,
            mean_magnitude: if blocks == 0 { 0.0 } else { sum / blocks as f64 },
            max_magnitude: max,
        }
    }

    /// Fraction of blocks with a non-zero vector.
    pub fn moving_ratio(&self) -> f64 {
        if self.blocks == 0 {
            return 0.0;
        }
        (self.blocks - self.zero_vectors) as f64 / self.blocks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::MotionVector;

    #[test]
    fn test_zero_residual() {
        let residual = SignedFrame::new(vec![0; 64], 8, 8);
        let stats = ResidualStatistics::analyze(&residual);

        assert_eq!(stats.sum_abs, 0);
        assert_eq!(stats.mse, 0.0);
        assert_eq!(stats.psnr_db, None);
        assert_eq!(stats.nonzero, 0);
    }

    #[test]
    fn test_mixed_residual() {
        let residual = SignedFrame::new(vec![-3, 3, 0, 4], 2, 2);
        let stats = ResidualStatistics::analyze(&residual);

        assert_eq!(stats.sum_abs, 10);
        assert!((stats.mse - 34.0 / 4.0).abs() < 1e-12);
        assert_eq!(stats.max_abs, 4);
        assert_eq!(stats.nonzero, 3);
        assert!((stats.mean_abs() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_psnr_of_unit_error() {
        let residual = SignedFrame::new(vec![1; 16], 4, 4);
        let psnr = ResidualStatistics::analyze(&residual).psnr_db.unwrap();
        // 20 * log10(255)
        assert!((psnr - 48.1308).abs() < 1e-3);
    }

    #[test]
    fn test_field_statistics() {
        let field = MotionField::new(
            16,
            8,
            8,
            vec![MotionVector::new(0, 0, 0, 0), MotionVector::new(8, 0, 3, 4)],
        );
        let stats = FieldStatistics::analyze(&field);

        assert_eq!(stats.blocks, 2);
        assert_eq!(stats.zero_vectors, 1);
        assert!((stats.mean_magnitude - 2.5).abs() < 1e-12);
        assert!((stats.max_magnitude - 5.0).abs() < 1e-12);
        assert!((stats.moving_ratio() - 0.5).abs() < 1e-12);
    }
}
