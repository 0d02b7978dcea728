//! Observation vectors handed to the policy

use serde::{Deserialize, Serialize};

use crate::{OutputStage, RLError};

/// Fixed-arity numeric observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorObservation {
    /// The observation data
    pub data: Vec<f64>,
}

impl VectorObservation {
    /// Wrap a feature vector
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Number of features
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector has no features
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Feature slice
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Features narrowed to `f32` for network input
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_f32(&self) -> Vec<f32> {
        self.data.iter().map(|&x| x as f32).collect()
    }

    /// Check arity and finiteness at the simulation boundary
    ///
    /// # Errors
    ///
    /// `MalformedOutput` naming the observation stage when the arity differs from
    /// `expected_dim` or an entry is NaN or infinite.
    pub fn validate(&self, expected_dim: usize) -> crate::Result<()> {
        if self.data.len() != expected_dim {
            return Err(RLError::MalformedOutput {
                stage: OutputStage::Observation,
                detail: format!(
                    "expected {expected_dim} features, got {}",
                    self.data.len()
                ),
            });
        }
        if let Some((i, x)) = self.data.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(RLError::MalformedOutput {
                stage: OutputStage::Observation,
                detail: format!("feature {i} is not a finite number ({x})"),
            });
        }
        Ok(())
    }
}

impl From<Vec<f64>> for VectorObservation {
    fn from(data: Vec<f64>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_finite_vector() {
        let obs = VectorObservation::new(vec![0.0, 1.5, -3.0]);
        assert!(obs.validate(3).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_arity() {
        let obs = VectorObservation::new(vec![0.0, 1.5]);
        let err = obs.validate(3).unwrap_err();
        assert!(err.is_malformed_output());
        assert!(err.to_string().contains("observation encoder"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let obs = VectorObservation::new(vec![0.0, f64::NAN, 1.0]);
        let err = obs.validate(3).unwrap_err();
        assert!(err.to_string().contains("feature 1"));
    }
}
