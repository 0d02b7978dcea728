//! Reward signals

use serde::{Deserialize, Serialize};

use crate::{OutputStage, RLError};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Reject NaN and infinite rewards
    ///
    /// # Errors
    ///
    /// `MalformedOutput` naming the reward stage.
    pub fn validate(&self) -> crate::Result<()> {
        if self.0.is_finite() {
            Ok(())
        } else {
            Err(RLError::MalformedOutput {
                stage: OutputStage::Reward,
                detail: format!("reward is not a finite number ({})", self.0),
            })
        }
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::AddAssign for Reward {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates() {
        let mut total = Reward::default();
        total += Reward(1.5);
        assert_eq!(total + Reward(0.5), Reward(2.0));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(Reward(3.0).validate().is_ok());
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = Reward(bad).validate().unwrap_err();
            assert!(err.is_malformed_output());
        }
    }
}
