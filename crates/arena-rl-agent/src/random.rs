//! Random policy for baseline comparisons

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use arena_rl_core::{
    ArenaAction, Policy, PolicySnapshot, RLError, Result, TrainingBatch, VectorObservation,
};

/// Snapshot family name of [`RandomPolicy`]
pub const RANDOM_KIND: &str = "random";

/// Selects actions uniformly at random and never learns
pub struct RandomPolicy {
    input_dim: usize,
    rng: Mutex<StdRng>,
}

impl RandomPolicy {
    /// Create a new random policy
    #[must_use]
    pub fn new(input_dim: usize, seed: Option<u64>) -> Self {
        Self {
            input_dim,
            rng: Mutex::new(seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)),
        }
    }
}

impl Clone for RandomPolicy {
    fn clone(&self) -> Self {
        let rng = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            input_dim: self.input_dim,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl Policy for RandomPolicy {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    async fn select_action(&self, observation: &VectorObservation) -> Result<ArenaAction> {
        if observation.len() != self.input_dim {
            return Err(RLError::DimensionMismatch {
                expected: self.input_dim,
                actual: observation.len(),
            });
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| RLError::Policy("sampler lock poisoned".into()))?;
        Ok(ArenaAction::ALL[rng.gen_range(0..ArenaAction::COUNT)])
    }

    async fn update(&mut self, _batch: &TrainingBatch) -> Result<f64> {
        // Random policy doesn't learn from experience
        Ok(0.0)
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            kind: RANDOM_KIND.to_string(),
            architecture: vec![self.input_dim, ArenaAction::COUNT],
            parameters: Vec::new(),
        }
    }

    fn restore(&mut self, snapshot: &PolicySnapshot) -> Result<()> {
        snapshot.check_compatible(RANDOM_KIND, &[self.input_dim, ArenaAction::COUNT])
    }
}
