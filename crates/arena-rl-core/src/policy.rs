//! Policy contract for action selection and on-policy updates

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ArenaAction, RLError, VectorObservation};

/// Fixed-size group of transitions consumed by exactly one update call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingBatch {
    /// Observations, one per transition
    pub observations: Vec<VectorObservation>,
    /// Actions taken
    pub actions: Vec<ArenaAction>,
    /// Reward-to-go targets weighting each log-probability
    pub returns: Vec<f64>,
}

impl TrainingBatch {
    /// Number of transitions in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the batch holds no transitions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Serializable parameter dump of a policy
///
/// `architecture` identifies the parameterization; a snapshot can only be
/// restored into a policy with the same architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Policy family name
    pub kind: String,
    /// Layer widths, input first
    pub architecture: Vec<usize>,
    /// Flattened parameters
    pub parameters: Vec<f32>,
}

impl PolicySnapshot {
    /// Ensure this snapshot fits a policy of the given kind and architecture
    ///
    /// # Errors
    ///
    /// `Checkpoint` when the family or layer widths differ.
    pub fn check_compatible(&self, kind: &str, architecture: &[usize]) -> crate::Result<()> {
        if self.kind != kind || self.architecture != architecture {
            return Err(RLError::Checkpoint(format!(
                "snapshot is {} {:?}, policy is {} {:?}",
                self.kind, self.architecture, kind, architecture
            )));
        }
        Ok(())
    }
}

/// Stochastic policy over the discrete action set
#[async_trait]
pub trait Policy: Send + Sync {
    /// Length of the observation vectors the policy accepts
    fn input_dim(&self) -> usize;

    /// Sample an action for an observation
    async fn select_action(&self, observation: &VectorObservation) -> crate::Result<ArenaAction>;

    /// Apply one gradient step on a batch and return the scalar loss
    async fn update(&mut self, batch: &TrainingBatch) -> crate::Result<f64>;

    /// Dump parameters for checkpointing
    fn snapshot(&self) -> PolicySnapshot;

    /// Load parameters from a checkpoint
    fn restore(&mut self, snapshot: &PolicySnapshot) -> crate::Result<()>;
}
