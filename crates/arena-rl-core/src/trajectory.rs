//! Transitions, episode buffers and reward-to-go

use serde::{Deserialize, Serialize};

use crate::{ArenaAction, Reward, VectorObservation};

/// One decision step: what the policy saw, what it chose, what it earned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Observation the action was chosen from
    pub observation: VectorObservation,
    /// Action taken
    pub action: ArenaAction,
    /// Mean tick reward over the held ticks
    pub reward: Reward,
}

/// Ordered transitions of one episode
#[derive(Debug, Clone)]
pub struct EpisodeBuffer {
    /// Sequence of transitions, ordered by decision index
    pub transitions: Vec<Transition>,
    /// Sum of decision rewards
    pub total_reward: f64,
    /// Episode ID
    pub episode_id: String,
}

impl EpisodeBuffer {
    /// Create a new empty buffer
    #[must_use]
    pub fn new(episode_id: String) -> Self {
        Self {
            transitions: Vec::new(),
            total_reward: 0.0,
            episode_id,
        }
    }

    /// Create a buffer with a fresh random ID
    #[must_use]
    pub fn fresh() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Add a transition to the buffer
    pub fn push(&mut self, transition: Transition) {
        self.total_reward += transition.reward.0;
        self.transitions.push(transition);
    }

    /// Episode length in decisions
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Decision rewards in order
    #[must_use]
    pub fn rewards(&self) -> Vec<f64> {
        self.transitions.iter().map(|t| t.reward.0).collect()
    }

    /// Discounted reward-to-go for every decision
    #[must_use]
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        reward_to_go(&self.rewards(), gamma)
    }
}

/// Discounted suffix sums `g_i = r_i + gamma * g_{i+1}` with `g_n = 0`
#[must_use]
pub fn reward_to_go(rewards: &[f64], gamma: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running_return = 0.0;

    for i in (0..rewards.len()).rev() {
        running_return = rewards[i] + gamma * running_return;
        returns[i] = running_return;
    }

    returns
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transition(reward: f64) -> Transition {
        Transition {
            observation: VectorObservation::new(vec![0.0]),
            action: ArenaAction::Idle,
            reward: Reward(reward),
        }
    }

    #[test]
    fn test_reward_to_go_matches_hand_computation() {
        let g = reward_to_go(&[1.0, 2.0, 3.0], 0.9);
        assert_relative_eq!(g[2], 3.0);
        assert_relative_eq!(g[1], 2.0 + 0.9 * 3.0);
        assert_relative_eq!(g[0], 1.0 + 0.9 * (2.0 + 0.9 * 3.0));
    }

    #[test]
    fn test_reward_to_go_empty() {
        assert!(reward_to_go(&[], 0.9).is_empty());
    }

    #[test]
    fn test_undiscounted_is_suffix_sum() {
        let g = reward_to_go(&[1.0, 1.0, 1.0, 1.0], 1.0);
        assert_eq!(g, vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_buffer_tracks_return_and_length() {
        let mut buffer = EpisodeBuffer::fresh();
        buffer.push(transition(0.5));
        buffer.push(transition(1.5));
        assert_eq!(buffer.len(), 2);
        assert_relative_eq!(buffer.total_reward, 2.0);
        assert_eq!(buffer.returns(0.0), vec![0.5, 1.5]);
    }
}
