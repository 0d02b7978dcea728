//! Training configuration

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use arena_rl_core::{RLError, Result};

/// What the agent is trained to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    /// Explore an empty arena
    #[default]
    Explore,
    /// Explore while adversaries spawn
    Play,
}

impl TaskMode {
    /// Default batch size
    #[must_use]
    pub fn batch_size(self) -> usize {
        match self {
            Self::Explore => 512,
            Self::Play => 1024,
        }
    }

    /// Default decision cap per episode
    #[must_use]
    pub fn max_steps(self) -> usize {
        match self {
            Self::Explore => 512,
            Self::Play => 2048,
        }
    }

    /// Default adversary count
    #[must_use]
    pub fn enemy_count(self) -> usize {
        match self {
            Self::Explore => 0,
            Self::Play => 5,
        }
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explore => f.write_str("explore"),
            Self::Play => f.write_str("play"),
        }
    }
}

impl FromStr for TaskMode {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "explore" => Ok(Self::Explore),
            "play" => Ok(Self::Play),
            other => Err(RLError::InvalidConfig(format!(
                "unknown task '{other}', expected explore or play"
            ))),
        }
    }
}

/// Training run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Task mode
    pub task: TaskMode,
    /// Transitions per policy update
    pub batch_size: usize,
    /// Decision cap per episode
    pub max_steps: usize,
    /// Adversaries spawned per episode
    pub enemy_count: usize,
    /// Episode numbering stops before this index
    pub max_episodes: usize,
    /// Engine ticks each action is held for
    pub ticks_per_decision: usize,
    /// Reward-to-go discount
    pub discount: f64,
    /// Episodes between resume checkpoints
    pub checkpoint_interval: usize,
    /// Episodes between numbered snapshots
    pub snapshot_interval: usize,
    /// Episodes between rendered rollouts
    pub show_interval: usize,
    /// Continue from the last resume checkpoint
    pub resume: bool,
    /// Root directory for checkpoints and statistics
    pub log_dir: PathBuf,
    /// Episodes pooled before batches are flushed
    pub episodes_per_update: usize,
    /// Seed for the engine and the policy
    pub seed: Option<u64>,
    /// Reward per adversary destroyed
    pub kill_reward: f64,
    /// Width of each of the two hidden layers
    pub hidden_dim: usize,
    /// Adam step size
    pub learning_rate: f32,
    /// Weight of the `mean(log p)` loss term
    pub log_prob_penalty: f32,
}

impl TrainingConfig {
    /// Defaults for a task mode
    #[must_use]
    pub fn for_task(task: TaskMode) -> Self {
        Self {
            task,
            batch_size: task.batch_size(),
            max_steps: task.max_steps(),
            enemy_count: task.enemy_count(),
            max_episodes: 10_000,
            ticks_per_decision: 8,
            discount: 0.9,
            checkpoint_interval: 1,
            snapshot_interval: 100,
            show_interval: 100,
            resume: false,
            log_dir: PathBuf::from("logs"),
            episodes_per_update: 1,
            seed: None,
            kill_reward: 0.0,
            hidden_dim: 32,
            learning_rate: 5e-3,
            log_prob_penalty: 0.2,
        }
    }

    /// Directory holding this task's checkpoints
    #[must_use]
    pub fn task_dir(&self) -> PathBuf {
        self.log_dir.join(self.task.to_string())
    }

    /// Path of the JSON-lines statistics file
    #[must_use]
    pub fn stats_path(&self) -> PathBuf {
        self.log_dir.join("training_stats.jsonl")
    }

    /// Reject configurations that cannot run
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("batch_size", self.batch_size),
            ("max_steps", self.max_steps),
            ("ticks_per_decision", self.ticks_per_decision),
            ("checkpoint_interval", self.checkpoint_interval),
            ("snapshot_interval", self.snapshot_interval),
            ("show_interval", self.show_interval),
            ("episodes_per_update", self.episodes_per_update),
            ("hidden_dim", self.hidden_dim),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(RLError::InvalidConfig(format!("{name} must be at least 1")));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(RLError::InvalidConfig(format!(
                "discount must lie in [0, 1], got {}",
                self.discount
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RLError::InvalidConfig(
                "learning_rate must be positive".into(),
            ));
        }
        if !self.kill_reward.is_finite() || !self.log_prob_penalty.is_finite() {
            return Err(RLError::InvalidConfig(
                "kill_reward and log_prob_penalty must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::for_task(TaskMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_defaults() {
        let explore = TrainingConfig::for_task(TaskMode::Explore);
        assert_eq!(
            (explore.batch_size, explore.max_steps, explore.enemy_count),
            (512, 512, 0)
        );
        let play = TrainingConfig::for_task(TaskMode::Play);
        assert_eq!((play.batch_size, play.max_steps, play.enemy_count), (1024, 2048, 5));
        assert!(play.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TrainingConfig::default();
        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(RLError::InvalidConfig(_))));

        let mut config = TrainingConfig::default();
        config.discount = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_task_parsing() {
        assert_eq!("PLAY".parse::<TaskMode>().unwrap(), TaskMode::Play);
        assert!("fight".parse::<TaskMode>().is_err());
        assert_eq!(TaskMode::Explore.to_string(), "explore");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{"batch_size": 64, "resume": true}"#).unwrap();
        assert_eq!(config.batch_size, 64);
        assert!(config.resume);
        assert_eq!(config.ticks_per_decision, 8);
    }
}
