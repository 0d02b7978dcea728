//! The training loop
//!
//! Runs episodes, pools their transitions, updates the policy on every full
//! batch and keeps checkpoints, snapshots and a JSON-lines statistics log.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use arena_rl_core::{Environment, Policy, RLError, Result, ShutdownSignal};

use crate::buffer::BatchAggregator;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::{TaskMode, TrainingConfig};
use crate::runner::{EpisodeOutcome, EpisodeRunner, Termination};

/// Per-episode statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Episode index
    pub episode: usize,
    /// Sum of decision rewards
    pub total_reward: f64,
    /// Decisions taken
    pub length: usize,
    /// Adversaries destroyed
    pub kills: usize,
    /// Whether the objective ended the episode
    pub objective_reached: bool,
    /// Mean loss of the updates run after this episode
    pub mean_loss: Option<f64>,
    /// Batches consumed by those updates
    pub batches: usize,
    /// Wall time of collection plus updates
    pub duration_ms: u64,
    /// When the episode finished
    pub timestamp: DateTime<Utc>,
}

/// Append-only JSON-lines statistics file
#[derive(Debug, Clone)]
pub struct StatsLog {
    path: PathBuf,
}

impl StatsLog {
    /// Log writing to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Propagates serialization and filesystem errors.
    pub async fn append(&self, stats: &EpisodeStats) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_string(stats)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSummary {
    /// First episode index trained
    pub first_episode: usize,
    /// Last episode index trained, if any
    pub last_episode: Option<usize>,
    /// Policy updates applied
    pub updates: usize,
}

/// Orchestrates collection, updates and persistence
pub struct TrainingLoop<E, P> {
    config: TrainingConfig,
    env: E,
    policy: P,
    runner: EpisodeRunner,
    aggregator: BatchAggregator,
    store: CheckpointStore,
    stats: StatsLog,
    pooled_episodes: usize,
    updates: usize,
}

impl<E, P> TrainingLoop<E, P>
where
    E: Environment + Clone,
    P: Policy + Clone,
{
    /// Assemble a training loop
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a rejected configuration, `DimensionMismatch` when
    /// the policy input does not match the environment's observations.
    pub fn new(
        config: TrainingConfig,
        env: E,
        policy: P,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        config.validate()?;
        if env.observation_dim() != policy.input_dim() {
            return Err(RLError::DimensionMismatch {
                expected: env.observation_dim(),
                actual: policy.input_dim(),
            });
        }
        Ok(Self {
            runner: EpisodeRunner::new(config.ticks_per_decision, config.max_steps, shutdown),
            aggregator: BatchAggregator::new(config.discount),
            store: CheckpointStore::new(config.task_dir()),
            stats: StatsLog::new(config.stats_path()),
            pooled_episodes: 0,
            updates: 0,
            config,
            env,
            policy,
        })
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The policy being trained
    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Checkpoint store of this run
    #[must_use]
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Split into environment and policy
    pub fn into_parts(self) -> (E, P) {
        (self.env, self.policy)
    }

    /// Restore the resume checkpoint, returning the episode it was saved after
    ///
    /// Any failure is logged and yields a fresh start at episode 0.
    pub async fn resume(&mut self) -> usize {
        let checkpoint = match self.store.load_resume().await {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(
                    path = %self.store.resume_path().display(),
                    error = %e,
                    "cannot read resume checkpoint, starting fresh"
                );
                return 0;
            }
        };
        if let Err(e) = self.policy.restore(&checkpoint.policy) {
            warn!(error = %e, "resume checkpoint does not fit the policy, starting fresh");
            return 0;
        }
        info!(
            episode = checkpoint.episode,
            saved_at = %checkpoint.saved_at,
            "resumed from checkpoint"
        );
        checkpoint.episode
    }

    /// Train until the episode budget is exhausted
    ///
    /// # Errors
    ///
    /// `Interrupted` on shutdown; any episode, update or checkpoint failure.
    pub async fn run(&mut self) -> Result<TrainingSummary> {
        let start = if self.config.resume {
            self.resume().await
        } else {
            0
        };
        let first_episode = start + 1;
        info!(
            task = %self.config.task,
            first_episode,
            max_episodes = self.config.max_episodes,
            batch_size = self.config.batch_size,
            max_steps = self.config.max_steps,
            "training started"
        );

        let mut last_episode = None;
        for episode in first_episode..self.config.max_episodes {
            self.train_episode(episode).await?;
            last_episode = Some(episode);

            if episode % self.config.checkpoint_interval == 0 {
                let checkpoint = Checkpoint::new(self.policy.snapshot(), episode);
                self.store.save_resume(&checkpoint).await?;
            }
            if episode % self.config.snapshot_interval == 0 {
                let checkpoint = Checkpoint::new(self.policy.snapshot(), episode);
                let path = self.store.save_snapshot(&checkpoint).await?;
                info!(episode, path = %path.display(), "snapshot saved");
            }
            if episode % self.config.show_interval == 0 {
                self.show(episode).await?;
            }
        }

        info!(updates = self.updates, "training finished");
        Ok(TrainingSummary {
            first_episode,
            last_episode,
            updates: self.updates,
        })
    }

    /// Collect one episode and run whatever updates are due
    ///
    /// # Errors
    ///
    /// Propagates episode, update and statistics-log failures.
    #[allow(clippy::cast_precision_loss)]
    pub async fn train_episode(&mut self, episode: usize) -> Result<EpisodeStats> {
        let started = Instant::now();
        let outcome = self.runner.run(&mut self.env, &self.policy, false).await?;
        self.aggregator.add_buffer(&outcome.buffer);
        self.pooled_episodes += 1;

        let mut losses = Vec::new();
        if self.pooled_episodes >= self.config.episodes_per_update {
            self.pooled_episodes = 0;
            for batch in self.aggregator.flush_batches(self.config.batch_size) {
                let loss = self.policy.update(&batch).await?;
                debug!(episode, loss, "batch update");
                losses.push(loss);
            }
            self.updates += losses.len();
        }

        let mean_loss =
            (!losses.is_empty()).then(|| losses.iter().sum::<f64>() / losses.len() as f64);
        let stats = self.episode_stats(episode, &outcome, mean_loss, losses.len(), started);
        match self.config.task {
            TaskMode::Explore => info!(
                episode,
                total_reward = stats.total_reward,
                length = stats.length,
                loss = ?stats.mean_loss,
                "episode complete"
            ),
            TaskMode::Play => info!(
                episode,
                total_reward = stats.total_reward,
                length = stats.length,
                kills = stats.kills,
                objective = stats.objective_reached,
                loss = ?stats.mean_loss,
                "episode complete"
            ),
        }
        self.stats.append(&stats).await?;
        Ok(stats)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn episode_stats(
        &self,
        episode: usize,
        outcome: &EpisodeOutcome,
        mean_loss: Option<f64>,
        batches: usize,
        started: Instant,
    ) -> EpisodeStats {
        EpisodeStats {
            episode,
            total_reward: outcome.total_return(),
            length: outcome.len(),
            kills: outcome.kills,
            objective_reached: outcome.termination == Termination::Objective,
            mean_loss,
            batches,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        }
    }

    /// Play one rendered, paced episode on copies of the environment and
    /// policy, so engine seeds and the action sampler of training are untouched
    ///
    /// # Errors
    ///
    /// Propagates episode failures.
    pub async fn show(&self, episode: usize) -> Result<EpisodeOutcome> {
        info!(episode, "rendered rollout");
        let mut env = self.env.clone();
        let policy = self.policy.clone();
        let outcome = self.runner.run(&mut env, &policy, true).await?;
        info!(
            episode,
            total_reward = outcome.total_return(),
            length = outcome.len(),
            "rendered rollout finished"
        );
        Ok(outcome)
    }
}

/// Replay a saved policy with rendering on, never updating it
///
/// Plays `episodes` episodes, or until shutdown when `None`. Returns the number
/// of episodes completed.
///
/// # Errors
///
/// `Checkpoint` when the file does not fit the policy; episode failures other
/// than `Interrupted`.
pub async fn watch<E, P>(
    env: &mut E,
    policy: &mut P,
    checkpoint: &Path,
    runner: &EpisodeRunner,
    episodes: Option<usize>,
) -> Result<usize>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let saved = Checkpoint::load(checkpoint).await.map_err(|e| {
        RLError::Checkpoint(format!("cannot read {}: {e}", checkpoint.display()))
    })?;
    policy.restore(&saved.policy)?;
    info!(episode = saved.episode, path = %checkpoint.display(), "watching saved policy");

    let mut played = 0;
    while episodes.map_or(true, |limit| played < limit) {
        match runner.run(&mut *env, &*policy, true).await {
            Ok(outcome) => {
                played += 1;
                info!(
                    total_reward = outcome.total_return(),
                    length = outcome.len(),
                    kills = outcome.kills,
                    "watched episode"
                );
            }
            Err(RLError::Interrupted) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(played)
}
