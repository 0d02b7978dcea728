//! On-policy batch aggregation

use tracing::debug;

use arena_rl_core::{reward_to_go, EpisodeBuffer, TrainingBatch, Transition};

/// Pools transitions from one or more episodes and cuts them into batches
///
/// Reward-to-go targets are computed per episode when it is added, so batches
/// may freely straddle episode boundaries.
#[derive(Debug, Clone)]
pub struct BatchAggregator {
    discount: f64,
    pool: TrainingBatch,
    episodes: usize,
}

impl BatchAggregator {
    /// Create an empty aggregator
    #[must_use]
    pub fn new(discount: f64) -> Self {
        Self {
            discount,
            pool: TrainingBatch::default(),
            episodes: 0,
        }
    }

    /// Discount factor used for reward-to-go
    #[must_use]
    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Discounted suffix sums of an episode's rewards
    #[must_use]
    pub fn compute_return_to_go(rewards: &[f64], discount: f64) -> Vec<f64> {
        reward_to_go(rewards, discount)
    }

    /// Append one episode, in decision order
    pub fn add_episode(&mut self, transitions: &[Transition]) {
        let rewards: Vec<f64> = transitions.iter().map(|t| t.reward.0).collect();
        let returns = Self::compute_return_to_go(&rewards, self.discount);
        for (transition, ret) in transitions.iter().zip(returns) {
            self.pool.observations.push(transition.observation.clone());
            self.pool.actions.push(transition.action);
            self.pool.returns.push(ret);
        }
        self.episodes += 1;
    }

    /// Append a finished episode buffer
    pub fn add_buffer(&mut self, buffer: &EpisodeBuffer) {
        self.add_episode(&buffer.transitions);
    }

    /// Pooled transitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether nothing is pooled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Episodes added since the last flush
    #[must_use]
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Split the pool into consecutive batches of exactly `batch_size`
    ///
    /// The whole pool is consumed; a trailing partial chunk is dropped.
    pub fn flush_batches(&mut self, batch_size: usize) -> Vec<TrainingBatch> {
        let pool = std::mem::take(&mut self.pool);
        self.episodes = 0;
        if batch_size == 0 {
            return Vec::new();
        }

        let full = pool.len() / batch_size;
        let dropped = pool.len() % batch_size;
        let mut observations = pool.observations.into_iter();
        let mut actions = pool.actions.into_iter();
        let mut returns = pool.returns.into_iter();
        let batches: Vec<TrainingBatch> = (0..full)
            .map(|_| TrainingBatch {
                observations: observations.by_ref().take(batch_size).collect(),
                actions: actions.by_ref().take(batch_size).collect(),
                returns: returns.by_ref().take(batch_size).collect(),
            })
            .collect();

        debug!(batches = batches.len(), dropped, "flushed transition pool");
        batches
    }
}
