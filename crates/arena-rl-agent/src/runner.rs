//! Episode execution
//!
//! One decision holds the chosen action for `ticks_per_decision` engine ticks
//! and records the tick rewards summed and divided by `ticks_per_decision`,
//! also when the objective ends the hold early. Observations and rewards are validated
//! after every decision; a malformed value aborts the run.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use arena_rl_core::{
    ActionLog, Environment, EpisodeBuffer, Policy, RLError, Result, Reward, ShutdownSignal,
    Transition,
};

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// All adversaries defeated with none left to spawn
    Objective,
    /// Decision cap reached
    StepLimit,
}

/// Everything produced by one episode
#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    /// Transitions in decision order
    pub buffer: EpisodeBuffer,
    /// How the episode ended
    pub termination: Termination,
    /// Adversaries destroyed
    pub kills: usize,
    /// Engine ticks executed
    pub ticks: usize,
    /// Last 20 chosen actions
    pub actions: ActionLog,
}

impl EpisodeOutcome {
    /// Sum of decision rewards
    #[must_use]
    pub fn total_return(&self) -> f64 {
        self.buffer.total_reward
    }

    /// Number of decisions
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no decision was taken
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Drives a policy through one episode of an environment
#[derive(Debug, Clone)]
pub struct EpisodeRunner {
    ticks_per_decision: usize,
    max_steps: usize,
    shutdown: ShutdownSignal,
}

impl EpisodeRunner {
    /// Create a runner
    #[must_use]
    pub fn new(ticks_per_decision: usize, max_steps: usize, shutdown: ShutdownSignal) -> Self {
        Self {
            ticks_per_decision: ticks_per_decision.max(1),
            max_steps,
            shutdown,
        }
    }

    /// Decision cap per episode
    #[must_use]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run one episode
    ///
    /// With `render` set the environment draws every tick and runs paced.
    ///
    /// # Errors
    ///
    /// `Interrupted` when shutdown is requested, `MalformedOutput` when an
    /// observation or reward fails validation, and anything the environment or
    /// policy reports.
    pub async fn run<E, P>(&self, env: &mut E, policy: &P, render: bool) -> Result<EpisodeOutcome>
    where
        E: Environment + ?Sized,
        P: Policy + ?Sized,
    {
        env.set_render(render);
        let result = self.play(env, policy, render).await;
        if render {
            env.set_render(false);
        }
        result
    }

    #[allow(clippy::cast_precision_loss)]
    async fn play<E, P>(&self, env: &mut E, policy: &P, render: bool) -> Result<EpisodeOutcome>
    where
        E: Environment + ?Sized,
        P: Policy + ?Sized,
    {
        let dim = env.observation_dim();
        let mut observation = env.reset().await?;
        observation.validate(dim)?;
        if render {
            env.render().await?;
        }

        let mut buffer = EpisodeBuffer::fresh();
        let mut actions = ActionLog::new();
        let mut kills = 0;
        let mut ticks = 0;

        let termination = loop {
            if buffer.len() >= self.max_steps {
                break Termination::StepLimit;
            }

            let action = policy.select_action(&observation).await?;
            let mut total = Reward::default();
            let mut held = 0_usize;
            let mut last = None;
            for _ in 0..self.ticks_per_decision {
                if self.shutdown.is_requested() {
                    return Err(RLError::Interrupted);
                }
                let step = env.step(action).await?;
                if render {
                    env.render().await?;
                }
                held += 1;
                total += step.reward;
                kills = step.kills.total;
                let done = step.done;
                last = Some((step.observation, done));
                if done {
                    break;
                }
            }
            ticks += held;

            let (next, done) = last.ok_or_else(|| {
                RLError::Environment("decision executed no engine ticks".into())
            })?;
            let reward = Reward(total.0 / self.ticks_per_decision as f64);
            reward.validate()?;
            next.validate(dim)?;

            trace!(decision = buffer.len(), ?action, reward = reward.0, "decision");
            actions.push(action);
            buffer.push(Transition {
                observation,
                action,
                reward,
            });
            observation = next;

            if done {
                break Termination::Objective;
            }
        };

        debug!(
            episode_id = %buffer.episode_id,
            decisions = buffer.len(),
            ticks,
            ?termination,
            "episode finished"
        );
        Ok(EpisodeOutcome {
            buffer,
            termination,
            kills,
            ticks,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arena_rl_core::{
        ArenaAction, KillCounters, PolicySnapshot, Step, TrainingBatch, VectorObservation,
    };
    use async_trait::async_trait;

    /// Counts ticks; reward equals the tick index; finishes after `goal` ticks
    struct CountingEnv {
        tick: usize,
        goal: Option<usize>,
        poison_at: Option<usize>,
        flat: Option<f64>,
    }

    impl CountingEnv {
        fn new(goal: Option<usize>) -> Self {
            Self {
                tick: 0,
                goal,
                poison_at: None,
                flat: None,
            }
        }
    }

    #[async_trait]
    impl Environment for CountingEnv {
        fn observation_dim(&self) -> usize {
            1
        }

        async fn reset(&mut self) -> Result<VectorObservation> {
            self.tick = 0;
            Ok(VectorObservation::new(vec![0.0]))
        }

        #[allow(clippy::cast_precision_loss)]
        async fn step(&mut self, _action: ArenaAction) -> Result<Step> {
            self.tick += 1;
            let value = if self.poison_at == Some(self.tick) {
                f64::NAN
            } else {
                self.flat.unwrap_or(self.tick as f64)
            };
            Ok(Step {
                observation: VectorObservation::new(vec![self.tick as f64]),
                reward: Reward(value),
                done: self.goal == Some(self.tick),
                kills: KillCounters::default(),
            })
        }

        fn set_render(&mut self, _enabled: bool) {}
    }

    struct FixedPolicy;

    #[async_trait]
    impl Policy for FixedPolicy {
        fn input_dim(&self) -> usize {
            1
        }

        async fn select_action(&self, _observation: &VectorObservation) -> Result<ArenaAction> {
            Ok(ArenaAction::Up)
        }

        async fn update(&mut self, _batch: &TrainingBatch) -> Result<f64> {
            Ok(0.0)
        }

        fn snapshot(&self) -> PolicySnapshot {
            PolicySnapshot {
                kind: "fixed".into(),
                architecture: vec![1],
                parameters: Vec::new(),
            }
        }

        fn restore(&mut self, _snapshot: &PolicySnapshot) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_step_limit_and_mean_reward() {
        let runner = EpisodeRunner::new(8, 3, ShutdownSignal::new());
        let mut env = CountingEnv::new(None);
        let outcome = runner.run(&mut env, &FixedPolicy, false).await.unwrap();
        assert_eq!(outcome.termination, Termination::StepLimit);
        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.ticks, 24);
        // ticks 1..=8 average to 4.5
        assert_relative_eq!(outcome.buffer.transitions[0].reward.0, 4.5);
        assert_relative_eq!(outcome.buffer.transitions[1].reward.0, 12.5);
        assert_eq!(outcome.actions.last(), Some(ArenaAction::Up));
    }

    #[tokio::test]
    async fn test_objective_ends_mid_decision() {
        let runner = EpisodeRunner::new(8, 100, ShutdownSignal::new());
        let mut env = CountingEnv::new(Some(10));
        let outcome = runner.run(&mut env, &FixedPolicy, false).await.unwrap();
        assert_eq!(outcome.termination, Termination::Objective);
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.ticks, 10);
        // ticks 9 and 10 still divide by the full hold of 8
        assert_relative_eq!(outcome.buffer.transitions[1].reward.0, 2.375);
    }

    #[tokio::test]
    async fn test_cut_short_hold_is_not_scaled_up() {
        let runner = EpisodeRunner::new(8, 100, ShutdownSignal::new());
        let mut env = CountingEnv::new(Some(9));
        env.flat = Some(8.0);
        let outcome = runner.run(&mut env, &FixedPolicy, false).await.unwrap();
        assert_relative_eq!(outcome.buffer.transitions[0].reward.0, 8.0);
        assert_relative_eq!(outcome.buffer.transitions[1].reward.0, 1.0);
    }

    #[tokio::test]
    async fn test_malformed_reward_is_fatal() {
        let runner = EpisodeRunner::new(4, 10, ShutdownSignal::new());
        let mut env = CountingEnv::new(None);
        env.poison_at = Some(6);
        let err = runner.run(&mut env, &FixedPolicy, false).await.unwrap_err();
        assert!(err.is_malformed_output());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts() {
        let shutdown = ShutdownSignal::new();
        shutdown.request();
        let runner = EpisodeRunner::new(8, 10, shutdown);
        let mut env = CountingEnv::new(None);
        let err = runner.run(&mut env, &FixedPolicy, false).await.unwrap_err();
        assert!(matches!(err, RLError::Interrupted));
    }
}
