//! The `train` and `watch` commands

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use arena_rl_agent::{
    Checkpoint, EpisodeRunner, MlpConfig, MlpPolicy, RandomPolicy, TaskMode, TrainingConfig,
    TrainingLoop, RANDOM_KIND,
};
use arena_rl_core::{Environment, Policy, RLError, ShutdownSignal};
use arena_rl_env::{ArenaSim, ExplorationConfig, ExplorationEnv, Normalize, OBSERVATION_DIM};

use crate::cli::{PolicyKind, TrainArgs, WatchArgs};
use crate::config;

/// Exit status for a completed run, including a requested shutdown
pub const EXIT_OK: u8 = 0;
/// Exit status for any failure other than a contract violation
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when the environment produced a malformed observation or reward
pub const EXIT_MALFORMED: u8 = 2;

/// Set `shutdown` on the first Ctrl-C
pub fn install_shutdown_listener(shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received, stopping after the current tick");
                shutdown.request();
            }
            Err(e) => error!(error = %e, "cannot listen for interrupts"),
        }
    });
}

/// Map a failed run to a process exit status, logging it
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let cause = err.chain().find_map(|e| e.downcast_ref::<RLError>());
    match cause {
        Some(RLError::Interrupted) => {
            info!("shutdown requested, exiting");
            EXIT_OK
        }
        Some(e) if e.is_malformed_output() => {
            error!(error = %format!("{err:#}"), "environment violated its output contract");
            EXIT_MALFORMED
        }
        _ => {
            error!(error = %format!("{err:#}"), "run failed");
            EXIT_FAILURE
        }
    }
}

fn arena_env(
    enemy_count: usize,
    seed: Option<u64>,
    kill_reward: f64,
) -> Normalize<ExplorationEnv<ArenaSim>> {
    Normalize::exploration(ExplorationEnv::arena(ExplorationConfig {
        enemy_count,
        seed,
        kill_reward,
        ..ExplorationConfig::default()
    }))
}

fn mlp_config(config: &TrainingConfig) -> MlpConfig {
    MlpConfig {
        input_dim: OBSERVATION_DIM,
        hidden_dims: vec![config.hidden_dim; 2],
        learning_rate: config.learning_rate,
        log_prob_penalty: config.log_prob_penalty,
        seed: config.seed,
    }
}

/// Run `arena-train train`
pub async fn train(args: &TrainArgs, shutdown: ShutdownSignal) -> Result<()> {
    let config = config::resolve(args)?;
    let env = arena_env(config.enemy_count, config.seed, config.kill_reward);
    match args.policy {
        PolicyKind::Mlp => {
            let policy = MlpPolicy::new(mlp_config(&config));
            run_training(config, env, policy, shutdown).await
        }
        PolicyKind::Random => {
            let policy = RandomPolicy::new(OBSERVATION_DIM, config.seed);
            run_training(config, env, policy, shutdown).await
        }
    }
}

async fn run_training<E, P>(
    config: TrainingConfig,
    env: E,
    policy: P,
    shutdown: ShutdownSignal,
) -> Result<()>
where
    E: Environment + Clone,
    P: Policy + Clone,
{
    let log_dir = config.log_dir.clone();
    let mut training = TrainingLoop::new(config, env, policy, shutdown)
        .context("Failed to set up training")?;
    let summary = training.run().await?;
    info!(
        first_episode = summary.first_episode,
        last_episode = ?summary.last_episode,
        updates = summary.updates,
        log_dir = %log_dir.display(),
        "run complete"
    );
    Ok(())
}

/// Run `arena-train watch`
pub async fn watch(args: &WatchArgs, shutdown: ShutdownSignal) -> Result<()> {
    let task = TaskMode::from(args.task);
    let mut env = arena_env(task.enemy_count(), args.seed, 0.0);
    let runner = EpisodeRunner::new(
        args.ticks_per_decision,
        args.max_steps.unwrap_or_else(|| task.max_steps()),
        shutdown,
    );

    let saved = Checkpoint::load(&args.checkpoint)
        .await
        .with_context(|| format!("Failed to load checkpoint {}", args.checkpoint.display()))?;
    let played = if saved.policy.kind == RANDOM_KIND {
        let mut policy = RandomPolicy::new(OBSERVATION_DIM, args.seed);
        arena_rl_agent::watch(&mut env, &mut policy, &args.checkpoint, &runner, args.episodes)
            .await?
    } else {
        // architecture is [input, hidden.., actions]
        let layers = &saved.policy.architecture;
        let hidden_dims = layers
            .get(1..layers.len().saturating_sub(1))
            .unwrap_or_default()
            .to_vec();
        let mut policy = MlpPolicy::new(MlpConfig {
            input_dim: OBSERVATION_DIM,
            hidden_dims,
            seed: args.seed,
            ..MlpConfig::default()
        });
        arena_rl_agent::watch(&mut env, &mut policy, &args.checkpoint, &runner, args.episodes)
            .await?
    };
    info!(played, "watch finished");
    Ok(())
}
