//! Layered run configuration
//!
//! Task-mode defaults, then an optional TOML file, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use arena_rl_agent::{TaskMode, TrainingConfig};

use crate::cli::TrainArgs;

/// Contents of a TOML configuration file; absent keys keep the task default
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub task: Option<TaskMode>,
    pub batch_size: Option<usize>,
    pub max_steps: Option<usize>,
    pub enemy_count: Option<usize>,
    pub max_episodes: Option<usize>,
    pub ticks_per_decision: Option<usize>,
    pub discount: Option<f64>,
    pub checkpoint_interval: Option<usize>,
    pub snapshot_interval: Option<usize>,
    pub show_interval: Option<usize>,
    pub resume: Option<bool>,
    pub log_dir: Option<PathBuf>,
    pub episodes_per_update: Option<usize>,
    pub seed: Option<u64>,
    pub kill_reward: Option<f64>,
    pub hidden_dim: Option<usize>,
    pub learning_rate: Option<f32>,
    pub log_prob_penalty: Option<f32>,
}

impl FileConfig {
    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Overwrite `config` with every key present in the file
    pub fn apply(&self, config: &mut TrainingConfig) {
        let file = self;
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = file.$field.clone() {
                    config.$field = value;
                })*
            };
        }
        set!(
            batch_size,
            max_steps,
            enemy_count,
            max_episodes,
            ticks_per_decision,
            discount,
            checkpoint_interval,
            snapshot_interval,
            show_interval,
            resume,
            log_dir,
            episodes_per_update,
            kill_reward,
            hidden_dim,
            learning_rate,
            log_prob_penalty,
        );
        if file.seed.is_some() {
            config.seed = file.seed;
        }
    }
}

/// Resolve the configuration of a `train` invocation
pub fn resolve(args: &TrainArgs) -> Result<TrainingConfig> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let task = args
        .task
        .map(TaskMode::from)
        .or(file.task)
        .unwrap_or_default();

    let mut config = TrainingConfig::for_task(task);
    file.apply(&mut config);
    apply_flags(args, &mut config);
    config.validate().context("Invalid training configuration")?;
    Ok(config)
}

fn apply_flags(args: &TrainArgs, config: &mut TrainingConfig) {
    if let Some(v) = args.batch_size {
        config.batch_size = v;
    }
    if let Some(v) = args.max_steps {
        config.max_steps = v;
    }
    if let Some(v) = args.enemies {
        config.enemy_count = v;
    }
    if let Some(v) = args.max_episodes {
        config.max_episodes = v;
    }
    if let Some(v) = args.ticks_per_decision {
        config.ticks_per_decision = v;
    }
    if let Some(v) = args.discount {
        config.discount = v;
    }
    if let Some(v) = args.checkpoint_interval {
        config.checkpoint_interval = v;
    }
    if let Some(v) = args.snapshot_interval {
        config.snapshot_interval = v;
    }
    if let Some(v) = args.show_interval {
        config.show_interval = v;
    }
    if let Some(v) = args.episodes_per_update {
        config.episodes_per_update = v;
    }
    if let Some(v) = &args.log_dir {
        config.log_dir.clone_from(v);
    }
    if let Some(v) = args.kill_reward {
        config.kill_reward = v;
    }
    if let Some(v) = args.learning_rate {
        config.learning_rate = v;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.resume |= args.resume;
}
