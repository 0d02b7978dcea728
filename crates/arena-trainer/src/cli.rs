//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use arena_rl_agent::TaskMode;

/// Top-level arguments
#[derive(Debug, Parser)]
#[command(name = "arena-train")]
#[command(about = "Train and watch the tile-arena exploration agent", version)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train a policy, checkpointing as it goes
    Train(TrainArgs),

    /// Replay a saved policy with rendering on
    Watch(WatchArgs),
}

/// Which policy to drive the agent with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PolicyKind {
    /// Two-hidden-layer policy-gradient network
    #[default]
    Mlp,
    /// Uniform random baseline
    Random,
}

/// Task selector accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskArg {
    /// Explore an empty arena
    Explore,
    /// Explore while adversaries spawn
    Play,
}

impl From<TaskArg> for TaskMode {
    fn from(task: TaskArg) -> Self {
        match task {
            TaskArg::Explore => Self::Explore,
            TaskArg::Play => Self::Play,
        }
    }
}

/// Arguments of `train`; every flag overrides the config file
#[derive(Debug, Default, clap::Args)]
pub struct TrainArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Task mode
    #[arg(short, long, value_enum)]
    pub task: Option<TaskArg>,

    /// Policy to train
    #[arg(long, value_enum, default_value_t = PolicyKind::Mlp)]
    pub policy: PolicyKind,

    /// Transitions per policy update
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Decision cap per episode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Adversaries spawned per episode
    #[arg(long)]
    pub enemies: Option<usize>,

    /// Episode numbering stops before this index
    #[arg(long)]
    pub max_episodes: Option<usize>,

    /// Engine ticks each action is held for
    #[arg(long)]
    pub ticks_per_decision: Option<usize>,

    /// Reward-to-go discount
    #[arg(long)]
    pub discount: Option<f64>,

    /// Episodes between resume checkpoints
    #[arg(long)]
    pub checkpoint_interval: Option<usize>,

    /// Episodes between numbered snapshots
    #[arg(long)]
    pub snapshot_interval: Option<usize>,

    /// Episodes between rendered rollouts
    #[arg(long)]
    pub show_interval: Option<usize>,

    /// Episodes pooled before batches are flushed
    #[arg(long)]
    pub episodes_per_update: Option<usize>,

    /// Continue from the last resume checkpoint
    #[arg(short, long)]
    pub resume: bool,

    /// Root directory for checkpoints and statistics
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Seed for the engine and the policy
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reward per adversary destroyed
    #[arg(long)]
    pub kill_reward: Option<f64>,

    /// Adam step size
    #[arg(long)]
    pub learning_rate: Option<f32>,
}

/// Arguments of `watch`
#[derive(Debug, clap::Args)]
pub struct WatchArgs {
    /// Snapshot or resume checkpoint to load
    #[arg(short, long)]
    pub checkpoint: PathBuf,

    /// Episodes to play; runs until interrupted when omitted
    #[arg(short = 'n', long)]
    pub episodes: Option<usize>,

    /// Task mode, which sets the adversary count
    #[arg(short, long, value_enum, default_value_t = TaskArg::Explore)]
    pub task: TaskArg,

    /// Decision cap per episode; the task default when omitted
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Engine ticks each action is held for
    #[arg(long, default_value = "8")]
    pub ticks_per_decision: usize,

    /// Seed for the engine and action sampling
    #[arg(long)]
    pub seed: Option<u64>,
}
