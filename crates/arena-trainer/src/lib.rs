//! # Arena Trainer
//!
//! Command-line front end for the tile-arena exploration agent: argument
//! parsing, layered configuration, and the `train` and `watch` commands.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod app;
pub mod cli;
pub mod config;

pub use app::{exit_status, install_shutdown_listener, train, watch};
pub use cli::{Cli, Command, PolicyKind, TaskArg, TrainArgs, WatchArgs};
pub use config::{resolve, FileConfig};
