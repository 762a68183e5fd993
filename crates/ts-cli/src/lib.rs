//! Calendar time report CLI library.
//!
//! This crate provides the CLI interface for timesplit.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, ClassifyArgs, Commands, ReportArgs};
pub use config::Config;
