//! mozusync command line library
//!
//! Configuration, the four sync actions, the orchestrator that runs them,
//! and the watch aggregator that feeds changed paths back into configuration.

pub mod actions;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod file_discovery;
pub mod orchestrators;
pub mod output;
pub mod prompt;
pub mod terminal;
pub mod watch;
