//! CLI module for tourtrack - command-line interface and subcommands.
//!
//! Runs the tracker until a shutdown signal, or performs one-off queries
//! against the configured services.

pub mod commands;

pub use commands::Cli;
