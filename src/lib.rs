//! tqalert - trading data liveness monitor
//!
//! This library provides the core functionality for watching per-symbol tick
//! and quote activity markers against weekday/time-window rules and running
//! alert commands when a feed goes quiet.
//!
//! # Modules
//!
//! - [`alerts`]: Alert rendering, muting and dispatch
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Process settings
//! - [`control`]: File-based control signals
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`probe`]: Activity marker access
//! - [`rules`]: Configuration record parsing
//! - [`services`]: Evaluation and the monitor loop
//! - [`store`]: Configuration store adapter

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod control;
pub mod domain;
pub mod error;
pub mod probe;
pub mod rules;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod mock;

pub use error::{AppError, Result};
