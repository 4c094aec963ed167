//! Core logic for the hello bot.
//!
//! This crate is framework-agnostic. Telegram lives behind ports (traits)
//! implemented in the adapter crate.

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod idle;
pub mod lifecycle;
pub mod logging;
pub mod messaging;
pub mod shutdown;

pub use errors::{Error, Result};
