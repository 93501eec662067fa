//! Core domain + application logic for the finance assistant bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and Google Sheets
//! live behind ports (traits) implemented in adapter crates.

pub mod amount;
pub mod assistant;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod state;
pub mod store;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
