//! Backup import and export for a to-do datastore.
//!
//! This module exports the core components for testing and integration.

pub mod backup;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod progress;
pub mod types;
