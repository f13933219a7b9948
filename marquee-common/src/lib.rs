//! # Marquee Common Library
//!
//! Shared code for the Marquee catalog server:
//! - Database schema, initialisation and catalog models
//! - Settings store contract and its SQLite adapter
//! - Configuration loading
//! - Injected clock for time-dependent logic

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
pub use time::{Clock, ManualClock, SystemClock};
