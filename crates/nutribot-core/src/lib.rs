//! Shared domain types, errors and configuration for NutriBot.

pub mod config;
pub mod error;
pub mod types;

pub use config::NutriConfig;
pub use error::{NutriError, Result};
pub use types::*;
