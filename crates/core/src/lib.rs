//! Scribe Core Library
//!
//! This crate provides the foundational utilities for Scribe:
//! - Error handling (`AppError`, `AppResult`, `FailureKind`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, FailureKind};
