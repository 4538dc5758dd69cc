//! Traffic Agent Configuration Library
//!
//! Layered configuration for a traffic intersection monitoring agent and
//! the environment-only settings of its dashboard.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod logging;

pub use config::{ConfigPaths, ConfigResolver, ConfigTree};
pub use dashboard::DashboardSettings;
pub use error::{ConfigError, Result};
