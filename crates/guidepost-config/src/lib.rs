//! # Guidepost Config
//!
//! Configuration management for guidepost: the TOML schema with defaults
//! for every tunable, a loader with `${VAR}` substitution and a validator.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
