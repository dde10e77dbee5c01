//! Shared types for the picklebay native shell: location results, the
//! error taxonomy, callback adapters, and environment configuration.

pub mod app_config;
pub mod config;
pub mod location;
pub mod resolver;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use location::{Coordinates, ErrorKind, LatLng, LocationError, Outcome};
pub use resolver::{await_resolution, pending, Resolver, WaitError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
