use thiserror::Error;

mod app_config;
mod config;
mod types;

pub use app_config::{AppConfig, Environment, SelectLineConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{RemoteArticle, RemoteGroup};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),
    #[error("environment variable {var} has an invalid value: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
