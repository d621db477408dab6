use thiserror::Error;

mod app_config;
mod config;
mod models;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use models::{
    AvailabilityResult, Catalog, CenterEntry, DateWindow, Facility, Session, TimeSlot,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
