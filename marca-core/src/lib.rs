pub mod browser;
pub mod checker;
pub mod config;
pub mod error;
pub mod handles;
pub mod registry;

pub use checker::{AvailabilityChecker, AvailabilityReport};
pub use config::{load_checker_config, CheckerConfig, RegistryCredentials};
pub use error::{ConfigError, Result};
