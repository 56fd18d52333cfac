pub mod config;
pub mod error;
pub mod logging;

pub use config::{CloakConfig, KdfConfig, LoggingConfig};
pub use error::{CloakError, CloakResult};
