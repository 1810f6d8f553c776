pub mod config;
pub mod logging;

pub use config::{ConfigError, PlayerConfig};
pub use logging::init_logger;
