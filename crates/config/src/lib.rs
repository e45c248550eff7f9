// Configuration loading

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{IngestSettings, SearchSettings, Settings, SourceConfig, CONFIG_ENV};
