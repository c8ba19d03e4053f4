use thiserror::Error;

/// Catalog resolution failures
///
/// Logged by the scheduler; the request is dropped.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("No sound registered with id: {0}")]
    UnknownSound(String),

    #[error("No sound registered for clip: {0}")]
    UnknownClip(String),
}

/// Channel pool failures
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Channel pool for group {group} is exhausted")]
    Exhausted { group: String },

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine platform config directory")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to load sound bank from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Duplicate sound id in bank: {0}")]
    DuplicateId(String),

    #[error("Sound bank is empty")]
    Empty,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
