//! Error types of the bot.
//!
//! `AppError` is the top-level error returned from startup, services and the
//! processor callbacks. Domain-specific errors live in their own modules and are
//! wrapped transparently.

pub mod config;
pub mod processor;

use thiserror::Error;

use crate::error::{config::ConfigError, processor::ProcessorError};

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Event processor error (coalescing invariant violation or stopped loop).
    #[error(transparent)]
    ProcessorErr(#[from] ProcessorError),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// Cron scheduler error.
    #[error(transparent)]
    SchedulerErr(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// Failure reading the reaction roles file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed reaction roles file.
    #[error(transparent)]
    JsonErr(#[from] serde_json::Error),

    /// Guild member or role that is expected to exist could not be found.
    #[error("{0}")]
    NotFound(String),
}

/// Manual conversion from serenity::Error to AppError.
///
/// Boxes the error to reduce the size of the AppError enum, as serenity::Error
/// is very large and would make all AppError variants larger if not boxed.
impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::DiscordErr(Box::new(err))
    }
}
