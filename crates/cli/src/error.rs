//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No agent has the given id.
    #[error("no agent with id '{id}'. Run 'convoy agents list'")]
    AgentNotFound { id: String },

    /// A required agent field was left blank.
    #[error("{0} is required.")]
    Required(&'static str),

    /// A tool name outside the built-in catalog.
    #[error("unknown tool '{name}'. Known tools: {known}")]
    UnknownTool { name: String, known: String },

    /// The registry is empty, so there is nobody to talk to.
    #[error("no agents defined. Run 'convoy agents add'")]
    NoAgents,

    /// The platform data directory could not be determined.
    #[error("could not determine a data directory; set XDG_DATA_HOME")]
    NoDataDir,

    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<runtime::ModelError> for Error {
    fn from(err: runtime::ModelError) -> Self {
        Self::Runtime(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
