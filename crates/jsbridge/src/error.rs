//! Error types surfaced at the embedding boundary.

use crate::config::ConfigError;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by runtimes, contexts and engines
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Runtime or context allocation failed
    #[error("Failed to initialize engine: {0}")]
    EngineInit(String),

    /// Script code threw; the context remains usable
    #[error("{origin}: {message}")]
    Script {
        /// Origin label of the evaluated source (`<eval>`, a path, a function name)
        origin: String,
        /// The thrown value coerced to a string
        message: String,
        /// Stack trace when the thrown value carried one
        stack: Option<String>,
    },

    /// Named global is missing or not invocable
    #[error("Not a function: {name}")]
    NotCallable { name: String },

    /// Script file could not be read
    #[error("Failed to open file: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid engine configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for recoverable script-level throws
    pub fn is_script(&self) -> bool {
        matches!(self, Error::Script { .. })
    }

    /// Message of a script error, if this is one
    pub fn script_message(&self) -> Option<&str> {
        match self {
            Error::Script { message, .. } => Some(message),
            _ => None,
        }
    }
}
