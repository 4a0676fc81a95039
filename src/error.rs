//! Error type shared by the library.
//!
//! Measurement failures never surface here: they are folded into
//! [`Measurement::Unavailable`](crate::Measurement::Unavailable) by the sweep.
//! Everything else that can stop a run (no instrument, a failed configuration
//! write, an unwritable log file) is an [`Error`].

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No instruments found. Connect the instrument and try again.")]
    NoInstrument,

    /// A command or query could not be completed by the session.
    #[error("Instrument session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Rejected form input. The message is meant for the user.
    #[error("{title}: {message}")]
    InvalidInput { title: String, message: String },

    #[error("A trial is already running")]
    Busy,

    #[error("Trial worker panicked")]
    WorkerPanicked,

    #[error("GUI error: {0}")]
    Gui(String),

    #[error("Feature '{0}' is not enabled. Build with --features {0} or choose another --backend")]
    FeatureNotEnabled(String),
}

impl Error {
    pub(crate) fn invalid_input(title: &str, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            title: title.to_string(),
            message: message.into(),
        }
    }
}
