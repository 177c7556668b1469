use miette::Diagnostic;
use thiserror::Error;

/// Main error type for flatten operations
#[derive(Error, Diagnostic, Debug)]
pub enum FlattenError {
    #[error("IO error: {0}")]
    #[diagnostic(code(resflat::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(resflat::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(resflat::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Usage error: {message}")]
    #[diagnostic(code(resflat::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl FlattenError {
    /// Wrap an I/O failure with the path it happened on.
    pub fn io(path: impl Into<std::path::PathBuf>, context: &str, err: std::io::Error) -> Self {
        FlattenError::Io {
            path: path.into(),
            message: format!("{}: {}", context, err),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlattenError>;
