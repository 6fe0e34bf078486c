//! Error types and handling for FSH validation orchestration

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FSH validation operations
#[derive(Debug, Error)]
pub enum FshvError {
    /// An input file or directory does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A compiler-generated resource file is not valid JSON or is missing
    /// a required field. The whole index build is aborted because later
    /// resolution assumes a complete index.
    #[error("Malformed generated artifact '{file}': {message}")]
    Artifact { file: PathBuf, message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An instance declared in FSH source has no generated counterpart,
    /// which means the compiler output and the source are out of sync.
    #[error(
        "Instance '{instance}' declared in '{file}' has no generated resource (compiler output and source are out of sync)"
    )]
    MissingInstance { instance: String, file: PathBuf },

    /// StructureDefinition base pointers form a cycle in the generated
    /// artifacts. This is an upstream data defect and is never repaired
    /// silently.
    #[error("Cyclic profile chain: {chain}")]
    CyclicProfileChain { chain: String },

    /// An external command (e.g. the FSH compiler) failed
    #[error("Command failed: {message}")]
    Command { message: String },

    /// Internal invariant violations
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    Io,
    Artifact,
    Config,
    MissingInstance,
    CyclicProfileChain,
    Command,
    Internal,
}

impl FshvError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FshvError::FileNotFound { .. } => ErrorKind::FileNotFound,
            FshvError::Io { .. } => ErrorKind::Io,
            FshvError::Artifact { .. } => ErrorKind::Artifact,
            FshvError::Config { .. } => ErrorKind::Config,
            FshvError::MissingInstance { .. } => ErrorKind::MissingInstance,
            FshvError::CyclicProfileChain { .. } => ErrorKind::CyclicProfileChain,
            FshvError::Command { .. } => ErrorKind::Command,
            FshvError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Create a file-not-found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed-artifact error naming the offending file
    pub fn artifact_error(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Artifact {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a command error
    pub fn command_error(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for FshvError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}
