/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for emulated file operations
pub type EmuResult<T> = Result<T, EmuError>;

/// Emulated file table errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum EmuError {
    #[error("Emulated file table full: all {capacity} slots in use")]
    #[diagnostic(
        code(emufile::table_full),
        help("Unregister an emulated file before registering another one.")
    )]
    TableFull { capacity: usize },

    #[error("Descriptor {0} is not an emulated file")]
    #[diagnostic(
        code(emufile::invalid_descriptor),
        help("The descriptor is outside the emulated range or its slot is empty.")
    )]
    InvalidDescriptor(i32),

    #[error("Stream token {0:#x} is not an emulated file")]
    #[diagnostic(
        code(emufile::invalid_stream),
        help("The token was never issued by this table or its slot has been reused.")
    )]
    InvalidStream(u64),

    #[error("Emulated file {0} has no open file behind it")]
    #[diagnostic(
        code(emufile::closed),
        help("The file was closed or handed back to its owner during unregistration.")
    )]
    Closed(i32),

    #[error("Timed out waiting for the lock on emulated file {0}")]
    #[diagnostic(
        code(emufile::lock_timeout),
        help("Another thread holds the slot lock. Raise the lock timeout or release the lock.")
    )]
    LockTimeout(i32),

    #[error("Failed to close emulated file {descriptor}: {reason}")]
    #[diagnostic(code(emufile::close_failed))]
    CloseFailed { descriptor: i32, reason: String },

    #[error("I/O error on emulated file {descriptor} ({kind}): {message}")]
    #[diagnostic(code(emufile::io))]
    Io {
        descriptor: i32,
        /// `std::io::ErrorKind` in its `Debug` form
        kind: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(emufile::config),
        help("Check EMUFILE_* environment variables or the JSON configuration.")
    )]
    Config(String),
}

impl EmuError {
    pub(crate) fn io(descriptor: i32, err: &std::io::Error) -> Self {
        Self::Io {
            descriptor,
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    pub(crate) fn close_failed(descriptor: i32, err: &std::io::Error) -> Self {
        Self::CloseFailed {
            descriptor,
            reason: err.to_string(),
        }
    }
}

/// Registration rejected because the table is full
///
/// Carries the file back so a full table never drops (and closes) it.
pub struct RegisterError<F> {
    file: F,
    capacity: usize,
}

impl<F> RegisterError<F> {
    pub(crate) fn new(file: F, capacity: usize) -> Self {
        Self { file, capacity }
    }

    /// The rejected file
    pub fn file(&self) -> &F {
        &self.file
    }

    /// Take back ownership of the rejected file
    pub fn into_file(self) -> F {
        self.file
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The error without the file attached
    pub fn error(&self) -> EmuError {
        EmuError::TableFull {
            capacity: self.capacity,
        }
    }
}

impl<F> fmt::Debug for RegisterError<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterError")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<F> fmt::Display for RegisterError<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error(), f)
    }
}

impl<F> std::error::Error for RegisterError<F> {}

impl<F> From<RegisterError<F>> for EmuError {
    fn from(err: RegisterError<F>) -> Self {
        err.error()
    }
}
