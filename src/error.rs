//! Error types for Protocol-3000 connections and command exchanges.
//!
//! Each variant names the phase that failed, so callers can tell a dead
//! link apart from a device that answered with an error.

use std::io;

use thiserror::Error;

/// Errors that can occur while talking to a Protocol-3000 device.
#[derive(Error, Debug)]
pub enum SwitcherError {
    /// The TCP dial to the device's control port failed.
    #[error("unable to connect to {addr}: {source}")]
    ConnectError {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// No pooled connection became available before the deadline or
    /// cancellation. Nothing was dialed or written.
    #[error("unable to lease a connection to {addr}: {source}")]
    LeaseError {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The device's welcome banner was not fully received.
    ///
    /// A connection that fails here is closed and never handed out.
    #[error("unable to read welcome line: {0}")]
    HandshakeError(#[source] io::Error),

    /// Writing the command failed or was short.
    #[error("unable to write command: {0}")]
    WriteError(#[source] io::Error),

    /// Reading the response (or the error line that follows an empty
    /// response) failed.
    #[error("unable to read response: {0}")]
    ReadError(#[source] io::Error),

    /// The device signalled an error with an empty line followed by an
    /// error line.
    ///
    /// `code` is set when the line had the `ERR <n>` form and `message` is
    /// then the catalog description; otherwise `message` is the raw line.
    #[error("{}", device_message(.code, .message))]
    DeviceError { code: Option<i64>, message: String },

    /// The reply did not follow the expected grammar.
    #[error("unexpected response: {0:?}")]
    ParseError(String),

    /// The liveness reply did not contain `OK`.
    #[error("unexpected response: {0:?}")]
    HealthCheckError(String),
}

impl SwitcherError {
    /// Returns true when the connection the error happened on can no longer
    /// be trusted and must be discarded instead of returned to the pool.
    pub fn is_broken_connection(&self) -> bool {
        matches!(
            self,
            SwitcherError::ConnectError { .. }
                | SwitcherError::HandshakeError(_)
                | SwitcherError::WriteError(_)
                | SwitcherError::ReadError(_)
        )
    }

    /// Numeric device error code, if the device reported one.
    pub fn device_code(&self) -> Option<i64> {
        match self {
            SwitcherError::DeviceError { code, .. } => *code,
            _ => None,
        }
    }
}

fn device_message(code: &Option<i64>, message: &str) -> String {
    match code {
        Some(code) => format!("{code}: {message}"),
        None => message.to_string(),
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SwitcherError>;
