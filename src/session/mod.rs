//! Connection lifecycle and command exchange for Protocol-3000 devices.
//!
//! This module owns everything that touches the socket: dialing and the
//! welcome-banner handshake, the one-command-one-reply exchange, and the
//! default pool that leases connections to exchanges.
//!
//! # Main Components
//!
//! - [`ConnectionPool`] - Seam for "run this with an exclusive live connection"
//! - [`ConnectionManager`] - Default pool backed by a moka idle cache
//! - [`TcpDialer`] - Dials the control port and consumes the welcome banner
//! - [`exchange`] - Writes one command and reads back one semantic reply

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, trace};
use moka::future::Cache;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::catalog;
use crate::config::{self, COMMAND_TIMEOUT, HANDSHAKE_TIMEOUT, LINE_TERMINATOR};
use crate::context::Context;
use crate::error::{Result, SwitcherError};

pub use factory::TcpDialer;
pub use manager::ConnectionManager;
pub use transport::exchange;

/// An owned, pinned, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Byte stream a [`Connection`] can be built on.
pub trait DeviceStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DeviceStream for T {}

/// A live link to a device that has completed the welcome handshake.
///
/// Reads are buffered; bytes that arrive after one reply stay with the
/// connection for the next exchange.
pub struct Connection {
    stream: BufReader<Box<dyn DeviceStream>>,
    peer: String,
}

impl Connection {
    /// Wraps an already-handshaken stream.
    pub fn new(stream: impl DeviceStream + 'static, peer: impl Into<String>) -> Self {
        Self {
            stream: BufReader::new(Box::new(stream)),
            peer: peer.into(),
        }
    }

    /// Address of the device at the other end.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Drops whatever is sitting in the read buffer.
    fn discard_buffered(&mut self) {
        let pending = self.stream.buffer().len();
        if pending > 0 {
            trace!("{} discarding {} buffered bytes", self.peer, pending);
        }
        Pin::new(&mut self.stream).consume(pending);
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("buffered", &self.stream.buffer().len())
            .finish()
    }
}

/// Creates Ready connections on demand.
pub trait Dial: Send + Sync + 'static {
    /// Opens a connection and completes the handshake before returning it.
    fn dial<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<Connection>>;

    /// Address the dialer connects to, for diagnostics.
    fn addr(&self) -> &str;
}

/// Leases live connections to one exchange at a time.
///
/// Implementations run `op` with exclusive use of a Ready connection. A
/// connection whose operation failed at the I/O level must be discarded,
/// never handed to another caller.
pub trait ConnectionPool: Send + Sync {
    /// Runs `op` on a leased connection and settles the lease by its outcome.
    fn run<'a, T, F>(&'a self, ctx: &'a Context, op: F) -> BoxFuture<'a, Result<T>>
    where
        T: Send + 'a,
        F: for<'c> FnOnce(&'c mut Connection, &'c Context) -> BoxFuture<'c, Result<T>>
            + Send
            + 'a;
}

mod factory;
mod manager;
mod transport;
