//! Protocol constants and construction-time device options.
//!
//! Timeouts here are the fallbacks used when the caller's [`Context`]
//! carries no deadline of its own.
//!
//! [`Context`]: crate::context::Context

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// TCP port Protocol-3000 devices listen on for control connections.
pub const CONTROL_PORT: u16 = 5000;

/// Carriage return, the physical line terminator on the wire.
pub const LINE_TERMINATOR: u8 = 0x0d;

/// Budget for dialing and reading the welcome banner.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for one command write and its response read.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// How long an idle connection stays eligible for reuse.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Minimum gap between two uses of the same connection.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Number of physical connections kept per device.
///
/// Switchers accept few concurrent control sessions, so exchanges are
/// serialized over a single link.
pub const MAX_CONNECTIONS: usize = 1;

/// Options applied once when a [`Device`](crate::device::Device) is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DeviceOptions {
    /// Idle time after which a pooled connection is closed and redialed on
    /// next use. Defaults to 30 seconds.
    pub ttl: Duration,

    /// Minimum delay between successive uses of one connection. Defaults to
    /// 500 milliseconds.
    pub delay: Duration,

    /// Emit pool lifecycle messages through the `log` facade. Off by
    /// default.
    pub logging: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            delay: DEFAULT_DELAY,
            logging: false,
        }
    }
}

impl DeviceOptions {
    /// Sets the idle time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the minimum delay between uses of one connection.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Turns pool lifecycle logging on or off.
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }
}
