//! Typed operations on a Protocol-3000 matrix switcher.
//!
//! A [`Device`] builds the command for each operation, runs it through its
//! connection pool and decodes the reply. It holds no state of its own
//! beyond the pool, so it can be shared between tasks.

use log::debug;

use crate::config::DeviceOptions;
use crate::context::Context;
use crate::error::Result;
use crate::protocol::{self, RoutingTable};
use crate::session::{ConnectionManager, ConnectionPool, TcpDialer, exchange};

/// Handle to one switcher.
pub struct Device<P = ConnectionManager<TcpDialer>> {
    addr: String,
    pool: P,
}

impl Device {
    /// Creates a handle for the switcher at `addr` (a host name or IP
    /// address; the control port is fixed).
    ///
    /// No connection is opened until the first operation.
    pub fn new(addr: impl Into<String>, options: DeviceOptions) -> Self {
        let addr = addr.into();
        let pool = ConnectionManager::new(
            TcpDialer::new(&addr),
            options.ttl,
            options.delay,
            options.logging,
        );
        Self { addr, pool }
    }
}

impl<P: ConnectionPool> Device<P> {
    /// Creates a handle that leases connections from `pool`.
    pub fn with_pool(addr: impl Into<String>, pool: P) -> Self {
        Self {
            addr: addr.into(),
            pool,
        }
    }

    /// Host the device was created for.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The pool commands are run through.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Sends a raw Protocol-3000 command and returns the trimmed reply.
    ///
    /// A trailing newline is appended if `command` lacks one.
    pub async fn send_command(&self, ctx: &Context, command: &str) -> Result<String> {
        let mut command = command.as_bytes().to_vec();
        if command.last() != Some(&b'\n') {
            command.push(b'\n');
        }
        self.send(ctx, command).await
    }

    async fn send(&self, ctx: &Context, command: Vec<u8>) -> Result<String> {
        self.pool
            .run(ctx, move |conn, ctx| {
                Box::pin(async move { exchange(conn, ctx, &command).await })
            })
            .await
    }

    /// Returns the current routing table, keyed by output.
    pub async fn get_routing_table(&self, ctx: &Context) -> Result<RoutingTable> {
        let resp = self.send(ctx, protocol::QUERY_ROUTING.to_vec()).await?;
        protocol::parse_routing_table(&resp)
    }

    /// Routes `input` to `output`.
    ///
    /// Succeeds only if the device echoes back exactly the requested pair.
    pub async fn set_route(&self, ctx: &Context, output: &str, input: &str) -> Result<()> {
        let resp = self
            .send(ctx, protocol::set_route_command(input, output))
            .await?;
        protocol::verify_route_echo(&resp, input, output)?;
        debug!("{} routed input {} to output {}", self.addr, input, output);
        Ok(())
    }

    /// Checks that the device answers the routing query with `OK`.
    pub async fn healthy(&self, ctx: &Context) -> Result<()> {
        let resp = self.send(ctx, protocol::HEALTH_PROBE.to_vec()).await?;
        protocol::check_health(&resp)
    }

    /// Checks that the device answers the bare `#` handshake with `OK`.
    pub async fn ping(&self, ctx: &Context) -> Result<()> {
        let resp = self.send(ctx, protocol::PING.to_vec()).await?;
        protocol::check_health(&resp)
    }
}
