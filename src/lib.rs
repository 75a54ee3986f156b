//! # rp3000 - Protocol-3000 Matrix Switcher Driver
//!
//! `rp3000` controls AV matrix switchers that speak the ASCII Protocol-3000
//! command set over a raw TCP control connection. It hides dialing, the
//! welcome-banner handshake, connection reuse and device error decoding
//! behind a small typed API.
//!
//! ## Features
//!
//! - **Connection Pooling**: Reuses a handshaken connection until it has been idle for the configured TTL
//! - **Exclusive Leases**: Exactly one command/reply exchange runs on a connection at a time
//! - **Deadlines and Cancellation**: Every network step is bounded by the caller's [`context::Context`]
//! - **Device Errors**: Two-phase `ERR <n>` replies are decoded through the published error table
//! - **Async/Await**: Built on Tokio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rp3000::config::DeviceOptions;
//! use rp3000::context::Context;
//! use rp3000::device::Device;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = Device::new("192.168.1.50", DeviceOptions::default());
//!     let ctx = Context::with_timeout(Duration::from_secs(5));
//!
//!     device.healthy(&ctx).await?;
//!     device.set_route(&ctx, "2", "3").await?;
//!
//!     for (output, input) in &device.get_routing_table(&ctx).await? {
//!         println!("output {output} <- input {input}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`device::Device`] - Routing and liveness operations
//! - [`session::ConnectionManager`] - Default connection pool
//! - [`session::ConnectionPool`] - Seam for substituting another pool
//! - [`error::SwitcherError`] - Error types, one per failing phase
//! - [`catalog`] - Protocol-3000 numeric error descriptions

pub mod catalog;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod protocol;
pub mod session;
