use super::*;

/// Dials a device's control port and waits out its welcome banner.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    addr: String,
}

impl TcpDialer {
    /// Targets `host` on the standard control port.
    pub fn new(host: impl AsRef<str>) -> Self {
        Self::with_port(host, config::CONTROL_PORT)
    }

    /// Targets `host` on an explicit port.
    pub fn with_port(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host.as_ref(), port),
        }
    }

    async fn connect(&self, ctx: &Context) -> Result<Connection> {
        let stream = ctx
            .guard(
                ctx.deadline_or(HANDSHAKE_TIMEOUT),
                TcpStream::connect(&self.addr),
            )
            .await
            .map_err(|source| SwitcherError::ConnectError {
                addr: self.addr.clone(),
                source,
            })?;
        debug!("{} TCP connection successful", self.addr);

        let mut conn = Connection::new(stream, self.addr.clone());
        // The deadline restarts once the socket is up.
        handshake(&mut conn, ctx, ctx.deadline_or(HANDSHAKE_TIMEOUT)).await?;
        debug!("{} welcome line received", self.addr);

        Ok(conn)
    }
}

impl Dial for TcpDialer {
    fn dial<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<Connection>> {
        Box::pin(self.connect(ctx))
    }

    fn addr(&self) -> &str {
        &self.addr
    }
}

/// Consumes the welcome banner: everything up to and including the first
/// carriage return, plus anything already buffered behind it.
///
/// On failure the caller drops `conn`, which closes the socket.
pub(super) async fn handshake(
    conn: &mut Connection,
    ctx: &Context,
    deadline: Instant,
) -> Result<()> {
    let mut banner = Vec::new();
    ctx.guard(deadline, conn.stream.read_until(LINE_TERMINATOR, &mut banner))
        .await
        .map_err(|e| {
            debug!("{} welcome line failed: {}", conn.peer, e);
            SwitcherError::HandshakeError(e)
        })?;

    if banner.last() != Some(&LINE_TERMINATOR) {
        debug!("{} closed before welcome line completed", conn.peer);
        return Err(SwitcherError::HandshakeError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before welcome line",
        )));
    }

    trace!("{} welcome: {:?}", conn.peer, String::from_utf8_lossy(&banner));
    conn.discard_buffered();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn handshake_consumes_banner_up_to_carriage_return() {
        let (client, mut device) = tokio::io::duplex(256);
        device
            .write_all(b"Welcome to Kramer Electronics\r\n")
            .await
            .unwrap();

        let mut conn = Connection::new(client, "test");
        let ctx = Context::background();
        handshake(&mut conn, &ctx, ctx.deadline_or(Duration::from_secs(1)))
            .await
            .expect("handshake");
        assert_eq!(conn.stream.buffer().len(), 0);
    }

    #[tokio::test]
    async fn handshake_accepts_banner_split_across_reads() {
        let (client, mut device) = tokio::io::duplex(256);
        let writer = tokio::spawn(async move {
            device.write_all(b"Welcome").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            device.write_all(b" back\r").await.unwrap();
            device
        });

        let mut conn = Connection::new(client, "test");
        let ctx = Context::background();
        handshake(&mut conn, &ctx, ctx.deadline_or(Duration::from_secs(1)))
            .await
            .expect("handshake");
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn missing_banner_times_out_as_handshake_error() {
        let (client, _device) = tokio::io::duplex(256);
        let mut conn = Connection::new(client, "test");
        let ctx = Context::with_timeout(Duration::from_millis(50));

        let err = handshake(&mut conn, &ctx, ctx.deadline_or(HANDSHAKE_TIMEOUT))
            .await
            .unwrap_err();
        match err {
            SwitcherError::HandshakeError(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("expected handshake error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn banner_without_terminator_is_handshake_error() {
        let (client, mut device) = tokio::io::duplex(256);
        device.write_all(b"Welcome").await.unwrap();
        drop(device);

        let mut conn = Connection::new(client, "test");
        let ctx = Context::background();
        let err = handshake(&mut conn, &ctx, ctx.deadline_or(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SwitcherError::HandshakeError(_)));
    }

    #[test]
    fn dialer_defaults_to_control_port() {
        assert_eq!(TcpDialer::new("10.0.0.5").addr(), "10.0.0.5:5000");
        assert_eq!(TcpDialer::with_port("localhost", 6000).addr(), "localhost:6000");
    }
}
