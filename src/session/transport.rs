use super::*;

use once_cell::sync::Lazy;
use regex::Regex;

static DEVICE_ERROR: Lazy<Regex> = Lazy::new(|| match Regex::new(r"^ERR ([+-]?\d+)$") {
    Ok(re) => re,
    Err(err) => panic!("invalid DEVICE_ERROR regex: {err}"),
});

/// Writes `command` and reads back one reply on a Ready connection.
///
/// The command must already be newline-terminated. A non-empty first line
/// is the reply. An empty first line means the device is reporting an
/// error on the line that follows, which is decoded into
/// [`SwitcherError::DeviceError`].
///
/// Uses the context deadline, or 10 seconds if it has none. Nothing is
/// retried here.
pub async fn exchange(conn: &mut Connection, ctx: &Context, command: &[u8]) -> Result<String> {
    let deadline = ctx.deadline_or(COMMAND_TIMEOUT);

    trace!("{} >> {:?}", conn.peer, String::from_utf8_lossy(command));
    ctx.guard(deadline, async {
        let written = conn.stream.write(command).await?;
        if written != command.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {}/{} bytes", written, command.len()),
            ));
        }
        conn.stream.flush().await
    })
    .await
    .map_err(SwitcherError::WriteError)?;

    let reply = read_line(conn, ctx, deadline).await?;
    if !reply.is_empty() {
        trace!("{} << {:?}", conn.peer, reply);
        return Ok(reply);
    }

    // empty line: the error is on the next one
    let line = read_line(conn, ctx, deadline).await?;
    trace!("{} << error {:?}", conn.peer, line);
    Err(device_error(&line))
}

/// Reads through the next carriage return and trims the result.
async fn read_line(conn: &mut Connection, ctx: &Context, deadline: Instant) -> Result<String> {
    let mut line = Vec::new();
    ctx.guard(deadline, conn.stream.read_until(LINE_TERMINATOR, &mut line))
        .await
        .map_err(SwitcherError::ReadError)?;

    if line.last() != Some(&LINE_TERMINATOR) {
        return Err(SwitcherError::ReadError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed mid-response",
        )));
    }

    Ok(String::from_utf8_lossy(&line).trim().to_string())
}

/// Decodes the line that follows an empty reply.
fn device_error(line: &str) -> SwitcherError {
    let code = DEVICE_ERROR
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok());

    match code {
        Some(code) => SwitcherError::DeviceError {
            code: Some(code),
            message: catalog::description(code).to_string(),
        },
        None => SwitcherError::DeviceError {
            code: None,
            message: line.to_string(),
        },
    }
}
