//! Protocol-3000 numeric error codes.
//!
//! Descriptions follow the published protocol table (Protocol 3000 user
//! manual, error code listing). Codes outside the table render with an empty
//! description rather than being rejected.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static ERROR_TEXT: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (1, "Protocol Syntax"),
        (2, "Command not available"),
        (3, "Parameter out of range"),
        (4, "Unauthorized access"),
        (5, "Internal FW Error"),
        (6, "Protocol busy"),
        (7, "Wrong CRC"),
        (8, "Timeout"),
        (9, "(Reserved)"),
        (10, "Not enough space for data (firmware, FPGA...)"),
        (11, "Not enough space - file system"),
        (12, "File does not exist"),
        (13, "File can't be created"),
        (14, "File can't open"),
        (15, "(Reserved)"),
        (16, "(Reserved)"),
        (17, "(Reserved)"),
        (18, "(Reserved)"),
        (19, "(Reserved)"),
        (20, "(Reserved)"),
        (21, "Packet CRC error"),
        (22, "Packet number isn't expected (missing packet)"),
        (23, "Packet size is wrong"),
        (24, "(Reserved)"),
        (25, "(Reserved)"),
        (26, "(Reserved)"),
        (27, "(Reserved)"),
        (28, "(Reserved)"),
        (29, "(Reserved)"),
        (30, "EDID corrupted"),
        (31, "Device specific errors"),
        (32, "File has the same CRC - no changed"),
        (33, "Wrong operation mode"),
        (34, "Device/chip was not initalized"),
    ])
});

/// Returns the bare description for `code`, empty if the code is unknown.
pub fn description(code: i64) -> &'static str {
    ERROR_TEXT.get(&code).copied().unwrap_or("")
}

/// Renders `code` as `"<code>: <description>"`.
pub fn render(code: i64) -> String {
    format!("{}: {}", code, description(code))
}

#[cfg(test)]
mod tests {
    use super::{description, render};

    const PUBLISHED: [&str; 34] = [
        "Protocol Syntax",
        "Command not available",
        "Parameter out of range",
        "Unauthorized access",
        "Internal FW Error",
        "Protocol busy",
        "Wrong CRC",
        "Timeout",
        "(Reserved)",
        "Not enough space for data (firmware, FPGA...)",
        "Not enough space - file system",
        "File does not exist",
        "File can't be created",
        "File can't open",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "Packet CRC error",
        "Packet number isn't expected (missing packet)",
        "Packet size is wrong",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "(Reserved)",
        "EDID corrupted",
        "Device specific errors",
        "File has the same CRC - no changed",
        "Wrong operation mode",
        "Device/chip was not initalized",
    ];

    #[test]
    fn renders_every_published_code() {
        for (code, text) in (1..).zip(PUBLISHED) {
            assert_eq!(description(code), text, "code {code}");
            assert_eq!(render(code), format!("{code}: {text}"));
        }
    }

    #[test]
    fn renders_known_descriptions() {
        assert_eq!(render(1), "1: Protocol Syntax");
        assert_eq!(render(3), "3: Parameter out of range");
        assert_eq!(render(6), "6: Protocol busy");
        assert_eq!(render(30), "30: EDID corrupted");
        assert_eq!(render(34), "34: Device/chip was not initalized");
    }

    #[test]
    fn reserved_slots_use_placeholder() {
        for code in [9, 15, 16, 17, 18, 19, 20, 24, 25, 26, 27, 28, 29] {
            assert_eq!(description(code), "(Reserved)");
        }
    }

    #[test]
    fn unknown_code_renders_empty_description() {
        assert_eq!(render(999), "999: ");
        assert_eq!(render(0), "0: ");
        assert_eq!(render(-1), "-1: ");
    }
}
