//! Protocol-3000 request encoders and reply decoders.
//!
//! Replies handed to these functions are already trimmed success payloads;
//! the two-phase error convention is handled by the transport before any
//! parser sees a reply.

use std::collections::HashMap;
use std::collections::hash_map;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitcherError};

/// Token separating a reply header from the video-routing payload.
pub const ROUTING_MARKER: &str = "VID";

/// Queries every output's current input.
pub const QUERY_ROUTING: &[u8] = b"#VID? *\n";

/// Liveness probe; a healthy device answers the routing query with `OK`.
pub const HEALTH_PROBE: &[u8] = b"#VID? *\n";

/// Bare protocol handshake, answered with `~01@ OK`.
pub const PING: &[u8] = b"#\n";

const HEALTH_MARKER: &str = "OK";

/// Current video routing: output identifier to input identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RoutingTable(HashMap<String, String>);

impl RoutingTable {
    /// The input currently routed to `output`.
    pub fn input_for(&self, output: &str) -> Option<&str> {
        self.0.get(output).map(String::as_str)
    }

    /// Number of outputs in the table.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the device reported no outputs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(output, input)` pairs in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Consumes the table, returning the output-to-input map.
    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl From<HashMap<String, String>> for RoutingTable {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl<'a> IntoIterator for &'a RoutingTable {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Encodes a request routing `input` to `output` (`#VID <input>><output>`).
pub fn set_route_command(input: &str, output: &str) -> Vec<u8> {
    format!("#{ROUTING_MARKER} {input}>{output}\n").into_bytes()
}

/// Splits a reply on the routing marker and returns the `input>output`
/// pairs of its payload, in wire order.
fn routing_pairs(resp: &str) -> Result<Vec<(&str, &str)>> {
    // reply looks like: ~01@VID 2>1 ,2>2 ,2>3 ,2>4
    let segments: Vec<&str> = resp.split(ROUTING_MARKER).collect();
    let &[_, payload] = segments.as_slice() else {
        return Err(SwitcherError::ParseError(resp.to_string()));
    };

    payload
        .split(',')
        .map(|pair| {
            let tokens: Vec<&str> = pair.trim().split('>').map(str::trim).collect();
            match tokens.as_slice() {
                [input, output] if !input.is_empty() && !output.is_empty() => {
                    Ok((*input, *output))
                }
                _ => Err(SwitcherError::ParseError(resp.to_string())),
            }
        })
        .collect()
}

/// Decodes a routing query reply into a table keyed by output.
pub fn parse_routing_table(resp: &str) -> Result<RoutingTable> {
    let mut table = HashMap::new();
    for (input, output) in routing_pairs(resp)? {
        table.insert(output.to_string(), input.to_string());
    }
    Ok(RoutingTable(table))
}

/// Checks that a set-route reply echoes exactly the requested pair.
pub fn verify_route_echo(resp: &str, input: &str, output: &str) -> Result<()> {
    match routing_pairs(resp)?.as_slice() {
        [(echo_input, echo_output)] if *echo_input == input && *echo_output == output => Ok(()),
        _ => Err(SwitcherError::ParseError(resp.to_string())),
    }
}

/// Accepts any reply that contains the `OK` marker.
pub fn check_health(resp: &str) -> Result<()> {
    if resp.contains(HEALTH_MARKER) {
        Ok(())
    } else {
        Err(SwitcherError::HealthCheckError(resp.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_routing_reply() {
        let table = parse_routing_table("~01@VID 2>1 ,2>2 ,2>3 ,2>4").expect("parse table");

        let expected: HashMap<String, String> = [("1", "2"), ("2", "2"), ("3", "2"), ("4", "2")]
            .into_iter()
            .map(|(o, i)| (o.to_string(), i.to_string()))
            .collect();
        assert_eq!(table.into_inner(), expected);
    }

    #[test]
    fn parses_single_pair_reply() {
        let table = parse_routing_table("~01@VID 3>2").expect("parse table");
        assert_eq!(table.len(), 1);
        assert_eq!(table.input_for("2"), Some("3"));
        assert_eq!(table.input_for("3"), None);
    }

    #[test]
    fn rejects_reply_without_marker() {
        let err = parse_routing_table("~01@AUD 1>1").unwrap_err();
        assert!(matches!(err, SwitcherError::ParseError(_)));
    }

    #[test]
    fn rejects_reply_with_repeated_marker() {
        let err = parse_routing_table("~01@VID 1>1 VID 2>2").unwrap_err();
        assert!(matches!(err, SwitcherError::ParseError(_)));
    }

    #[test]
    fn rejects_malformed_pair_instead_of_partial_table() {
        for resp in [
            "~01@VID 2>1 ,22 ,2>3",
            "~01@VID 2>1>3",
            "~01@VID >1",
            "~01@VID 2>",
            "~01@VID",
            "~01@VID 2>1 ,",
        ] {
            let err = parse_routing_table(resp).unwrap_err();
            assert!(matches!(err, SwitcherError::ParseError(_)), "{resp}");
        }
    }

    #[test]
    fn set_route_command_uses_input_then_output() {
        assert_eq!(set_route_command("3", "2"), b"#VID 3>2\n".to_vec());
    }

    #[test]
    fn route_echo_must_match_request_order() {
        assert!(verify_route_echo("~01@VID 3>2", "3", "2").is_ok());
        assert!(matches!(
            verify_route_echo("~01@VID 1>2", "3", "2"),
            Err(SwitcherError::ParseError(_))
        ));
        assert!(matches!(
            verify_route_echo("~01@VID 2>3", "3", "2"),
            Err(SwitcherError::ParseError(_))
        ));
    }

    #[test]
    fn route_echo_rejects_extra_pairs() {
        let err = verify_route_echo("~01@VID 3>2 ,3>4", "3", "2").unwrap_err();
        assert!(matches!(err, SwitcherError::ParseError(_)));
    }

    #[test]
    fn health_requires_ok_marker() {
        assert!(check_health("~01@VID OK").is_ok());
        assert!(check_health("~01@ OK").is_ok());
        assert!(matches!(
            check_health("~01@VID 1>1"),
            Err(SwitcherError::HealthCheckError(_))
        ));
    }

    #[test]
    fn routing_table_serializes_as_plain_map() {
        let table = parse_routing_table("~01@VID 2>1").expect("parse table");
        let json = serde_json::to_string(&table).expect("serialize table");
        assert_eq!(json, r#"{"1":"2"}"#);
    }
}
