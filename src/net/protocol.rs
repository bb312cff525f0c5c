//! Wire protocol: outbound pointer telemetry, inbound roster messages,
//! and endpoint derivation.

use serde::{Deserialize, Serialize};

use crate::presence::Participant;

/// Outbound client message. Tagged with `what` on the wire:
/// `{"what":"pointermove","x":0.5,"y":0.5}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "what", rename_all = "lowercase")]
pub enum ClientMessage {
    Pointermove { x: f32, y: f32 },
}

/// Inbound roster message: the full participant list, positions and hues
/// normalized to 0..1. The `clients` key is required; a structured message
/// without it (a pointermove echo, say) is not a roster and must not be
/// mistaken for an empty one, which would wipe the pool.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterMessage {
    pub clients: Vec<Participant>,
}

/// Classified inbound text payload
#[derive(Debug, Clone, PartialEq)]
pub enum InboundText {
    /// Structured roster update
    Roster(Vec<Participant>),
    /// Structured but unparseable; logged, never fatal
    Malformed,
    /// Free-form text, diagnostic log only
    Plain,
}

/// Classify a text payload the way the page did: anything opening with `{`
/// is a structured message, everything else is a log line.
pub fn classify_text(payload: &str) -> InboundText {
    if !payload.starts_with('{') {
        return InboundText::Plain;
    }
    match serde_json::from_str::<RosterMessage>(payload) {
        Ok(msg) => InboundText::Roster(msg.clients),
        Err(_) => InboundText::Malformed,
    }
}

/// Derive the socket endpoint from the hosting origin by scheme
/// substitution: same host, port, and path as the page.
pub fn socket_endpoint(origin: &str) -> String {
    if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        // Already a ws/wss URL (or something tungstenite will reject loudly)
        origin.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointermove_wire_shape() {
        let msg = ClientMessage::Pointermove { x: 0.25, y: 0.75 };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"what":"pointermove","x":0.25,"y":0.75}"#);
    }

    #[test]
    fn test_endpoint_scheme_substitution() {
        assert_eq!(
            socket_endpoint("http://localhost:8080"),
            "ws://localhost:8080"
        );
        assert_eq!(
            socket_endpoint("https://example.com/room"),
            "wss://example.com/room"
        );
        assert_eq!(socket_endpoint("ws://host:9000"), "ws://host:9000");
    }

    #[test]
    fn test_classify_roster_message() {
        let payload = r#"{"clients":[{"x":0.1,"y":0.2,"hue":0.3},{"x":0.4,"y":0.5,"hue":0.6}]}"#;
        match classify_text(payload) {
            InboundText::Roster(clients) => {
                assert_eq!(clients.len(), 2);
                assert_eq!(clients[0].x, 0.1);
                assert_eq!(clients[1].hue, 0.6);
            }
            other => panic!("expected roster, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_roster_with_missing_fields() {
        // Defensive parse: holes become zeros, never an error
        let payload = r#"{"clients":[{"hue":0.5},{}]}"#;
        match classify_text(payload) {
            InboundText::Roster(clients) => {
                assert_eq!(clients.len(), 2);
                assert_eq!(clients[0].x, 0.0);
                assert_eq!(clients[0].hue, 0.5);
            }
            other => panic!("expected roster, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_plain_and_malformed() {
        assert_eq!(classify_text("hello"), InboundText::Plain);
        assert_eq!(classify_text(""), InboundText::Plain);
        assert_eq!(classify_text("{not json"), InboundText::Malformed);
    }

    #[test]
    fn test_structured_message_without_clients_is_not_a_roster() {
        // A pointermove echo must not read as an empty roster: applying an
        // empty roster would clear every instance.
        let echo = r#"{"what":"pointermove","x":0.1,"y":0.2}"#;
        assert_eq!(classify_text(echo), InboundText::Malformed);
        assert_eq!(classify_text("{}"), InboundText::Malformed);

        // An explicit empty list is still a legitimate roster
        match classify_text(r#"{"clients":[]}"#) {
            InboundText::Roster(clients) => assert!(clients.is_empty()),
            other => panic!("expected roster, got {other:?}"),
        }
    }
}
