//! Wire frames: single-shot plain-text messages between peers.
//!
//! The protocol is deliberately minimal: newline-free text frames over a
//! stream socket, consumed as at most one fixed-size read per connection.
//! Two frames exist:
//!
//! - `CONNECT <ip> <port>`: a request to be added as a peer.
//! - `MESSAGE <payload>, timestamp=<float-seconds>`: payload propagation.
//!
//! Anything else is unclassified and silently dropped by the receiver.

/// Maximum bytes read from an inbound connection; one read per session.
pub const MAX_FRAME_BYTES: usize = 1024;

/// The literal separating a message payload from its timestamp. A payload
/// must not contain this marker; the *last* occurrence delimits the
/// timestamp, so earlier commas in the payload survive.
const TIMESTAMP_MARKER: &str = ", timestamp=";

/// A classified inbound or outbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Request to be added as a peer at the advertised address.
    Connect { ip: String, port: u16 },
    /// An application payload with its origin timestamp (epoch seconds).
    Message { payload: String, timestamp: f64 },
}

impl Frame {
    /// Classify raw frame text. Returns `None` for anything that is not a
    /// well-formed frame; the caller drops such input without error.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix("CONNECT ") {
            let mut parts = rest.split_whitespace();
            let ip = parts.next()?.to_string();
            let port = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            Some(Self::Connect { ip, port })
        } else if let Some(rest) = input.strip_prefix("MESSAGE ") {
            let (payload, raw_ts) = rest.rsplit_once(TIMESTAMP_MARKER)?;
            let timestamp: f64 = raw_ts.trim().parse().ok()?;
            if !timestamp.is_finite() {
                return None;
            }
            Some(Self::Message {
                payload: payload.to_string(),
                timestamp,
            })
        } else {
            None
        }
    }

    /// Render the frame in its exact wire format.
    pub fn encode(&self) -> String {
        match self {
            Self::Connect { ip, port } => format!("CONNECT {ip} {port}"),
            Self::Message { payload, timestamp } => {
                format!("MESSAGE {payload}{TIMESTAMP_MARKER}{timestamp}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect() {
        let frame = Frame::parse("CONNECT 127.0.0.1 9600").unwrap();
        assert_eq!(
            frame,
            Frame::Connect {
                ip: "127.0.0.1".to_string(),
                port: 9600
            }
        );
    }

    #[test]
    fn test_parse_message() {
        let frame = Frame::parse("MESSAGE hello overlay, timestamp=1721000000.25").unwrap();
        assert_eq!(
            frame,
            Frame::Message {
                payload: "hello overlay".to_string(),
                timestamp: 1721000000.25
            }
        );
    }

    #[test]
    fn test_parse_message_payload_with_comma() {
        // Only the last marker delimits the timestamp.
        let frame = Frame::parse("MESSAGE a, b, c, timestamp=5.0").unwrap();
        assert_eq!(
            frame,
            Frame::Message {
                payload: "a, b, c".to_string(),
                timestamp: 5.0
            }
        );
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert_eq!(Frame::parse(""), None);
        assert_eq!(Frame::parse("PING"), None);
        assert_eq!(Frame::parse("CONNECT 127.0.0.1"), None);
        assert_eq!(Frame::parse("CONNECT 127.0.0.1 notaport"), None);
        assert_eq!(Frame::parse("CONNECT 127.0.0.1 9600 extra"), None);
        assert_eq!(Frame::parse("MESSAGE no timestamp here"), None);
        assert_eq!(Frame::parse("MESSAGE x, timestamp=NaN"), None);
        assert_eq!(Frame::parse("message lowercase, timestamp=1.0"), None);
    }

    #[test]
    fn test_encode_round_trip() {
        let frames = [
            Frame::Connect {
                ip: "10.0.0.3".to_string(),
                port: 4242,
            },
            Frame::Message {
                payload: "from 127.0.0.1:9600".to_string(),
                timestamp: 1721000000.5,
            },
        ];
        for frame in frames {
            assert_eq!(Frame::parse(&frame.encode()), Some(frame));
        }
    }

    #[test]
    fn test_encode_exact_format() {
        let connect = Frame::Connect {
            ip: "127.0.0.1".to_string(),
            port: 9600,
        };
        assert_eq!(connect.encode(), "CONNECT 127.0.0.1 9600");

        let message = Frame::Message {
            payload: "hi".to_string(),
            timestamp: 2.5,
        };
        assert_eq!(message.encode(), "MESSAGE hi, timestamp=2.5");
    }
}
