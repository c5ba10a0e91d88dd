//! Session request grammar and replies

use std::fmt;

/// Version announced in the greeting
pub const PROTOCOL_VERSION: &str = "0.0.1";

/// Explicit success line a client may receive instead of silence
pub const SUCCESS_SENTINEL: &str = "OK";

/// A well-formed client request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Deliver the stream to the caller's host on `port`
    Subscribe(u16),
    /// Stop delivering to the caller's host on `port`
    Unsubscribe(u16),
}

impl Request {
    /// Parse one line.
    ///
    /// Exactly two tokens separated by a single space; the port must be a
    /// decimal integer in `1..=65535`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split(' ');
        let (verb, port, rest) = (tokens.next()?, tokens.next()?, tokens.next());
        if rest.is_some() {
            return None;
        }

        let port = parse_port(port)?;
        match verb {
            "subscribe" => Some(Request::Subscribe(port)),
            "unsubscribe" => Some(Request::Unsubscribe(port)),
            _ => None,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Request::Subscribe(port) | Request::Unsubscribe(port) => *port,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Subscribe(port) => write!(f, "subscribe {}", port),
            Request::Unsubscribe(port) => write!(f, "unsubscribe {}", port),
        }
    }
}

fn parse_port(token: &str) -> Option<u16> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u16>().ok().filter(|port| *port > 0)
}

/// Lines the server sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Sent once when the session becomes ready
    Greeting,
    /// Subscribe refused, all slots taken
    SubscriberLimitReached,
    /// Line did not match the grammar
    UnrecognizedCommand,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Greeting => write!(f, "OK RTP {}", PROTOCOL_VERSION),
            Reply::SubscriberLimitReached => f.write_str("error subscriber_limit_reached"),
            Reply::UnrecognizedCommand => f.write_str("error unrecognized_command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requests() {
        assert_eq!(Request::parse("subscribe 5000"), Some(Request::Subscribe(5000)));
        assert_eq!(
            Request::parse("unsubscribe 65535"),
            Some(Request::Unsubscribe(65535))
        );
    }

    #[test]
    fn test_parse_rejects_bad_ports() {
        for line in [
            "subscribe abc",
            "subscribe 0",
            "subscribe 65536",
            "subscribe -1",
            "subscribe +80",
            "subscribe ",
            "unsubscribe 5.0",
        ] {
            assert_eq!(Request::parse(line), None, "{line:?}");
        }
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for line in [
            "",
            "subscribe",
            "subscribe 5000 6000",
            "subscribe  5000",
            "SUBSCRIBE 5000",
            "play 5000",
            " subscribe 5000",
        ] {
            assert_eq!(Request::parse(line), None, "{line:?}");
        }
    }

    #[test]
    fn test_request_display_roundtrips() {
        let request = Request::Unsubscribe(5004);
        assert_eq!(request.to_string(), "unsubscribe 5004");
        assert_eq!(Request::parse(&request.to_string()), Some(request));
        assert_eq!(request.port(), 5004);
    }

    #[test]
    fn test_reply_lines() {
        assert_eq!(Reply::Greeting.to_string(), "OK RTP 0.0.1");
        assert_eq!(
            Reply::SubscriberLimitReached.to_string(),
            "error subscriber_limit_reached"
        );
        assert_eq!(
            Reply::UnrecognizedCommand.to_string(),
            "error unrecognized_command"
        );
    }
}
