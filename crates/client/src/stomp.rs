//! Minimal STOMP 1.2 frame codec.
//!
//! Frames are serialized as `COMMAND\nheader:value\n…\n\n<body>\0`;
//! a bare EOL is a heartbeat. Header values escape `\`, `\r`, `\n` and
//! `:` per the STOMP 1.2 grammar. When a `content-length` header is
//! present the body is read by length (it may contain NULs), otherwise
//! it ends at the first NUL.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StompError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("invalid content-length: {0}")]
    ContentLength(String),
    #[error("invalid header escape sequence: \\{0}")]
    Escape(char),
}

/// STOMP frame commands used by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // client -> server
    Connect,
    Subscribe,
    Unsubscribe,
    Send,
    Disconnect,
    // server -> client
    Connected,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Send => "SEND",
            Command::Disconnect => "DISCONNECT",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    fn parse(raw: &str) -> Result<Self, StompError> {
        match raw {
            // "STOMP" is the 1.2 alias for CONNECT
            "CONNECT" | "STOMP" => Ok(Command::Connect),
            "SUBSCRIBE" => Ok(Command::Subscribe),
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe),
            "SEND" => Ok(Command::Send),
            "DISCONNECT" => Ok(Command::Disconnect),
            "CONNECTED" => Ok(Command::Connected),
            "MESSAGE" => Ok(Command::Message),
            "RECEIPT" => Ok(Command::Receipt),
            "ERROR" => Ok(Command::Error),
            other => Err(StompError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of the named header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT frame carrying the auth token as a connect header.
    pub fn connect(host: &str, token: &str) -> Frame {
        Frame::new(Command::Connect)
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("heart-beat", "10000,10000")
            .with_header("Authorization", format!("Bearer {token}"))
    }

    pub fn subscribe(id: &str, destination: &str) -> Frame {
        Frame::new(Command::Subscribe)
            .with_header("id", id)
            .with_header("destination", destination)
    }

    pub fn unsubscribe(id: &str) -> Frame {
        Frame::new(Command::Unsubscribe).with_header("id", id)
    }

    pub fn send(destination: &str, body: impl Into<String>) -> Frame {
        Frame::new(Command::Send)
            .with_header("destination", destination)
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    pub fn disconnect() -> Frame {
        Frame::new(Command::Disconnect)
    }

    /// Serialize to the wire format, appending `content-length` for
    /// non-empty bodies.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            out.push_str(&escape(name));
            out.push(':');
            out.push_str(&escape(value));
            out.push('\n');
        }
        if !self.body.is_empty() && self.header("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse a frame from the wire. Returns `Ok(None)` for heartbeats.
    pub fn parse(raw: &str) -> Result<Option<Frame>, StompError> {
        if raw
            .trim_matches(|c| c == '\r' || c == '\n' || c == '\0')
            .is_empty()
        {
            return Ok(None);
        }

        let (head, body_raw) = split_head(raw)?;
        let mut lines = head.lines();
        let command_line = lines
            .next()
            .ok_or_else(|| StompError::Malformed("missing command line".to_string()))?;
        let command = Command::parse(command_line)?;

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::Malformed(format!("header without colon: {line}")))?;
            headers.push((unescape(name)?, unescape(value)?));
        }

        let frame = Frame {
            command,
            headers,
            body: String::new(),
        };

        let body = match frame.header("content-length") {
            Some(len) => {
                let len: usize = len
                    .parse()
                    .map_err(|_| StompError::ContentLength(len.to_string()))?;
                body_raw
                    .get(..len)
                    .ok_or_else(|| {
                        StompError::ContentLength(format!(
                            "{len} does not fit body of {} bytes",
                            body_raw.len()
                        ))
                    })?
                    .to_string()
            }
            // body runs to the first NUL
            None => body_raw.split('\0').next().unwrap_or("").to_string(),
        };

        Ok(Some(Frame { body, ..frame }))
    }
}

/// Boundary between the header block and the body.
fn split_head(raw: &str) -> Result<(&str, &str), StompError> {
    let lf = raw.find("\n\n").map(|i| (i, 2));
    let crlf = raw.find("\r\n\r\n").map(|i| (i, 4));
    let boundary = match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match boundary {
        Some((index, width)) => Ok((&raw[..index], &raw[index + width..])),
        None => Err(StompError::Malformed(
            "missing blank line after headers".to_string(),
        )),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            Some(other) => return Err(StompError::Escape(other)),
            None => return Err(StompError::Escape('\0')),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_round_trips() {
        let frame = Frame::subscribe("sub-0", "/topic/boards/5");
        let parsed = Frame::parse(&frame.serialize()).unwrap().unwrap();
        assert_eq!(parsed.command, Command::Subscribe);
        assert_eq!(parsed.header("id"), Some("sub-0"));
        assert_eq!(parsed.header("destination"), Some("/topic/boards/5"));
        assert!(parsed.body.is_empty());
    }

    #[test]
    fn send_frame_round_trips_with_body() {
        let frame = Frame::send("/app/boards/5", r#"{"title":"x"}"#);
        let parsed = Frame::parse(&frame.serialize()).unwrap().unwrap();
        assert_eq!(parsed.command, Command::Send);
        assert_eq!(parsed.body, r#"{"title":"x"}"#);
        assert_eq!(parsed.header("content-length"), Some("13"));
    }

    #[test]
    fn heartbeats_parse_to_none() {
        assert_eq!(Frame::parse("\n").unwrap(), None);
        assert_eq!(Frame::parse("\r\n").unwrap(), None);
        assert_eq!(Frame::parse("").unwrap(), None);
    }

    #[test]
    fn parses_server_message_with_crlf() {
        let raw = "MESSAGE\r\nsubscription:sub-1\r\ndestination:/topic/tasks/12\r\nmessage-id:7\r\n\r\n{\"type\":\"TASK_UPDATED\"}\0";
        let frame = Frame::parse(raw).unwrap().unwrap();
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.header("subscription"), Some("sub-1"));
        assert_eq!(frame.body, r#"{"type":"TASK_UPDATED"}"#);
    }

    #[test]
    fn content_length_wins_over_nul_terminator() {
        let raw = "MESSAGE\nsubscription:sub-1\ncontent-length:5\n\nab\0cd\0";
        let frame = Frame::parse(raw).unwrap().unwrap();
        assert_eq!(frame.body, "ab\0cd");
    }

    #[test]
    fn reserializing_keeps_a_single_content_length() {
        let raw = "MESSAGE\nsubscription:sub-1\ncontent-length:5\n\nhello\0";
        let frame = Frame::parse(raw).unwrap().unwrap();
        let wire = frame.serialize();
        assert_eq!(wire.matches("content-length").count(), 1);
        assert_eq!(Frame::parse(&wire).unwrap().unwrap().body, "hello");
    }

    #[test]
    fn header_values_escape_and_unescape() {
        let frame = Frame::new(Command::Send)
            .with_header("destination", "/queue/a:b")
            .with_header("note", "line1\nline2\\end");
        let parsed = Frame::parse(&frame.serialize()).unwrap().unwrap();
        assert_eq!(parsed.header("destination"), Some("/queue/a:b"));
        assert_eq!(parsed.header("note"), Some("line1\nline2\\end"));
    }

    #[test]
    fn connect_frame_carries_bearer_header() {
        let frame = Frame::connect("localhost", "jwt-token");
        let wire = frame.serialize();
        assert!(wire.starts_with("CONNECT\n"));
        assert!(wire.contains("accept-version:1.2\n"));
        assert!(wire.contains("Authorization:Bearer jwt-token\n"));
    }

    #[test]
    fn stomp_command_aliases_connect() {
        let frame = Frame::parse("STOMP\naccept-version:1.2\n\n\0")
            .unwrap()
            .unwrap();
        assert_eq!(frame.command, Command::Connect);
    }

    #[test]
    fn error_frame_exposes_message_header() {
        let raw = "ERROR\nmessage:bad credentials\n\ndetails here\0";
        let frame = Frame::parse(raw).unwrap().unwrap();
        assert_eq!(frame.header("message"), Some("bad credentials"));
        assert_eq!(frame.body, "details here");
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(
            Frame::parse("NACK\n\n\0"),
            Err(StompError::UnknownCommand(_))
        ));
    }

    #[test]
    fn missing_header_separator_is_malformed() {
        assert!(matches!(
            Frame::parse("MESSAGE\nsubscription sub-1\n\n\0"),
            Err(StompError::Malformed(_))
        ));
    }
}
