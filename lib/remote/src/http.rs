//! Request encoding and response parsing for the subset of HTTP/1.1
//! the protocol uses.

use crate::{percent, Endpoint, RemoteError, Result};

/// Status used when the status line is missing or nonsensical.
const FALLBACK_STATUS: u16 = 500;

/// The remote operations, one per request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Write,
    Delete,
    Stat,
    List,
    Link,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Stat => "stat",
            Self::List => "list",
            Self::Link => "link",
        }
    }
}

/// Build `GET /<op>?token=<token>&<args> HTTP/1.1`.
///
/// The token and every argument value are percent-encoded; argument
/// names are sent as they are.
pub fn encode_request(
    endpoint: &Endpoint,
    operation: Operation,
    token: &str,
    args: &[(&str, &str)],
) -> Vec<u8> {
    let mut target = format!("/{}?token={}", operation.as_str(), percent::encode(token));
    for (name, value) in args {
        target.push('&');
        target.push_str(name);
        target.push('=');
        target.push_str(&percent::encode(value));
    }

    format!(
        "GET {target} HTTP/1.1\r\nHost: {endpoint}\r\nConnection: close\r\n\r\n"
    )
    .into_bytes()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_status(line: &str) -> u16 {
    line.split_whitespace()
        .nth(1)
        .and_then(|status| status.parse().ok())
        .filter(|status| (100..=599).contains(status))
        .unwrap_or(FALLBACK_STATUS)
}

/// Parse a complete response as read off the wire.
pub fn parse_response(raw: &[u8]) -> Result<Response> {
    let (head, body) = match (find(raw, b"\r\n\r\n"), find(raw, b"\n\n")) {
        (Some(crlf), Some(lf)) if lf < crlf => (&raw[..lf], &raw[lf + 2..]),
        (Some(crlf), _) => (&raw[..crlf], &raw[crlf + 4..]),
        (None, Some(lf)) => (&raw[..lf], &raw[lf + 2..]),
        (None, None) => (raw, &raw[raw.len()..]),
    };

    let head = String::from_utf8_lossy(head);
    let mut lines = head.lines();
    let status = parse_status(lines.next().unwrap_or_default());
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let mut response = Response {
        status,
        headers,
        body: Vec::new(),
    };
    let chunked = response
        .header("transfer-encoding")
        .is_some_and(|value| value.to_ascii_lowercase().contains("chunked"));
    response.body = if chunked {
        decode_chunked(body)?
    } else {
        body.to_vec()
    };

    Ok(response)
}

/// Splits off one line, accepting `\r\n` or `\n`.
fn split_line(input: &[u8]) -> Option<(&[u8], &[u8])> {
    let end = input.iter().position(|byte| *byte == b'\n')?;
    let line = &input[..end];
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    Some((line, &input[end + 1..]))
}

/// Decode a `Transfer-Encoding: chunked` body. Trailers are ignored.
pub fn decode_chunked(mut input: &[u8]) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    loop {
        let (line, rest) =
            split_line(input).ok_or(RemoteError::MalformedResponse("truncated chunk size"))?;
        let size = std::str::from_utf8(line)
            .ok()
            .and_then(|line| line.split(';').next())
            .map(str::trim)
            .and_then(|size| usize::from_str_radix(size, 16).ok())
            .ok_or(RemoteError::MalformedResponse("invalid chunk size"))?;

        if size == 0 {
            return Ok(body);
        }
        if rest.len() < size {
            return Err(RemoteError::MalformedResponse("truncated chunk"));
        }
        body.extend_from_slice(&rest[..size]);

        input = if let Some(rest) = rest[size..].strip_prefix(b"\r\n") {
            rest
        } else if let Some(rest) = rest[size..].strip_prefix(b"\n") {
            rest
        } else {
            return Err(RemoteError::MalformedResponse("missing chunk terminator"));
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encode_a_request() {
        let request = encode_request(
            &Endpoint::new("10.0.0.2", 8081),
            Operation::Write,
            "s3cr&t",
            &[("path", "/a b"), ("offset", "0"), ("data", "Zm8=")],
        );
        assert_eq!(
            String::from_utf8(request).unwrap(),
            "GET /write?token=s3cr%26t&path=%2Fa%20b&offset=0&data=Zm8%3D HTTP/1.1\r\n\
             Host: 10.0.0.2:8081\r\n\
             Connection: close\r\n\r\n"
        );
    }

    #[test]
    fn parse_a_plain_response() {
        let response = parse_response(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 13\r\n\r\n{\"result\":{}}",
        )
        .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body, b"{\"result\":{}}");
    }

    #[test]
    fn parse_a_chunked_response() {
        let response = parse_response(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ndata\r\n0\r\n\r\n",
        )
        .unwrap();
        assert_eq!(response.body, b"data");
    }

    #[test]
    fn parse_bare_newlines() {
        let response = parse_response(b"HTTP/1.0 404 Not Found\nX-A: b\n\nmissing").unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.header("x-a"), Some("b"));
        assert_eq!(response.body, b"missing");
    }

    #[test]
    fn odd_status_lines_map_to_500() {
        let raws: [&[u8]; 5] = [
            b"",
            b"garbage\r\n\r\n",
            b"HTTP/1.1 abc OK\r\n\r\n",
            b"HTTP/1.1 999 Weird\r\n\r\n",
            b"HTTP/1.1 42 Low\r\n\r\n",
        ];
        for raw in raws {
            assert_eq!(parse_response(raw).unwrap().status, 500, "{raw:?}");
        }
    }

    #[test]
    fn missing_boundary_means_empty_body() {
        let response = parse_response(b"HTTP/1.1 204 No Content\r\nServer: x").unwrap();
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[test]
    fn decode_chunks() {
        assert_eq!(decode_chunked(b"4\r\ndata\r\n0\r\n\r\n").unwrap(), b"data");
        assert_eq!(
            decode_chunked(b"3;ext=1\r\nabc\r\nA\r\n0123456789\r\n0\r\n\r\n").unwrap(),
            b"abc0123456789"
        );
        assert_eq!(decode_chunked(b"2\nhi\n0\n\n").unwrap(), b"hi");
    }

    #[test]
    fn reject_broken_chunks() {
        assert_eq!(
            decode_chunked(b"a\r\nshort"),
            Err(RemoteError::MalformedResponse("truncated chunk"))
        );
        assert_eq!(
            decode_chunked(b"zz\r\n"),
            Err(RemoteError::MalformedResponse("invalid chunk size"))
        );
        assert_eq!(
            decode_chunked(b"4\r\ndata"),
            Err(RemoteError::MalformedResponse("missing chunk terminator"))
        );
        assert_eq!(
            decode_chunked(b"4\r\ndata\r\n"),
            Err(RemoteError::MalformedResponse("truncated chunk size"))
        );
    }
}
