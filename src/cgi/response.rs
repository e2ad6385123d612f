//! Parser for the CGI response php-cgi writes to stdout.
//!
//! ```text
//! Status: 302 Found\r\n
//! Location: /destination\r\n
//! Set-Cookie: PHPSESSID=abc; path=/\r\n
//! \r\n
//! <body>
//! ```
//!
//! Only `Status`, `Location` and `Set-Cookie` carry meaning here; every other
//! header is kept verbatim.

use memchr::memmem;

use crate::execution::ResponseHeader;

const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";
const LINE_SEPARATOR: &[u8] = b"\r\n";

/// Header block interpretation plus the body that followed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgiResponse {
    pub status: u16,
    pub location: String,
    pub cookies: Vec<String>,
    pub headers: Vec<ResponseHeader>,
    pub body: Vec<u8>,
}

/// Splits at the first blank line. `None` when there is no separator.
pub fn split(raw: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = memmem::find(raw, HEADER_SEPARATOR)?;
    Some((&raw[..pos], &raw[pos + HEADER_SEPARATOR.len()..]))
}

/// Parses a raw CGI response. `None` when the header/body separator is missing.
pub fn parse(raw: &[u8]) -> Option<CgiResponse> {
    let (head, body) = split(raw)?;

    let mut response = CgiResponse {
        body: body.to_vec(),
        ..Default::default()
    };

    for line in memmem::find_iter(head, LINE_SEPARATOR)
        .chain(std::iter::once(head.len()))
        .scan(0, |start, end| {
            let line = &head[*start..end];
            *start = end + LINE_SEPARATOR.len();
            Some(line)
        })
    {
        let Some(header) = ResponseHeader::parse(line) else {
            continue;
        };

        if header.is("Status") {
            response.status = leading_status(header.value());
        } else if header.is("Location") {
            response.location = header.value().to_string();
        } else if header.is("Set-Cookie") {
            response.cookies.push(cookie_pair(header.value()).to_string());
        }

        response.headers.push(header);
    }

    Some(response)
}

/// Leading integer of a status line remainder, `"404 Not Found"` -> 404.
///
/// 0 only when there are no digits; out-of-range codes saturate at
/// `u16::MAX` so a present status line never reads as absent.
fn leading_status(value: &str) -> u16 {
    let value = value.trim_start();
    let digits = value
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits == 0 {
        return 0;
    }

    value[..digits]
        .parse()
        .unwrap_or(u16::MAX)
}

/// The `name=value` part of a Set-Cookie value, without attributes.
fn cookie_pair(value: &str) -> &str {
    match value.find(';') {
        Some(pos) => &value[..pos],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_redirect() {
        let raw = b"Status: 302 Found\r\nLocation: /destination\r\nContent-type: text/html; charset=UTF-8\r\n\r\n";
        let response = parse(raw).unwrap();

        assert_eq!(response.status, 302);
        assert_eq!(response.location, "/destination");
        assert!(response.body.is_empty());
        assert_eq!(response.headers.len(), 3);
    }

    #[test]
    fn test_missing_status_is_zero() {
        let raw = b"Content-type: text/html; charset=UTF-8\r\n\r\nHello World";
        let response = parse(raw).unwrap();

        assert_eq!(response.status, 0);
        assert_eq!(response.location, "");
        assert_eq!(response.body, b"Hello World");
    }

    #[test]
    fn test_set_cookie_keeps_pair_only() {
        let raw = b"Set-Cookie: PHPSESSID=abc123; path=/; HttpOnly\r\nSet-Cookie: theme=dark\r\n\r\n";
        let response = parse(raw).unwrap();

        assert_eq!(response.cookies, vec!["PHPSESSID=abc123", "theme=dark"]);
    }

    #[test]
    fn test_body_keeps_later_blank_lines() {
        let raw = b"Status: 200 OK\r\n\r\nline one\r\n\r\nline two";
        let response = parse(raw).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"line one\r\n\r\nline two");
    }

    #[test]
    fn test_no_separator() {
        assert!(parse(b"Status: 200 OK\r\nContent-type: text/plain").is_none());
        assert!(parse(b"").is_none());
        assert!(parse(b"Status: 200 OK\n\nbody").is_none());
    }

    #[test]
    fn test_unrecognized_and_malformed_lines() {
        let raw = b"X-Powered-By: PHP/8.3.0\r\ngarbage line\r\n\r\nok";
        let response = parse(raw).unwrap();

        assert_eq!(response.status, 0);
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.headers[0].name(), "X-Powered-By");
    }

    #[test]
    fn test_leading_status() {
        assert_eq!(leading_status("404 Not Found"), 404);
        assert_eq!(leading_status("  500"), 500);
        assert_eq!(leading_status("Found"), 0);
        assert_eq!(leading_status(""), 0);
        assert_eq!(leading_status("99999999"), u16::MAX);
    }

    #[test]
    fn test_oversized_status_is_still_present() {
        let response = parse(b"Status: 70000 Weird\r\n\r\n").unwrap();
        assert_eq!(response.status, u16::MAX);
        assert_ne!(response.status, 0);
    }

    #[test]
    fn test_empty_header_block() {
        let response = parse(b"\r\n\r\nbody").unwrap();
        assert!(response.headers.is_empty());
        assert_eq!(response.body, b"body");
    }
}
