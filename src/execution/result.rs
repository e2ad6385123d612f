use super::header::ResponseHeader;
use super::message::{ExecutionMessage, SyslogLevel};

/// One parsed CGI response.
///
/// `status` is 0 when the script emitted no `Status:` line; php-cgi omits it
/// for an implicit 200.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub status: u16,
    pub location: String,
    pub body: Vec<u8>,
    pub headers: Vec<ResponseHeader>,
    pub cookies: Vec<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub messages: Vec<ExecutionMessage>,
}

impl ExecutionResult {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn has_status_line(&self) -> bool {
        self.status != 0
    }

    pub fn location(&self) -> Option<&str> {
        if self.location.is_empty() {
            None
        } else {
            Some(&self.location)
        }
    }

    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.is_error() || m.level == SyslogLevel::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ExecutionMessage> {
        self.messages
            .iter()
            .filter(|m| m.is_error())
    }

    pub fn all_messages(&self) -> impl Iterator<Item = &ExecutionMessage> {
        self.messages.iter()
    }

    pub fn all_headers(&self) -> impl Iterator<Item = &ResponseHeader> {
        self.headers.iter()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value())
    }

    pub fn headers_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.is(name))
            .map(|h| h.value())
            .collect()
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

#[cfg(feature = "http")]
impl ExecutionResult {
    /// Converts into an `http::Response`, treating a missing status line as 200.
    pub fn into_http_response(self) -> http::Response<Vec<u8>> {
        let status = if self.status == 0 { 200 } else { self.status };
        let mut builder = http::Response::builder().status(status);

        for header in &self.headers {
            if header.is("Status") {
                continue;
            }
            builder = builder.header(header.name(), header.value());
        }

        builder
            .body(self.body)
            .unwrap_or_else(|_| http::Response::new(Vec::new()))
    }
}

#[cfg(feature = "http")]
impl From<ExecutionResult> for http::Response<Vec<u8>> {
    fn from(res: ExecutionResult) -> Self {
        res.into_http_response()
    }
}
