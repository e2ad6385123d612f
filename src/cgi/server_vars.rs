use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// CGI/1.1 meta-variables handed to the interpreter as environment.
///
/// Implements meta-variable semantics per [RFC 3875 §4.1](https://datatracker.ietf.org/doc/html/rfc3875#section-4.1).
/// Setting a variable twice keeps its position and replaces the value.
#[derive(Debug, Clone, Default)]
pub struct ServerVars {
    vars: Vec<(String, String)>,
}

impl ServerVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let key = key.into();
        let value = value.into();

        match self
            .vars
            .iter_mut()
            .find(|(k, _)| *k == key)
        {
            Some(slot) => slot.1 = value,
            None => self.vars.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.vars.iter()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.vars
    }

    pub fn request_method(&mut self, method: &str) -> &mut Self {
        self.set("REQUEST_METHOD", method)
    }

    pub fn request_uri(&mut self, uri: &str) -> &mut Self {
        self.set("REQUEST_URI", uri)
    }

    pub fn query_string(&mut self, qs: &str) -> &mut Self {
        self.set("QUERY_STRING", qs)
    }

    pub fn request_time(&mut self) -> &mut Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        self.set("REQUEST_TIME", now.as_secs().to_string())
            .set("REQUEST_TIME_FLOAT", now.as_secs_f64().to_string())
    }

    pub fn script_filename(&mut self, path: &Path) -> &mut Self {
        self.set("SCRIPT_FILENAME", path.to_string_lossy())
    }

    pub fn script_name(&mut self, name: &str) -> &mut Self {
        self.set("SCRIPT_NAME", name)
    }

    pub fn document_root(&mut self, path: &Path) -> &mut Self {
        self.set("DOCUMENT_ROOT", path.to_string_lossy())
    }

    /// Sets `SERVER_NAME` meta-variable.
    ///
    /// Per [RFC 3875 §4.1.14](https://datatracker.ietf.org/doc/html/rfc3875#section-4.1.14).
    pub fn server_name(&mut self, name: &str) -> &mut Self {
        self.set("SERVER_NAME", name)
    }

    /// Sets `SERVER_PROTOCOL` meta-variable.
    ///
    /// Per [RFC 3875 §4.1.16](https://datatracker.ietf.org/doc/html/rfc3875#section-4.1.16),
    /// format is `protocol/version` (e.g., `HTTP/1.1`).
    pub fn server_protocol(&mut self, proto: &str) -> &mut Self {
        self.set("SERVER_PROTOCOL", proto)
    }

    /// Sets `GATEWAY_INTERFACE` meta-variable.
    ///
    /// Per [RFC 3875 §4.1.4](https://datatracker.ietf.org/doc/html/rfc3875#section-4.1.4),
    /// this identifies the CGI specification version (e.g., `CGI/1.1`).
    pub fn gateway_interface(&mut self, gi: &str) -> &mut Self {
        self.set("GATEWAY_INTERFACE", gi)
    }

    pub fn content_type(&mut self, ct: &str) -> &mut Self {
        self.set("CONTENT_TYPE", ct)
    }

    pub fn content_length(&mut self, len: usize) -> &mut Self {
        self.set("CONTENT_LENGTH", len.to_string())
    }

    pub fn cookies(&mut self, cookie_str: &str) -> &mut Self {
        self.set("HTTP_COOKIE", cookie_str)
    }

    /// Creates server variables with CGI/1.1 web defaults.
    ///
    /// Sets:
    /// - `GATEWAY_INTERFACE` to `CGI/1.1` per [RFC 3875 §4.1.4](https://datatracker.ietf.org/doc/html/rfc3875#section-4.1.4)
    /// - `REQUEST_TIME` and `REQUEST_TIME_FLOAT`
    pub fn web_defaults() -> Self {
        let mut vars = Self::new();

        vars.gateway_interface("CGI/1.1")
            .request_time();

        vars
    }
}
