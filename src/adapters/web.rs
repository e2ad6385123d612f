use std::path::{Path, PathBuf};

use crate::cgi::ServerVars;
use crate::execution::{script_basename, ExecutionContext};

/// Every simulated request claims a urlencoded form body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const SERVER_NAME: &str = "localhost";
const SERVER_PROTOCOL: &str = "HTTP/1.1";

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WebRequestError {
    MissingMethod,
    ScriptNotFound(PathBuf),
}

impl std::fmt::Display for WebRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMethod => write!(f, "HTTP method not specified"),
            Self::ScriptNotFound(path) => {
                write!(
                    f,
                    "File {} doesn't exist to be called with php-cgi",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for WebRequestError {}

/// The two methods a visit sends; redirects are always followed with GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One simulated HTTP request, built into a CGI execution context.
#[derive(Debug, Clone, Default)]
pub struct WebRequest {
    body: Vec<u8>,
    uri: Option<String>,
    method: Option<Method>,
    cookies: Vec<String>,
    document_root: Option<PathBuf>,
    ini_overrides: Vec<(String, String)>,
}

impl WebRequest {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method: Some(method),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    #[must_use]
    pub fn post() -> Self {
        Self::new(Method::Post)
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Raw `name=value` cookies, sent together as `HTTP_COOKIE`.
    #[must_use]
    pub fn with_cookies<I, S>(mut self, iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cookies.extend(
            iter.into_iter()
                .map(|s| s.into()),
        );
        self
    }

    #[must_use]
    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = bytes.into();
        self
    }

    /// Sets `DOCUMENT_ROOT` and the interpreter's `doc_root` setting.
    #[must_use]
    pub fn with_document_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_root = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_ini(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.ini_overrides
            .push((key.into(), value.into()));

        self
    }

    pub fn build(
        self,
        script_path: impl AsRef<Path>,
    ) -> Result<ExecutionContext, WebRequestError> {
        let method = self
            .method
            .ok_or(WebRequestError::MissingMethod)?;

        let script_path = script_path
            .as_ref()
            .to_path_buf();

        if !script_path.exists() {
            return Err(WebRequestError::ScriptNotFound(script_path));
        }

        let script_filename = std::fs::canonicalize(&script_path)
            .unwrap_or_else(|_| script_path.clone());

        let uri = self
            .uri
            .unwrap_or_else(|| "/".to_string());

        let document_root = self
            .document_root
            .map(|root| std::fs::canonicalize(&root).unwrap_or(root))
            .unwrap_or_else(|| {
                script_filename
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("/"))
            });

        let (_, query_string) = parse_uri(&uri);

        let mut vars = ServerVars::web_defaults();

        vars.request_method(method.as_str())
            .request_uri(&uri)
            .query_string(query_string.unwrap_or_default())
            .script_filename(&script_filename)
            .script_name(&script_basename(&script_filename))
            .document_root(&document_root)
            .server_name(SERVER_NAME)
            .server_protocol(SERVER_PROTOCOL)
            .content_length(self.body.len())
            .content_type(FORM_CONTENT_TYPE)
            .cookies(&cookie_header(&self.cookies));

        let mut ini_overrides = vec![(
            "doc_root".to_string(),
            document_root
                .to_string_lossy()
                .into_owned(),
        )];
        ini_overrides.extend(self.ini_overrides);

        Ok(ExecutionContext {
            script_path: script_filename,
            server_vars: vars,
            input: self.body,
            ini_overrides,
        })
    }
}

/// `a=1; b=2;` for a non-empty jar, empty otherwise.
pub fn cookie_header<S: AsRef<str>>(cookies: &[S]) -> String {
    if cookies.is_empty() {
        return String::new();
    }

    let joined = cookies
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join("; ");

    format!("{};", joined)
}

fn parse_uri(uri: &str) -> (&str, Option<&str>) {
    match uri.find('?') {
        Some(pos) => (&uri[..pos], Some(&uri[pos + 1..])),
        None => (uri, None),
    }
}
