use std::path::PathBuf;
use std::time::Duration;

use crate::cgi::Interpreter;

pub(crate) const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Configuration of a visit.
///
/// `VisitOptions::default()` is the shared baseline; callers override fields
/// with the `with_*` builders (or, with the `serde` feature, by deserializing
/// a partial mapping such as `{"followRedirect": false}`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct VisitOptions {
    /// CGI document root.
    pub docroot: PathBuf,
    /// Entry script every request runs.
    pub script: PathBuf,
    /// Chase `Location` headers automatically.
    pub follow_redirect: bool,
    /// Path to Patchwork.php, needed for [`Visit::mock`](crate::Visit::mock).
    #[cfg_attr(
        feature = "serde",
        serde(rename = "mockLoaderPath", alias = "patchwork")
    )]
    pub mock_loader: Option<PathBuf>,
    pub interpreter: Interpreter,
    pub session_save_path: PathBuf,
    /// Upper bound on automatically followed redirects per request.
    pub max_redirects: usize,
    /// Kill the interpreter after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Print non-empty stderr as `  STDERR: ...`.
    pub echo_stderr: bool,
}

impl Default for VisitOptions {
    fn default() -> Self {
        Self {
            docroot: PathBuf::from("./public"),
            script: PathBuf::from("./public/index.php"),
            follow_redirect: true,
            mock_loader: None,
            interpreter: Interpreter::default(),
            session_save_path: PathBuf::from("/tmp"),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: None,
            echo_stderr: true,
        }
    }
}

impl VisitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document root and entry script in one go.
    #[must_use]
    pub fn app(
        docroot: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
    ) -> Self {
        Self::default()
            .with_docroot(docroot)
            .with_script(script)
    }

    #[must_use]
    pub fn with_docroot(mut self, path: impl Into<PathBuf>) -> Self {
        self.docroot = path.into();
        self
    }

    #[must_use]
    pub fn with_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.script = path.into();
        self
    }

    #[must_use]
    pub fn with_follow_redirect(mut self, follow: bool) -> Self {
        self.follow_redirect = follow;
        self
    }

    #[must_use]
    pub fn with_mock_loader(mut self, path: impl Into<PathBuf>) -> Self {
        self.mock_loader = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    #[must_use]
    pub fn with_session_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_save_path = path.into();
        self
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_echo_stderr(mut self, echo: bool) -> Self {
        self.echo_stderr = echo;
        self
    }
}
