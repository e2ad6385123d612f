//! The caller-facing session: configuration, cookie jar, mocks and the last
//! response, behind a chainable API.

mod assertions;
mod cookies;
mod options;
mod simulator;

pub use cookies::CookieJar;
pub use options::VisitOptions;

use std::fmt;

use crate::adapters::Method;
use crate::cgi::{InterceptError, MockTable, PatchworkInterceptor, ScriptInterceptor};
use crate::error::VisitError;
use crate::execution::{ExecutionHooks, ExecutionResult, NoOpHooks};
use simulator::RequestSimulator;

/// A browsing session against one PHP entry script.
///
/// ```no_run
/// use cgi_visit::{Visit, VisitOptions};
///
/// # fn main() -> Result<(), cgi_visit::VisitError> {
/// let options = VisitOptions::app("tests/public", "tests/public/index.php");
///
/// Visit::new(options)
///     .get("/redirect")?
///     .assert_see("Final");
/// # Ok(())
/// # }
/// ```
pub struct Visit {
    options: VisitOptions,
    cookies: CookieJar,
    mocks: MockTable,
    interceptor: Option<Box<dyn ScriptInterceptor>>,
    hooks: Box<dyn ExecutionHooks>,
    method: Method,
    path: String,
    response: ExecutionResult,
}

impl Default for Visit {
    fn default() -> Self {
        Self::new(VisitOptions::default())
    }
}

impl fmt::Debug for Visit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visit")
            .field("options", &self.options)
            .field("cookies", &self.cookies)
            .field("mocks", &self.mocks)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("status", &self.response.status)
            .field("location", &self.response.location)
            .finish_non_exhaustive()
    }
}

impl Visit {
    pub fn new(options: VisitOptions) -> Self {
        Self {
            options,
            cookies: CookieJar::new(),
            mocks: MockTable::new(),
            interceptor: None,
            hooks: Box::new(NoOpHooks),
            method: Method::Get,
            path: String::new(),
            response: ExecutionResult::default(),
        }
    }

    /// Observes every interpreter invocation of this session.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl ExecutionHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Replaces the Patchwork wrapper with another way of applying mocks.
    #[must_use]
    pub fn with_interceptor(
        mut self,
        interceptor: impl ScriptInterceptor + 'static,
    ) -> Self {
        self.interceptor = Some(Box::new(interceptor));
        self
    }

    /// Swaps the configuration. Cookies, mocks and the last response stay.
    pub fn configure(&mut self, options: VisitOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &VisitOptions {
        &self.options
    }

    pub fn get(&mut self, path: &str) -> Result<&mut Self, VisitError> {
        self.simulate(Method::Get, path, None)
    }

    /// Sends `fields` as an `application/x-www-form-urlencoded` body.
    pub fn post<I, K, V>(
        &mut self,
        path: &str,
        fields: I,
    ) -> Result<&mut Self, VisitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let body = encode_form(fields);
        self.simulate(Method::Post, path, Some(body.into_bytes()))
    }

    /// GET the last redirect target. Useful with `follow_redirect` off.
    pub fn follow_redirect(&mut self) -> Result<&mut Self, VisitError> {
        let location = self.response.location.clone();
        self.simulate(Method::Get, &location, None)
    }

    /// Redefines `symbol` with `replacement` (PHP source, e.g.
    /// `function() { return 42; }`) for every following request.
    pub fn mock(
        &mut self,
        symbol: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<&mut Self, VisitError> {
        if self.interceptor.is_none() && self.options.mock_loader.is_none() {
            return Err(InterceptError::LoaderNotConfigured.into());
        }

        self.mocks
            .insert(symbol, replacement);
        Ok(self)
    }

    pub fn unmock(&mut self, symbol: &str) -> &mut Self {
        self.mocks.remove(symbol);
        self
    }

    pub fn mocks(&self) -> &MockTable {
        &self.mocks
    }

    pub fn response(&self) -> &ExecutionResult {
        &self.response
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn location(&self) -> &str {
        &self.response.location
    }

    pub fn body(&self) -> &[u8] {
        &self.response.body
    }

    pub fn body_string(&self) -> String {
        self.response.body_string()
    }

    /// Method of the request behind the last response.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path of the request behind the last response, i.e. the final hop.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn clear_cookies(&mut self) -> &mut Self {
        self.cookies.clear();
        self
    }

    fn simulate(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<&mut Self, VisitError> {
        let previous = std::mem::take(&mut self.response).location;
        self.method = method;
        self.path = path.to_string();

        let patchwork = self
            .options
            .mock_loader
            .as_ref()
            .map(PatchworkInterceptor::new);

        let interceptor: Option<&dyn ScriptInterceptor> = match &self.interceptor {
            Some(custom) => Some(custom.as_ref()),
            None => patchwork
                .as_ref()
                .map(|p| p as &dyn ScriptInterceptor),
        };

        let outcome = RequestSimulator {
            options: &self.options,
            cookies: &mut self.cookies,
            mocks: &self.mocks,
            interceptor,
            hooks: &mut *self.hooks,
        }
        .run(method, path, body, &previous)?;

        self.method = outcome.method;
        self.path = outcome.path;
        self.response = outcome.response;
        Ok(self)
    }
}

/// Opens a visit and, for a non-empty `path`, GETs it right away.
pub fn visit(path: &str, options: VisitOptions) -> Result<Visit, VisitError> {
    let mut visit = Visit::new(options);
    if !path.is_empty() {
        visit.get(path)?;
    }
    Ok(visit)
}

fn encode_form<I, K, V>(fields: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    fields
        .into_iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
