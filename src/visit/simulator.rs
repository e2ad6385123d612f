//! One request chain: build the CGI context, run the interpreter, collect
//! cookies, and chase redirects until a response without `Location`.

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use super::cookies::CookieJar;
use super::options::VisitOptions;
use crate::adapters::{Method, WebRequest};
use crate::cgi::{Executor, InterceptError, MockTable, ScriptInterceptor};
use crate::error::VisitError;
use crate::execution::{ExecutionHooks, ExecutionResult};

/// Final hop of a chain and the request that produced it.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub method: Method,
    pub path: String,
    pub response: ExecutionResult,
}

pub(crate) struct RequestSimulator<'a> {
    pub options: &'a VisitOptions,
    pub cookies: &'a mut CookieJar,
    pub mocks: &'a MockTable,
    pub interceptor: Option<&'a dyn ScriptInterceptor>,
    pub hooks: &'a mut dyn ExecutionHooks,
}

impl RequestSimulator<'_> {
    /// Runs `method path`, then follows redirects when enabled.
    ///
    /// `previous_location` is the redirect target of the session's prior
    /// response; a 302 back to the same target is a loop.
    pub fn run(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        previous_location: &str,
    ) -> Result<Outcome, VisitError> {
        let mut method = method;
        let mut path = path.to_string();
        let mut body = body;
        let mut previous = previous_location.to_string();
        let mut hops = 0;

        loop {
            let response = self.invoke(method, &path, body.take())?;

            if response.status == 302
                && !response.location.is_empty()
                && response.location == previous
            {
                return Err(VisitError::RedirectLoop {
                    location: response.location,
                });
            }

            if response.location.is_empty() || !self.options.follow_redirect {
                return Ok(Outcome {
                    method,
                    path,
                    response,
                });
            }

            hops += 1;
            if hops > self.options.max_redirects {
                return Err(VisitError::TooManyRedirects {
                    limit: self.options.max_redirects,
                    location: response.location,
                });
            }

            #[cfg(feature = "tracing")]
            debug!(from = %path, to = %response.location, hops, "Following redirect");

            previous = response.location.clone();
            path = response.location;
            method = Method::Get;
        }
    }

    /// Exactly one interpreter invocation.
    fn invoke(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ExecutionResult, VisitError> {
        let options = self.options;

        let mut request = WebRequest::new(method)
            .with_uri(path)
            .with_document_root(&options.docroot)
            .with_cookies(self.cookies.iter())
            .with_ini(
                "session.save_path",
                options
                    .session_save_path
                    .to_string_lossy(),
            );

        if let Some(body) = body {
            request = request.with_body(body);
        }

        let ctx = request.build(&options.script)?;

        // Dropping the wrapper deletes it, whichever way this function exits.
        let wrapper = if self.mocks.is_empty() {
            None
        } else {
            let interceptor = self
                .interceptor
                .ok_or(InterceptError::LoaderNotConfigured)?;
            Some(interceptor.intercept(&ctx.script_path, self.mocks)?)
        };

        let ctx = match &wrapper {
            Some(script) => ctx.with_script_path(script.path()),
            None => ctx,
        };

        let result = Executor::new(&options.interpreter)
            .with_timeout(options.timeout)
            .execute_with_hooks(ctx, &mut *self.hooks);

        drop(wrapper);

        let response = result.map_err(|err| {
            VisitError::from_execution(method.as_str(), path, err)
        })?;

        self.cookies
            .extend(response.cookies.iter().cloned());

        if !response.stderr.is_empty() {
            #[cfg(feature = "tracing")]
            warn!(method = %method, path, "Interpreter wrote to stderr");

            if options.echo_stderr {
                eprintln!("  STDERR: {}", response.stderr_string());
            }
        }

        Ok(response)
    }
}
