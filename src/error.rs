use std::process::ExitStatus;

use thiserror::Error;

use crate::adapters::WebRequestError;
use crate::cgi::{ExecutionError, InterceptError};

/// Everything that can stop a visit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VisitError {
    #[error("{0}")]
    Request(#[from] WebRequestError),

    #[error("{0}")]
    Intercept(#[from] InterceptError),

    #[error(
        "{method} {path} : Procedure to handle request failed with {status}.\nOutput: {stdout}\nError: {stderr}"
    )]
    ProcessFailure {
        method: String,
        path: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("{method} {path} : Malformed CGI response, no blank line after headers.\nOutput: {stdout}")]
    Protocol {
        method: String,
        path: String,
        stdout: String,
    },

    #[error("Infinite redirection to {location}")]
    RedirectLoop { location: String },

    #[error("Stopped after {limit} redirects, last location was {location}")]
    TooManyRedirects { limit: usize, location: String },

    #[error("{method} {path} : {source}")]
    Execution {
        method: String,
        path: String,
        #[source]
        source: ExecutionError,
    },

    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
}

impl VisitError {
    /// Configuration problems are reported before anything is spawned.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Request(_)
                | Self::Intercept(_)
                | Self::Execution {
                    source: ExecutionError::ScriptNotFound(_)
                        | ExecutionError::Spawn { .. },
                    ..
                }
        )
    }

    /// Attaches the request identity to a low-level execution error.
    pub(crate) fn from_execution(
        method: &str,
        path: &str,
        err: ExecutionError,
    ) -> Self {
        match err {
            ExecutionError::NonZeroExit {
                status,
                stdout,
                stderr,
            } => Self::ProcessFailure {
                method: method.to_string(),
                path: path.to_string(),
                status,
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            },
            ExecutionError::MalformedResponse { stdout, .. } => Self::Protocol {
                method: method.to_string(),
                path: path.to_string(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
            },
            source => Self::Execution {
                method: method.to_string(),
                path: path.to_string(),
                source,
            },
        }
    }
}

/// A failed assertion against the last response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl AssertionFailure {
    pub fn new(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
