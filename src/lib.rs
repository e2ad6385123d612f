//! Drive a PHP application through `php-cgi` from Rust tests, without a web
//! server.
//!
//! Every request spawns the CGI interpreter once, feeds it a CGI environment
//! and body, and parses the raw response (status, `Location`, `Set-Cookie`,
//! body). A [`Visit`] carries cookies from one request to the next, follows
//! redirects, and can redefine PHP functions through Patchwork for the
//! duration of a request.
//!
//! # Example
//!
//! ```no_run
//! use cgi_visit::{visit, VisitOptions};
//!
//! # fn main() -> Result<(), cgi_visit::VisitError> {
//! let options = VisitOptions::app("./public", "./public/index.php");
//!
//! visit("/", options.clone())?
//!     .assert_see("Hello World");
//!
//! visit("/redirect", options.with_follow_redirect(false))?
//!     .assert_redirect("/destination")
//!     .follow_redirect()?
//!     .assert_see("Final");
//! # Ok(())
//! # }
//! ```
//!
//! # Lower level
//!
//! [`WebRequest`] builds an [`ExecutionContext`] and an [`Executor`] runs it
//! once, which is handy when a test needs no session at all.

pub mod adapters;
pub mod cgi;
pub mod execution;

mod error;
mod visit;

pub use adapters::{Method, WebRequest, WebRequestError};

pub use cgi::{
    ExecutionError, Executor, InterceptError, Interpreter, MockTable,
    PatchworkInterceptor, ScriptInterceptor,
};

pub use execution::{
    ExecutionContext, ExecutionHooks, ExecutionMessage, ExecutionResult,
    NoOpHooks, ResponseHeader, SyslogLevel,
};

pub use error::{AssertionFailure, VisitError};
pub use visit::{visit, CookieJar, Visit, VisitOptions};

pub mod prelude {
    pub use crate::{
        visit, AssertionFailure, CookieJar, ExecutionHooks, ExecutionResult,
        Interpreter, Method, Visit, VisitError, VisitOptions,
    };
}
