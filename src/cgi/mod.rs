use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

mod executor;
pub mod intercept;
pub mod response;
mod server_vars;

pub use executor::{ExecutionError, Executor};
pub use intercept::{
    InterceptError, InterceptedScript, MockTable, PatchworkInterceptor,
    ScriptInterceptor,
};
pub use server_vars::ServerVars;

use crate::execution::ExecutionContext;

/// Environment variable that overrides the interpreter binary.
pub const INTERPRETER_ENV: &str = "PHP_CGI_BIN";

pub(crate) static DEFAULT_PROGRAM: &str = "php-cgi";

/// INI settings every invocation runs with, in the order they are passed.
pub(crate) static CGI_FLAGS: &[(&str, &str)] = &[
    ("variables_order", "EGPCS"),
    ("log_errors", "On"),
    ("cgi.force_redirect", "0"),
    ("opcache.jit", "disable"),
];

/// The CGI binary plus any arguments that precede the `-d` flags.
///
/// Leading arguments let a wrapper stand in for php-cgi, e.g.
/// `Interpreter::new("sh").with_arg("fake-cgi.sh")`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interpreter {
    program: PathBuf,
    #[cfg_attr(feature = "serde", serde(default))]
    args: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Interpreter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `$PHP_CGI_BIN` when set and non-empty, `php-cgi` from `PATH` otherwise.
    pub fn from_env() -> Self {
        let program = std::env::var_os(INTERPRETER_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM));

        Self::new(program)
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(
            iter.into_iter()
                .map(|s| s.into()),
        );
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Full argument list for one invocation: leading args, fixed CGI flags,
    /// per-request INI overrides, then the script path.
    pub fn arguments(&self, ctx: &ExecutionContext) -> Vec<String> {
        let mut argv = self.args.clone();

        let mut define = |key: &str, value: &str| {
            argv.push("-d".to_string());
            argv.push(format!("{}={}", key, value));
        };

        for &(key, value) in CGI_FLAGS {
            define(key, value);
        }
        for (key, value) in &ctx.ini_overrides {
            define(key, value);
        }

        argv.push(
            ctx.script_path
                .to_string_lossy()
                .into_owned(),
        );
        argv
    }

    pub(crate) fn command(&self, ctx: &ExecutionContext) -> Command {
        let mut command = Command::new(&self.program);
        command.args(
            self.arguments(ctx)
                .iter()
                .map(OsStr::new),
        );
        command
    }
}
