//! Request execution engine.
//!
//! Spawns the interpreter once per request: CGI environment in, request body
//! on stdin, response on stdout, diagnostics on stderr.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::{debug, error, trace, warn};

use super::response;
use super::Interpreter;
use crate::execution::{
    ExecutionContext, ExecutionHooks, ExecutionMessage, ExecutionResult,
    NoOpHooks,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors that can occur while running one interpreter invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutionError {
    #[error("Script not found: {0}")]
    ScriptNotFound(PathBuf),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to the interpreter: {0}")]
    Io(#[from] std::io::Error),

    #[error("Interpreter failed with {status}")]
    NonZeroExit {
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },

    #[error("Interpreter did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Response has no header/body separator")]
    MalformedResponse { stdout: Vec<u8>, stderr: Vec<u8> },
}

/// Runs execution contexts through one interpreter.
pub struct Executor<'a> {
    interpreter: &'a Interpreter,
    timeout: Option<Duration>,
}

impl<'a> Executor<'a> {
    pub fn new(interpreter: &'a Interpreter) -> Self {
        Self {
            interpreter,
            timeout: None,
        }
    }

    /// Kills the interpreter if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn execute(
        &self,
        ctx: ExecutionContext,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.execute_with_hooks(ctx, &mut NoOpHooks)
    }

    pub fn execute_with_hooks(
        &self,
        ctx: ExecutionContext,
        hooks: &mut dyn ExecutionHooks,
    ) -> Result<ExecutionResult, ExecutionError> {
        #[cfg(feature = "tracing")]
        debug!(
            script_path = %ctx.script_path.display(),
            input_len = ctx.input.len(),
            "Executing PHP"
        );

        if !ctx.script_path.exists() {
            return Err(ExecutionError::ScriptNotFound(
                ctx.script_path.clone(),
            ));
        }

        let mut command = self.interpreter.command(&ctx);
        command
            .envs(ctx.environment())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        hooks.on_script_executing(&ctx.script_path);

        #[cfg(feature = "tracing")]
        trace!(command = ?command, "Spawning interpreter");

        let mut child =
            command
                .spawn()
                .map_err(|source| ExecutionError::Spawn {
                    program: self
                        .interpreter
                        .program()
                        .to_string_lossy()
                        .into_owned(),
                    source,
                })?;

        // The body is fed from its own thread so a script that writes before
        // reading cannot deadlock against a full pipe.
        let stdin = child.stdin.take();
        let input = ctx.input;
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(&input);
            }
        });

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child)?;

        let _ = writer.join();
        let stdout = join_drain(stdout)?;
        let stderr = join_drain(stderr)?;

        hooks.on_script_executed(status.code());

        if !status.success() {
            #[cfg(feature = "tracing")]
            error!(%status, "Interpreter exited unsuccessfully");
            return Err(ExecutionError::NonZeroExit {
                status,
                stdout,
                stderr,
            });
        }

        let Some(parsed) = response::parse(&stdout) else {
            return Err(ExecutionError::MalformedResponse { stdout, stderr });
        };

        let messages = ExecutionMessage::parse_stderr(&stderr);
        for message in &messages {
            #[cfg(feature = "tracing")]
            warn!(message = %message.message, level = %message.level, "PHP diagnostic");
            hooks.on_php_message(message);
        }

        let headers = parsed
            .headers
            .into_iter()
            .filter(|h| hooks.on_header(h.name(), h.value()))
            .collect::<Vec<_>>();

        hooks.on_status(parsed.status);

        #[cfg(feature = "tracing")]
        debug!(
            status = parsed.status,
            location = %parsed.location,
            body_len = parsed.body.len(),
            headers_count = headers.len(),
            cookies_count = parsed.cookies.len(),
            "Execution succeeded"
        );

        let result = ExecutionResult {
            status: parsed.status,
            location: parsed.location,
            body: parsed.body,
            headers,
            cookies: parsed.cookies,
            stdout,
            stderr,
            messages,
        };

        hooks.on_request_finished(&result);

        Ok(result)
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ExecutionError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }

            if Instant::now() >= deadline {
                #[cfg(feature = "tracing")]
                error!(?timeout, "Interpreter timed out, killing it");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecutionError::TimedOut(timeout));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

type Drain = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn join_drain(handle: Drain) -> Result<Vec<u8>, ExecutionError> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| {
                std::io::Error::other("pipe reader thread panicked")
            })?
            .map_err(ExecutionError::Io),
        None => Ok(Vec::new()),
    }
}
