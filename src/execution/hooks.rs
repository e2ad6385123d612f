use std::path::Path;

use super::message::ExecutionMessage;
use super::result::ExecutionResult;

/// No-op implementation of `ExecutionHooks`.
pub struct NoOpHooks;

impl ExecutionHooks for NoOpHooks {}

/// Callbacks invoked around each interpreter invocation.
///
/// All methods have default implementations that do nothing or return
/// sensible defaults. Override only what you need.
pub trait ExecutionHooks {
    /// Called right before the interpreter is spawned.
    fn on_script_executing(&mut self, script_path: &Path) {
        let _ = script_path;
    }

    /// Called after the interpreter exited, with its exit code if any.
    fn on_script_executed(&mut self, exit_code: Option<i32>) {
        let _ = exit_code;
    }

    /// Called for each response header. Return false to drop the header
    /// from the result.
    fn on_header(&mut self, name: &str, value: &str) -> bool {
        let _ = (name, value);
        true
    }

    /// Called with the parsed status code (0 when absent).
    fn on_status(&mut self, code: u16) {
        let _ = code;
    }

    /// Called for each diagnostic line from stderr.
    fn on_php_message(&mut self, message: &ExecutionMessage) {
        let _ = message;
    }

    /// Called after the response was parsed.
    fn on_request_finished(&mut self, result: &ExecutionResult) {
        let _ = result;
    }
}
