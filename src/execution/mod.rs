mod context;
mod header;
mod hooks;
mod message;
mod result;

pub use context::ExecutionContext;
pub(crate) use context::script_basename;
pub use header::ResponseHeader;
pub use hooks::{ExecutionHooks, NoOpHooks};
pub use message::{ExecutionMessage, SyslogLevel};
pub use result::ExecutionResult;
