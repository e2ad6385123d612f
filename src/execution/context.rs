use std::path::PathBuf;

use crate::cgi::ServerVars;

/// Everything needed for one interpreter invocation.
///
/// `server_vars` become the child's CGI environment on top of the host
/// environment; `ini_overrides` are passed as `-d key=value` flags.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub input: Vec<u8>,
    pub script_path: PathBuf,
    pub server_vars: ServerVars,
    pub ini_overrides: Vec<(String, String)>,
}

impl ExecutionContext {
    pub fn script(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Vec::new(),
            script_path: path.into(),
            server_vars: ServerVars::new(),
            ini_overrides: Vec::new(),
        }
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_vars.set(key, value);
        self
    }

    pub fn input(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.input = bytes.into();
        self
    }

    pub fn ini(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ini_overrides.push((key.into(), value.into()));
        self
    }

    /// Points the invocation at another script, e.g. a mock wrapper.
    ///
    /// `SCRIPT_NAME` and `SCRIPT_FILENAME` follow the new path.
    pub fn with_script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.script_path = path.into();
        self.server_vars
            .script_filename(&self.script_path)
            .script_name(&script_basename(&self.script_path));
        self
    }

    /// CGI variables layered over the inherited environment, in set order.
    pub fn environment(&self) -> impl Iterator<Item = (&str, &str)> {
        self.server_vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub(crate) fn script_basename(path: &std::path::Path) -> String {
    path.file_name()
        .map(|s| {
            s.to_string_lossy()
                .into_owned()
        })
        .unwrap_or_default()
}
