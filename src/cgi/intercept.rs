//! Function interception for mocked requests.
//!
//! The interpreter cannot be patched from the outside, so mocks are applied by
//! running a generated wrapper instead of the entry script. The wrapper loads
//! a redefinition helper (Patchwork), redefines every mocked symbol, then
//! includes the entry script.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::trace;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterceptError {
    #[error("Cannot use mocks, no mock loader (path to Patchwork.php) was configured")]
    LoaderNotConfigured,

    #[error("Mock loader not found: {0}")]
    LoaderNotFound(PathBuf),

    #[error("Failed to write mocked script next to {script}: {source}")]
    Io {
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Symbol name -> replacement source, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockTable {
    entries: Vec<(String, String)>,
}

impl MockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a replacement, overwriting an earlier one for the same symbol.
    pub fn insert(
        &mut self,
        symbol: impl Into<String>,
        replacement: impl Into<String>,
    ) {
        let symbol = symbol.into();
        let replacement = replacement.into();

        match self
            .entries
            .iter_mut()
            .find(|(s, _)| *s == symbol)
        {
            Some(slot) => slot.1 = replacement,
            None => self.entries.push((symbol, replacement)),
        }
    }

    pub fn remove(&mut self, symbol: &str) -> Option<String> {
        let pos = self
            .entries
            .iter()
            .position(|(s, _)| s == symbol)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, r)| r.as_str())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(s, r)| (s.as_str(), r.as_str()))
    }
}

/// The script to execute for one mocked invocation.
///
/// A temporary wrapper is deleted when this value is dropped, on every exit
/// path of the request that used it.
#[derive(Debug)]
pub struct InterceptedScript {
    path: PathBuf,
    _guard: Option<TempPath>,
}

impl InterceptedScript {
    /// A generated file, removed on drop.
    pub fn temporary(path: TempPath) -> Self {
        Self {
            path: path.to_path_buf(),
            _guard: Some(path),
        }
    }

    /// A script that outlives the invocation and is left alone.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _guard: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Turns an entry script plus a mock table into something runnable.
pub trait ScriptInterceptor {
    fn intercept(
        &self,
        script: &Path,
        mocks: &MockTable,
    ) -> Result<InterceptedScript, InterceptError>;
}

/// Writes a Patchwork-based wrapper next to the entry script.
#[derive(Debug, Clone)]
pub struct PatchworkInterceptor {
    loader: PathBuf,
}

impl PatchworkInterceptor {
    pub fn new(loader: impl Into<PathBuf>) -> Self {
        Self {
            loader: loader.into(),
        }
    }

    pub fn loader(&self) -> &Path {
        &self.loader
    }

    /// PHP source of the wrapper, without touching the filesystem.
    pub fn wrapper_source(&self, script: &Path, mocks: &MockTable) -> String {
        let mut source = String::from("<?php\n");
        source.push_str(&format!(
            "require_once {};\n\n",
            php_string(&self.loader.to_string_lossy())
        ));
        source.push_str("use function Patchwork\\{redefine};\n\n");

        for (symbol, replacement) in mocks.iter() {
            source.push_str(&format!(
                "redefine({}, {});\n",
                php_string(symbol),
                replacement
            ));
        }

        source.push_str(&format!(
            "\ninclude {};\n",
            php_string(&script.to_string_lossy())
        ));
        source
    }
}

impl ScriptInterceptor for PatchworkInterceptor {
    fn intercept(
        &self,
        script: &Path,
        mocks: &MockTable,
    ) -> Result<InterceptedScript, InterceptError> {
        if !self.loader.exists() {
            return Err(InterceptError::LoaderNotFound(self.loader.clone()));
        }

        let loader = std::fs::canonicalize(&self.loader)
            .unwrap_or_else(|_| self.loader.clone());
        let source = Self::new(loader).wrapper_source(script, mocks);

        let io_err = |source| InterceptError::Io {
            script: script.to_path_buf(),
            source,
        };

        let dir = script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let stem = script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let suffix = script
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix(&format!("_mocked_{}_", stem))
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(io_err)?;

        file.write_all(source.as_bytes())
            .and_then(|_| file.flush())
            .map_err(io_err)?;

        let path = file.into_temp_path();

        #[cfg(feature = "tracing")]
        trace!(wrapper = %path.display(), mocks = mocks.len(), "Wrote mocked script");

        Ok(InterceptedScript::temporary(path))
    }
}

/// Single-quoted PHP string literal.
fn php_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
