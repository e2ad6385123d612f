/// Severity of a PHP diagnostic, ordered most severe first.
///
/// Only the levels php-cgi actually prefixes its log lines with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyslogLevel {
    Error,
    Warning,
    Notice,
    Info,
}

impl SyslogLevel {
    pub fn is_error_or_worse(&self) -> bool {
        *self == Self::Error
    }

    pub fn is_warning_or_worse(&self) -> bool {
        *self <= Self::Warning
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "err",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for SyslogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefixes php-cgi puts in front of logged errors, most severe first.
const PHP_LOG_PREFIXES: &[(&str, SyslogLevel)] = &[
    ("PHP Fatal error", SyslogLevel::Error),
    ("PHP Parse error", SyslogLevel::Error),
    ("PHP Recoverable fatal error", SyslogLevel::Error),
    ("PHP Warning", SyslogLevel::Warning),
    ("PHP Notice", SyslogLevel::Notice),
    ("PHP Deprecated", SyslogLevel::Notice),
    ("PHP Strict Standards", SyslogLevel::Info),
];

/// A diagnostic line captured from the interpreter's stderr.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ExecutionMessage {
    pub message: String,
    pub level: SyslogLevel,
}

impl ExecutionMessage {
    pub fn new(level: SyslogLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    /// Classifies one stderr line by its `PHP <Level>:` prefix.
    ///
    /// Lines without a known prefix are reported as warnings.
    pub fn from_stderr_line(line: &str) -> Self {
        let line = line.trim_end_matches('\r');
        let level = PHP_LOG_PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|&(_, level)| level)
            .unwrap_or(SyslogLevel::Warning);

        Self::new(level, line)
    }

    /// Splits a whole stderr capture into messages, skipping blank lines.
    pub fn parse_stderr(stderr: &[u8]) -> Vec<Self> {
        String::from_utf8_lossy(stderr)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Self::from_stderr_line)
            .collect()
    }

    pub fn is_error(&self) -> bool {
        self.level.is_error_or_worse()
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.level, SyslogLevel::Warning)
    }

    pub fn is_warning_or_worse(&self) -> bool {
        self.level
            .is_warning_or_worse()
    }
}

impl std::fmt::Display for ExecutionMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}
