use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while parsing, validating, resolving or running workspace tools.
#[derive(Debug, Error)]
pub enum Error {
    /// Grammar violation in a workspace descriptor (1-based line number).
    #[error("line {line}: {reason}")]
    Format { line: usize, reason: String },

    /// The descriptor is well formed but references missing paths or lacks fields.
    #[error("workspace validation failed: {}", .problems.join("; "))]
    Validation { problems: Vec<String> },

    /// A tool's executable could not be determined or is unusable.
    #[error("cannot resolve tool '{tool}': {reason}")]
    Resolution { tool: String, reason: String },

    /// The executable could not be spawned at all.
    #[error("failed to spawn {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The executable ran and exited unsuccessfully.
    #[error("tool '{tool}' command '{command}' exited with status {code}")]
    ExitStatus {
        tool: String,
        command: String,
        code: i32,
    },

    #[error("tool {0} not found in workspace")]
    ToolNotFound(String),

    #[error("workspace file path not set")]
    SourcePathUnset,

    #[error("workspace file not found in directory tree starting from {start:?}")]
    DescriptorNotFound { start: PathBuf },

    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Error::Format {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code of a dispatched tool that ran and failed, if that is what this error is.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ExitStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_carries_line_number() {
        let err = Error::format(3, "products section not properly closed with ')'");
        assert_eq!(
            err.to_string(),
            "line 3: products section not properly closed with ')'"
        );
    }

    #[test]
    fn validation_error_lists_every_problem() {
        let err = Error::Validation {
            problems: vec![
                "organization path does not exist: /a".to_string(),
                "product path does not exist: /b".to_string(),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("/a"));
        assert!(message.contains("/b"));
    }

    #[test]
    fn only_exit_status_has_exit_code() {
        let failed = Error::ExitStatus {
            tool: "x".to_string(),
            command: "build".to_string(),
            code: 7,
        };
        assert_eq!(failed.exit_code(), Some(7));
        assert_eq!(Error::SourcePathUnset.exit_code(), None);
    }
}
