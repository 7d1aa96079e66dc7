//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::EngineError;
use crate::scanner::ScanError;

/// Exit codes for the mostsimilar application.
///
/// - 0: Success
/// - 1: General error (bad arguments, unreadable config, output failure)
/// - 2: Nothing to compare, or some duplicates could not be moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Too few usable documents, or a partial relocation failure.
    Incomplete = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "MS000",
            Self::GeneralError => "MS001",
            Self::Incomplete => "MS002",
        }
    }

    /// Exit code for an error returned by [`crate::run_app`].
    ///
    /// Corpus problems (nothing found, fewer than two usable files, an
    /// unusable sample) map to [`ExitCode::Incomplete`]; everything else is a
    /// general error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let corpus_problem = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<EngineError>(),
                Some(
                    EngineError::InsufficientCorpus { .. }
                        | EngineError::EmptySample { .. }
                        | EngineError::Sample(_)
                )
            ) || cause.downcast_ref::<NoFilesFound>().is_some()
        });
        if corpus_problem {
            Self::Incomplete
        } else {
            Self::GeneralError
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // Every variant fits in a u8.
        Self::from(code.as_i32() as u8)
    }
}

/// No candidate files were found under the scanned directory.
#[derive(Debug, thiserror::Error)]
#[error("No files found under {0}")]
pub struct NoFilesFound(pub std::path::PathBuf);

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "MS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Underlying causes, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    /// Whether the error came from directory scanning
    pub scan_error: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
            scan_error: err.chain().any(|c| c.downcast_ref::<ScanError>().is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::Incomplete.as_i32(), 2);
        assert_eq!(ExitCode::Incomplete.code_prefix(), "MS002");
    }

    #[test]
    fn test_insufficient_corpus_maps_to_incomplete() {
        let err = anyhow::Error::new(EngineError::InsufficientCorpus { usable: 1 });
        assert_eq!(ExitCode::for_error(&err), ExitCode::Incomplete);

        let wrapped = Err::<(), _>(EngineError::InsufficientCorpus { usable: 0 })
            .context("Matching failed")
            .unwrap_err();
        assert_eq!(ExitCode::for_error(&wrapped), ExitCode::Incomplete);
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("bad threshold");
        assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    }

    #[test]
    fn test_structured_error_json() {
        let err = Err::<(), _>(NoFilesFound("/tmp/empty".into()))
            .context("Scan failed")
            .unwrap_err();
        let structured = StructuredError::new(&err, ExitCode::for_error(&err));
        let json = serde_json::to_value(&structured).unwrap();
        assert_eq!(json["code"], "MS002");
        assert_eq!(json["exit_code"], 2);
        assert_eq!(json["message"], "Scan failed");
        assert_eq!(json["causes"][0], "No files found under /tmp/empty");
        assert_eq!(json["scan_error"], false);
    }
}
