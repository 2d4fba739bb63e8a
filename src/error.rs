//! Error handling for PCGScope
//!
//! Every error belongs to one category. Decode errors only abort the valve
//! they occurred in, persistence errors only abort the save/load action, and
//! narrative service errors are always recovered by the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for PCGScope operations
pub type Result<T> = std::result::Result<T, PcgError>;

/// Broad grouping used by callers to decide how far a failure propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or empty audio
    Decode,
    /// Case store unreadable, unparsable or unwritable
    Persistence,
    /// Narrative collaborator failure
    ExternalService,
    /// Rejected input values
    Validation,
    /// Plain filesystem / serialization failures outside the store
    Io,
}

/// Main error type for PCGScope operations
#[derive(Error, Debug)]
pub enum PcgError {
    // Decode Errors
    #[error("Invalid audio: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Persistence Errors
    #[error("Failed to read case store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write case store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Case store {path} is not a valid case collection: {source}")]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Case store is locked by another session: {path}")]
    StoreLocked { path: PathBuf },

    // External Service Errors
    #[error("Narrative service '{provider}' failed: {reason}")]
    NarrativeService { provider: String, reason: String },

    #[error("Narrative service unavailable: {reason}")]
    NarrativeUnavailable { reason: String },

    // Validation Errors
    #[error("Invalid parameter '{param}': got {value}, expected {expected}")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Invalid patient record: {reason}")]
    InvalidPatient { reason: String },

    #[error("Unknown valve: {name}")]
    UnknownValve { name: String },

    // I/O Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PcgError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            PcgError::InvalidAudio { .. } => "INVALID_AUDIO",
            PcgError::EmptyAudio => "EMPTY_AUDIO",
            PcgError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            PcgError::StoreRead { .. } => "STORE_READ",
            PcgError::StoreWrite { .. } => "STORE_WRITE",
            PcgError::StoreCorrupt { .. } => "STORE_CORRUPT",
            PcgError::StoreLocked { .. } => "STORE_LOCKED",
            PcgError::NarrativeService { .. } => "NARRATIVE_SERVICE",
            PcgError::NarrativeUnavailable { .. } => "NARRATIVE_UNAVAILABLE",
            PcgError::InvalidParameter { .. } => "INVALID_PARAMETER",
            PcgError::InvalidPatient { .. } => "INVALID_PATIENT",
            PcgError::UnknownValve { .. } => "UNKNOWN_VALVE",
            PcgError::FileNotFound { .. } => "FILE_NOT_FOUND",
            PcgError::Io(_) => "IO_ERROR",
            PcgError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            PcgError::InvalidAudio { .. }
            | PcgError::EmptyAudio
            | PcgError::UnsupportedFormat { .. } => ErrorCategory::Decode,
            PcgError::StoreRead { .. }
            | PcgError::StoreWrite { .. }
            | PcgError::StoreCorrupt { .. }
            | PcgError::StoreLocked { .. } => ErrorCategory::Persistence,
            PcgError::NarrativeService { .. } | PcgError::NarrativeUnavailable { .. } => {
                ErrorCategory::ExternalService
            }
            PcgError::InvalidParameter { .. }
            | PcgError::InvalidPatient { .. }
            | PcgError::UnknownValve { .. } => ErrorCategory::Validation,
            PcgError::FileNotFound { .. } | PcgError::Io(_) | PcgError::Serialization(_) => {
                ErrorCategory::Io
            }
        }
    }

    /// Check if the pipeline can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Decode | ErrorCategory::ExternalService
        ) || matches!(self, PcgError::StoreLocked { .. })
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            PcgError::InvalidAudio { .. } | PcgError::UnsupportedFormat { .. } => vec![
                "Export the recording as a PCM or float WAV file",
                "Check if the file plays in another application",
            ],
            PcgError::EmptyAudio => vec!["The recording has no samples - record again"],
            PcgError::StoreCorrupt { .. } => vec![
                "Restore the case store from a backup",
                "Move the damaged file aside to start a new history",
            ],
            PcgError::StoreLocked { .. } => vec![
                "Another session is saving a case - try again in a moment",
                "Delete the .lock file if no other session is running",
            ],
            PcgError::StoreRead { .. } | PcgError::StoreWrite { .. } => vec![
                "Check permissions on the case store directory",
                "Point PCG_CASE_STORE at a writable location",
            ],
            PcgError::NarrativeService { .. } | PcgError::NarrativeUnavailable { .. } => vec![
                "The rule-based report is still valid",
                "Check PCG_NARRATIVE_URL and PCG_NARRATIVE_API_KEY",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PcgError::StoreLocked {
            path: PathBuf::from("saved_cases.json"),
        };
        assert_eq!(err.error_code(), "STORE_LOCKED");
        assert_eq!(err.category(), ErrorCategory::Persistence);
    }

    #[test]
    fn test_categories_drive_recovery() {
        assert!(PcgError::EmptyAudio.is_recoverable());
        assert!(PcgError::NarrativeUnavailable {
            reason: "offline".to_string()
        }
        .is_recoverable());

        let corrupt = PcgError::StoreCorrupt {
            path: PathBuf::from("x.json"),
            source: serde_json::from_str::<Vec<u8>>("{").unwrap_err(),
        };
        assert!(!corrupt.is_recoverable());
        assert!(!corrupt.recovery_suggestions().is_empty());
    }
}
