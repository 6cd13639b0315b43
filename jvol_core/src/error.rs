//! Error types for the JVOL codec pipeline.

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, JvolError>;

/// Errors raised while encoding or decoding a volume.
///
/// Three families: usage errors (bad parameters from the caller), format
/// errors (missing or inconsistent stored fields) and stream-corruption
/// errors (entropy-coded or run-length data that does not add up). Every
/// variant aborts the current call; nothing is retried or zero-filled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JvolError {
    /// Quality outside `1..=100`.
    #[error("quality must be in 1..=100, got {0}")]
    InvalidQuality(i64),

    /// A block dimension is zero.
    #[error("invalid block shape {0:?}: every dimension must be positive")]
    InvalidBlockShape([usize; 3]),

    /// A volume dimension is zero or does not match the sample count.
    #[error("invalid volume shape {shape:?}: {reason}")]
    InvalidShape { shape: [usize; 3], reason: String },

    /// Any other caller mistake (symbol without a code, bad options).
    #[error("usage error: {0}")]
    Usage(String),

    /// A stored field is missing, malformed or inconsistent with the others.
    #[error("format error in `{field}`: {reason}")]
    Format { field: &'static str, reason: String },

    /// Entropy-coded or run-length data could not be decoded consistently.
    #[error("corrupt stream in {stage}: {reason}")]
    CorruptStream { stage: &'static str, reason: String },
}

impl JvolError {
    pub(crate) fn format(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Format {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::CorruptStream {
            stage,
            reason: reason.into(),
        }
    }
}
