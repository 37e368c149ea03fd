use std::fmt::Display;

use metrics::counter;
use thiserror::Error;
use tracing::debug;

/// Common result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Failures raised while decoding or encoding Chef wire documents.
///
/// None of these are retried internally. `VersionResolution` is the only one
/// a caller can reasonably retry, by asking for the wire format again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed document ({reason}): {document}")]
    MalformedDocument { reason: String, document: String },
    #[error("embedded identifier `{embedded}` does not match item identifier `{stored}`")]
    ConsistencyViolation { stored: String, embedded: String },
    #[error("invalid key material in `{header}`: {reason}")]
    KeyFormat { header: String, reason: String },
    #[error("failed to resolve server version: {0}")]
    VersionResolution(String),
}

impl CodecError {
    pub(crate) fn malformed(reason: impl Display, document: &str) -> Self {
        Self::MalformedDocument {
            reason: reason.to_string(),
            document: document.to_string(),
        }
    }

    pub(crate) fn key_format(header: impl Into<String>, reason: impl Display) -> Self {
        Self::KeyFormat {
            header: header.into(),
            reason: reason.to_string(),
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedDocument { .. } => "malformed_document",
            Self::ConsistencyViolation { .. } => "consistency_violation",
            Self::KeyFormat { .. } => "key_format",
            Self::VersionResolution(_) => "version_resolution",
        }
    }
}

impl From<reqwest::Error> for CodecError {
    fn from(value: reqwest::Error) -> Self {
        Self::VersionResolution(value.to_string())
    }
}

/// Counts a failure before it is handed back to the caller.
pub(crate) fn record_failure(err: &CodecError) {
    debug!(kind = err.kind(), %err, "codec failure");
    counter!("chef_codec_failures_total", "kind" => err.kind()).increment(1);
}
