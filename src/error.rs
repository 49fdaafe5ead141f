//! Error types for the sight-ocr library.
//!
//! Every failure is fatal to the call that produced it: there is no
//! partial-success mode and nothing is retried internally. Two conditions
//! that look like failures are deliberately *not* errors:
//!
//! * an empty `Pages` array from the polling endpoint means "nothing new
//!   yet" and only triggers a delay and another poll;
//! * a non-empty per-page `Error` string is a field of
//!   [`crate::output::RecognizedPage`], delivered to the caller as data.
//!
//! Errors fall into three groups. Input errors (`UnsupportedFileType`,
//! `FileNotFound`, `PermissionDenied`, `FileRead`, `InvalidArgument`) are
//! raised while building the submission, before any network call. Transport
//! errors (`Transport`, `Network`) come from the HTTP layer. `Protocol`
//! means the service answered with a success status but a body that breaks
//! its own contract.

use std::path::PathBuf;
use thiserror::Error;

/// Shorthand for results returned by this crate.
pub type Result<T, E = SightError> = std::result::Result<T, E>;

/// All errors returned by the sight-ocr library.
#[derive(Debug, Error)]
pub enum SightError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file name does not end with one of the supported suffixes.
    #[error(
        "{path:?} does not have a valid extension; it must be one of \
         \".pdf\", \".bmp\", \".gif\", \".jpeg\", \".jpg\", or \".png\"."
    )]
    UnsupportedFileType { path: PathBuf },

    /// Input file was not found at the given path.
    #[error("File not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'\nTry: chmod +r {path:?}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading an input file.
    #[error("Failed to read '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller passed arguments the library cannot work with.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ── Transport errors ──────────────────────────────────────────────────
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} from '{url}': {body}")]
    Transport {
        url: String,
        status: u16,
        body: String,
    },

    /// The request never produced an HTTP status (DNS, TLS, connection reset,
    /// timeout when one is configured).
    #[error("Request to '{url}' failed: {reason}")]
    Network { url: String, reason: String },

    // ── Protocol errors ───────────────────────────────────────────────────
    /// HTTP succeeded but the body was not the JSON the service promises.
    #[error(
        "Got a successful HTTP status but the response was not the JSON we were expecting: {detail}"
    )]
    Protocol { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{}': {source}", .path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SightError {
    pub(crate) fn protocol(detail: impl Into<String>) -> Self {
        SightError::Protocol {
            detail: detail.into(),
        }
    }

    /// Map an I/O error on an input file to the most specific variant.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SightError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => SightError::PermissionDenied { path },
            _ => SightError::FileRead { path, source: err },
        }
    }

    /// True for errors raised before anything was sent to the service.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SightError::UnsupportedFileType { .. }
                | SightError::FileNotFound { .. }
                | SightError::PermissionDenied { .. }
                | SightError::FileRead { .. }
                | SightError::InvalidArgument(_)
                | SightError::InvalidConfig(_)
        )
    }
}
