//! Submission building: file paths → base64 JSON payload.
//!
//! The service accepts every file inline in a single JSON body. The order
//! of `files` in the payload is the contract for every later `FileIndex`
//! the service reports, so it must match the caller's order exactly.

use crate::error::SightError;
use crate::pipeline::mime::MimeType;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One input file, ready for submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionFile {
    #[serde(rename = "mimeType")]
    pub mime_type: MimeType,
    /// Base64 (standard alphabet, padded) file contents.
    #[serde(rename = "base64File")]
    pub content: String,
}

impl SubmissionFile {
    /// Wrap in-memory bytes.
    pub fn from_bytes(mime_type: MimeType, bytes: &[u8]) -> Self {
        Self {
            mime_type,
            content: STANDARD.encode(bytes),
        }
    }
}

/// The JSON body of a submission request: `{"files": [...]}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionPayload {
    pub files: Vec<SubmissionFile>,
}

impl SubmissionPayload {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Check every path's suffix without touching the file system.
///
/// Returns the paths paired with their MIME types, in input order.
pub fn classify<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
) -> Result<Vec<(PathBuf, MimeType)>, SightError> {
    let mut out = Vec::new();
    for p in paths {
        let path = p.as_ref();
        let name = path.to_str().ok_or_else(|| {
            SightError::InvalidArgument(format!(
                "file path {path:?} is not valid UTF-8"
            ))
        })?;
        let mime = MimeType::from_path(name).ok_or_else(|| SightError::UnsupportedFileType {
            path: path.to_path_buf(),
        })?;
        out.push((path.to_path_buf(), mime));
    }
    if out.is_empty() {
        return Err(SightError::InvalidArgument(
            "at least one file must be submitted".into(),
        ));
    }
    Ok(out)
}

/// Build the submission payload for `paths`.
///
/// All suffixes are validated before any file is read, so an unsupported
/// file late in the list fails fast without reading the others.
pub async fn build_payload<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
) -> Result<SubmissionPayload, SightError> {
    let classified = classify(paths)?;
    let mut files = Vec::with_capacity(classified.len());

    for (path, mime) in classified {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SightError::from_io(path.clone(), e))?;
        let file = SubmissionFile::from_bytes(mime, &bytes);
        debug!(
            "Encoded {} ({}) → {} bytes base64",
            path.display(),
            mime,
            file.content.len()
        );
        files.push(file);
    }

    Ok(SubmissionPayload { files })
}
