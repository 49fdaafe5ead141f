//! File-extension → MIME type table.
//!
//! Matching is a case-sensitive suffix test on the path string: `scan.PNG`
//! is rejected. The service only accepts these six types.

use serde::{Serialize, Serializer};
use std::fmt;

/// A MIME type the recognition service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    Pdf,
    Bmp,
    Gif,
    Jpeg,
    /// `.jpg` files are sent as `image/jpg`, not `image/jpeg`.
    Jpg,
    Png,
}

/// Suffix table, checked in order.
static SUFFIXES: [(&str, MimeType); 6] = [
    (".pdf", MimeType::Pdf),
    (".bmp", MimeType::Bmp),
    (".gif", MimeType::Gif),
    (".jpeg", MimeType::Jpeg),
    (".jpg", MimeType::Jpg),
    (".png", MimeType::Png),
];

impl MimeType {
    /// Infer the MIME type from a path's suffix.
    pub fn from_path(path: &str) -> Option<Self> {
        SUFFIXES
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map(|&(_, mime)| mime)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Pdf => "application/pdf",
            MimeType::Bmp => "image/bmp",
            MimeType::Gif => "image/gif",
            MimeType::Jpeg => "image/jpeg",
            MimeType::Jpg => "image/jpg",
            MimeType::Png => "image/png",
        }
    }

    /// All accepted suffixes, including the leading dot.
    pub fn supported_suffixes() -> impl Iterator<Item = &'static str> {
        SUFFIXES.iter().map(|(suffix, _)| *suffix)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MimeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
