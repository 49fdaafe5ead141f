//! Result types delivered to callers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One recognized page, exactly as reported by the service.
///
/// Field names on the wire are PascalCase. `file_index` is the 0-based
/// position of the file in the caller's submission order; `page_number` is
/// 1-based within that file.
///
/// The three integer fields are required. An absent `RecognizedText` or
/// `Error` key is read as the empty string, so a missing `Error` means the
/// page succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecognizedPage {
    pub file_index: usize,
    pub page_number: usize,
    pub number_of_pages_in_file: usize,
    #[serde(default)]
    pub recognized_text: String,
    /// Server-side recognition failure for this page; empty on success.
    #[serde(default)]
    pub error: String,
}

impl RecognizedPage {
    /// The page produced when the service answers a submission synchronously.
    pub(crate) fn synchronous(recognized_text: String) -> Self {
        Self {
            file_index: 0,
            page_number: 1,
            number_of_pages_in_file: 1,
            recognized_text,
            error: String::new(),
        }
    }

    /// `(file_index, page_number)`, the identity of a page across batches.
    pub fn key(&self) -> (usize, usize) {
        (self.file_index, self.page_number)
    }

    /// True when the service reported a recognition failure for this page.
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// The pages returned by one poll, in the order the service listed them.
pub type PageBatch = Vec<RecognizedPage>;

/// Drop repeated pages, keeping the first record for each
/// `(file_index, page_number)` and preserving emission order otherwise.
///
/// The batch stream delivers whatever each poll returned, which may include
/// pages already delivered earlier. Use this when one record per page is
/// required.
pub fn dedup_pages(pages: Vec<RecognizedPage>) -> Vec<RecognizedPage> {
    let mut seen = HashSet::with_capacity(pages.len());
    pages.into_iter().filter(|p| seen.insert(p.key())).collect()
}
