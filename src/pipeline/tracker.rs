//! Completion tracking across partial poll responses.
//!
//! The service reports pages in arbitrary batches, may repeat pages it
//! already reported, and only tells us how many pages a file has once the
//! first page of that file shows up. [`CompletionState`] keeps one entry per
//! submitted file and answers a single question: has every page of every
//! file been seen at least once?
//!
//! Invariants:
//! * an entry goes `Unseen → Tracking(n)` exactly once and never resizes;
//!   the first `NumberOfPagesInFile` reported for a file wins;
//! * marks only ever go from `false` to `true`;
//! * complete ⇔ every entry is `Tracking` and every mark is `true`.

use crate::error::SightError;
use crate::output::RecognizedPage;
use tracing::warn;

/// Per-file completion state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileProgress {
    /// No page of this file has been reported; page count unknown.
    Unseen,
    /// One flag per page, index `page_number - 1`.
    Tracking(Vec<bool>),
}

impl FileProgress {
    pub fn is_complete(&self) -> bool {
        match self {
            FileProgress::Unseen => false,
            FileProgress::Tracking(seen) => seen.iter().all(|&s| s),
        }
    }
}

/// Completion bookkeeping for one recognition call.
#[derive(Debug, Clone)]
pub struct CompletionState {
    files: Vec<FileProgress>,
}

impl CompletionState {
    /// Fresh state for `file_count` submitted files, all unseen.
    pub fn new(file_count: usize) -> Self {
        Self {
            files: vec![FileProgress::Unseen; file_count],
        }
    }

    /// Record one reported page.
    ///
    /// Fails with a protocol error when the page cannot belong to this
    /// submission: unknown file index, zero page count, or a page number
    /// outside `1..=pages`.
    pub fn observe(&mut self, page: &RecognizedPage) -> Result<(), SightError> {
        let total_files = self.files.len();
        let entry = self.files.get_mut(page.file_index).ok_or_else(|| {
            SightError::protocol(format!(
                "page reports FileIndex {} but only {} files were submitted",
                page.file_index, total_files
            ))
        })?;

        if let FileProgress::Unseen = entry {
            if page.number_of_pages_in_file == 0 {
                return Err(SightError::protocol(format!(
                    "file {} reported with NumberOfPagesInFile 0",
                    page.file_index
                )));
            }
            let count = page.number_of_pages_in_file;
            let mut seen = Vec::new();
            seen.try_reserve_exact(count).map_err(|_| {
                SightError::protocol(format!(
                    "file {} reported with NumberOfPagesInFile {} which cannot be tracked",
                    page.file_index, count
                ))
            })?;
            seen.resize(count, false);
            *entry = FileProgress::Tracking(seen);
        }

        if let FileProgress::Tracking(seen) = entry {
            if page.number_of_pages_in_file != seen.len() {
                warn!(
                    "File {}: page {} reports {} pages, keeping first-seen count {}",
                    page.file_index,
                    page.page_number,
                    page.number_of_pages_in_file,
                    seen.len()
                );
            }

            if page.page_number == 0 || page.page_number > seen.len() {
                return Err(SightError::protocol(format!(
                    "file {} has {} pages but PageNumber {} was reported",
                    page.file_index,
                    seen.len(),
                    page.page_number
                )));
            }

            seen[page.page_number - 1] = true;
        }
        Ok(())
    }

    /// Record every page of a batch, in order.
    pub fn observe_batch(&mut self, pages: &[RecognizedPage]) -> Result<(), SightError> {
        pages.iter().try_for_each(|p| self.observe(p))
    }

    /// True once every page of every file has been seen.
    pub fn is_complete(&self) -> bool {
        self.files.iter().all(FileProgress::is_complete)
    }

    /// Number of files whose every page has been seen.
    pub fn files_complete(&self) -> usize {
        self.files.iter().filter(|f| f.is_complete()).count()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn file(&self, index: usize) -> Option<&FileProgress> {
        self.files.get(index)
    }
}
