//! Progress-callback trait for recognition events.
//!
//! Inject an [`Arc<dyn RecognitionProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to receive
//! events as the poller makes progress. Callbacks fire from the task that is
//! pulling the batch stream, in the same order the events happen.
//!
//! # Example
//!
//! ```rust
//! use sight_ocr::{ClientConfig, RecognitionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct BatchCounter {
//!     batches: AtomicUsize,
//! }
//!
//! impl RecognitionProgressCallback for BatchCounter {
//!     fn on_batch(&self, batch_len: usize, files_complete: usize, total_files: usize) {
//!         let n = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("batch {n}: {batch_len} pages, {files_complete}/{total_files} files done");
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .api_key("my-key")
//!     .progress_callback(Arc::new(BatchCounter { batches: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the poller as a recognition job advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RecognitionProgressCallback: Send + Sync {
    /// Called once, right before the submission request is sent.
    fn on_submission_start(&self, file_count: usize) {
        let _ = file_count;
    }

    /// Called when the service accepts the job asynchronously.
    fn on_polling_started(&self, polling_url: &str) {
        let _ = polling_url;
    }

    /// Called for every emitted batch, after completion bookkeeping.
    ///
    /// # Arguments
    /// * `batch_len`: pages in this batch (duplicates included)
    /// * `files_complete`: files whose every page has now been seen
    /// * `total_files`: files in the submission
    fn on_batch(&self, batch_len: usize, files_complete: usize, total_files: usize) {
        let _ = (batch_len, files_complete, total_files);
    }

    /// Called once when every page of every file has been seen.
    ///
    /// `pages_emitted` counts page records across all batches, so it can
    /// exceed the true page total when the service repeats pages.
    fn on_recognition_complete(&self, pages_emitted: usize) {
        let _ = pages_emitted;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RecognitionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn RecognitionProgressCallback>;
