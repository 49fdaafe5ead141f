//! Streaming recognition API: emit page batches as the service reports them.
//!
//! Recognition is asynchronous on the server side: the submission returns a
//! polling URL, and each poll returns whatever pages have been recognized so
//! far. [`recognize_stream`] turns that unbounded polling loop into a finite
//! `Stream` of [`PageBatch`]es that ends as soon as every page of every file
//! has been seen at least once.
//!
//! ## Delivery contract
//!
//! * One stream item per non-empty poll response, containing the whole
//!   response in service order. Pages the service repeats are delivered
//!   again; use [`crate::output::dedup_pages`] if one record per page is
//!   needed.
//! * Empty polls produce no item; the poller sleeps `poll_interval` and
//!   asks again.
//! * Nothing happens between pulls. The delay after a non-final batch is
//!   taken at the start of the next pull, so dropping the stream stops all
//!   further requests immediately.
//! * The first error is yielded once and the stream ends.

use crate::config::ClientConfig;
use crate::error::SightError;
use crate::output::{PageBatch, RecognizedPage};
use crate::pipeline::encode::{self, SubmissionPayload};
use crate::pipeline::tracker::CompletionState;
use crate::pipeline::transport::{HttpTransport, SubmissionOutcome};
use crate::progress::ProgressCallback;
use futures::stream;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A boxed stream of page batches.
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<PageBatch, SightError>> + Send>>;

/// Recognize files, streaming page batches as they are ready.
///
/// Files are read and encoded before this returns, so unsupported suffixes
/// and unreadable files fail here without any network traffic. The
/// submission itself is sent on the first pull of the returned stream.
///
/// # Returns
/// - `Ok(BatchStream)`: a finite stream of `Result<PageBatch, SightError>`
/// - `Err(SightError)`: invalid config, empty file list, unsupported
///   suffix, or unreadable file
///
/// # Example
/// ```rust,no_run
/// use sight_ocr::{recognize_stream, ClientConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new("my-api-key")?;
/// let mut batches = recognize_stream(["invoice.pdf", "receipt.jpg"], &config).await?;
/// while let Some(batch) = batches.next().await {
///     for page in batch? {
///         println!("file {} page {}: {}", page.file_index, page.page_number, page.recognized_text);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn recognize_stream<P: AsRef<Path>>(
    files: impl IntoIterator<Item = P>,
    config: &ClientConfig,
) -> Result<BatchStream, SightError> {
    config.validate()?;
    let payload = encode::build_payload(files).await?;
    recognize_payload_stream(payload, config)
}

/// Stream recognition of an already-built payload.
///
/// Use this with [`encode::SubmissionFile::from_bytes`] when file contents
/// are already in memory.
pub fn recognize_payload_stream(
    payload: SubmissionPayload,
    config: &ClientConfig,
) -> Result<BatchStream, SightError> {
    config.validate()?;
    if payload.is_empty() {
        return Err(SightError::InvalidArgument(
            "at least one file must be submitted".into(),
        ));
    }

    info!("Prepared submission of {} files", payload.len());

    let poller = Poller {
        transport: HttpTransport::new(config.http()?, &config.api_key),
        endpoint: config.endpoint.clone(),
        poll_interval: config.poll_interval,
        progress: config.progress_callback.clone(),
        emitted: 0,
        phase: Phase::Submit(payload),
    };

    let s = stream::try_unfold(poller, |mut poller| async move {
        let batch = poller.next_batch().await?;
        Ok::<_, SightError>(batch.map(|b| (b, poller)))
    });

    Ok(Box::pin(s))
}

enum Phase {
    Submit(SubmissionPayload),
    Poll {
        url: String,
        state: CompletionState,
        delay: bool,
    },
    Done,
}

struct Poller {
    transport: HttpTransport,
    endpoint: String,
    poll_interval: Duration,
    progress: Option<ProgressCallback>,
    emitted: usize,
    phase: Phase,
}

impl Poller {
    /// Drive the state machine until the next batch, or `None` when done.
    ///
    /// On error the phase is left at `Done`.
    async fn next_batch(&mut self) -> Result<Option<PageBatch>, SightError> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Done => return Ok(None),

                Phase::Submit(payload) => {
                    let file_count = payload.len();
                    if let Some(ref cb) = self.progress {
                        cb.on_submission_start(file_count);
                    }

                    match self.transport.submit(&self.endpoint, &payload).await? {
                        SubmissionOutcome::Recognized(text) => {
                            info!("Submission recognized synchronously");
                            let batch = vec![RecognizedPage::synchronous(text)];
                            self.record(&batch, file_count, file_count);
                            self.finish();
                            return Ok(Some(batch));
                        }
                        SubmissionOutcome::Polling(url) => {
                            info!("Submission accepted, polling {}", url);
                            if let Some(ref cb) = self.progress {
                                cb.on_polling_started(&url);
                            }
                            self.phase = Phase::Poll {
                                url,
                                state: CompletionState::new(file_count),
                                delay: false,
                            };
                        }
                    }
                }

                Phase::Poll {
                    url,
                    mut state,
                    delay,
                } => {
                    if delay {
                        sleep(self.poll_interval).await;
                    }

                    let pages = self.transport.poll(&url).await?;
                    if pages.is_empty() {
                        debug!("No pages yet, waiting {:?}", self.poll_interval);
                        self.phase = Phase::Poll {
                            url,
                            state,
                            delay: true,
                        };
                        continue;
                    }

                    state.observe_batch(&pages)?;
                    self.record(&pages, state.files_complete(), state.file_count());

                    if state.is_complete() {
                        self.finish();
                    } else {
                        self.phase = Phase::Poll {
                            url,
                            state,
                            delay: true,
                        };
                    }
                    return Ok(Some(pages));
                }
            }
        }
    }

    fn record(&mut self, batch: &PageBatch, files_complete: usize, total_files: usize) {
        self.emitted += batch.len();
        debug!(
            "Batch of {} pages, {}/{} files complete",
            batch.len(),
            files_complete,
            total_files
        );
        if let Some(ref cb) = self.progress {
            cb.on_batch(batch.len(), files_complete, total_files);
        }
    }

    fn finish(&self) {
        info!("All pages recognized ({} page records emitted)", self.emitted);
        if let Some(ref cb) = self.progress {
            cb.on_recognition_complete(self.emitted);
        }
    }
}
