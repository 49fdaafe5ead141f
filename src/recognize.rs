//! Eager recognition entry points.
//!
//! These wait until every page of every file has been recognized and return
//! one flat list. Pages appear in emission order: batch by batch, and within
//! a batch in the order the service listed them. The list is not sorted by
//! file or page, and pages the service repeated appear more than once; pass
//! it through [`crate::output::dedup_pages`] for one record per page.
//! Use [`crate::stream::recognize_stream`] instead to handle pages as they
//! arrive.

use crate::config::ClientConfig;
use crate::error::SightError;
use crate::output::RecognizedPage;
use crate::stream::{recognize_stream, BatchStream};
use futures::StreamExt;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Recognize every page of `files`.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `files`: local file paths ending in `.pdf`, `.bmp`, `.gif`, `.jpeg`,
///   `.jpg`, or `.png`; their order defines each page's `file_index`
/// * `config`: client configuration (API key, endpoint, polling)
///
/// # Errors
/// Any [`SightError`]; the first failure aborts the call and no partial
/// result is returned. Per-page recognition failures are not errors: they
/// arrive as pages with a non-empty `error` field.
///
/// # Example
/// ```rust,no_run
/// use sight_ocr::{recognize, ClientConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new(std::env::var("SIGHT_API_KEY")?)?;
/// for page in recognize(["contract.pdf"], &config).await? {
///     println!("page {}: {}", page.page_number, page.recognized_text);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn recognize<P: AsRef<Path>>(
    files: impl IntoIterator<Item = P>,
    config: &ClientConfig,
) -> Result<Vec<RecognizedPage>, SightError> {
    let start = Instant::now();
    let stream = recognize_stream(files, config).await?;
    let (pages, batches) = drain(stream).await?;

    info!(
        "Recognition complete: {} page records in {} batches, {}ms",
        pages.len(),
        batches,
        start.elapsed().as_millis()
    );

    Ok(pages)
}

/// Concatenate every batch of a stream in emission order.
///
/// Returns the pages and the number of batches they arrived in.
pub async fn drain(mut stream: BatchStream) -> Result<(Vec<RecognizedPage>, usize), SightError> {
    let mut pages = Vec::new();
    let mut batches = 0;
    while let Some(batch) = stream.next().await {
        pages.extend(batch?);
        batches += 1;
    }
    Ok((pages, batches))
}

/// Synchronous wrapper around [`recognize`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside an async context.
pub fn recognize_sync<P: AsRef<Path>>(
    files: impl IntoIterator<Item = P>,
    config: &ClientConfig,
) -> Result<Vec<RecognizedPage>, SightError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SightError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(recognize(files, config))
}

/// Recognize `files` and write the pages as a JSON array to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
/// Returns the number of page records written.
pub async fn recognize_to_file<P: AsRef<Path>>(
    files: impl IntoIterator<Item = P>,
    output_path: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<usize, SightError> {
    let pages = recognize(files, config).await?;
    write_pages_json(&pages, output_path).await?;
    Ok(pages.len())
}

/// Write `pages` as a pretty-printed JSON array to `output_path`.
///
/// Creates missing parent directories, then writes a sibling temp file and
/// renames it into place so readers never see a partial file.
pub async fn write_pages_json(
    pages: &[RecognizedPage],
    output_path: impl AsRef<Path>,
) -> Result<(), SightError> {
    let path = output_path.as_ref();
    let write_err = |source: std::io::Error| SightError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(pages)
        .map_err(|e| SightError::Internal(format!("failed to serialise pages: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    Ok(())
}
