//! # sight-ocr
//!
//! Client for the Sight text-recognition service: submit PDFs and images,
//! then collect the recognized text of every page.
//!
//! ## How a call works
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Build    suffix → MIME type, read + base64 each file
//!  ├─ 2. Submit   one POST with every file inline
//!  │               ├─ RecognizedText  → single page, done
//!  │               └─ PollingURL      → 3.
//!  ├─ 3. Poll     GET until every page of every file has been seen
//!  └─ 4. Deliver  one batch per non-empty poll (stream) or one flat list
//! ```
//!
//! Recognition is asynchronous on the server: each poll returns the pages
//! finished so far, possibly repeating earlier ones. The poller keeps a
//! per-file, per-page record of what it has seen and stops as soon as
//! nothing is missing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sight_ocr::{recognize, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx")?;
//!     let pages = recognize(["invoice.pdf", "receipt.png"], &config).await?;
//!     for page in &pages {
//!         println!("file {} page {}/{}", page.file_index, page.page_number,
//!             page.number_of_pages_in_file);
//!         println!("{}", page.recognized_text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sight` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! sight-ocr = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod recognize;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_ENDPOINT, DEFAULT_POLL_INTERVAL};
pub use error::{Result, SightError};
pub use output::{dedup_pages, PageBatch, RecognizedPage};
pub use pipeline::encode::{SubmissionFile, SubmissionPayload};
pub use pipeline::mime::MimeType;
pub use progress::{NoopProgressCallback, ProgressCallback, RecognitionProgressCallback};
pub use recognize::{recognize, recognize_sync, recognize_to_file, write_pages_json};
pub use stream::{recognize_payload_stream, recognize_stream, BatchStream};
