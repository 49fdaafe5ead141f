//! Pipeline stages for a recognition call.
//!
//! ## Data Flow
//!
//! ```text
//! paths ──▶ mime ──▶ encode ──▶ transport ──▶ tracker
//!          (suffix)  (base64)   (POST/GET)    (pages seen)
//! ```
//!
//! 1. [`mime`]: map each path suffix to a MIME type
//! 2. [`encode`]: read and base64-wrap each file into the submission body
//! 3. [`transport`]: authenticated POST and polling GET; the only stage
//!    with network I/O
//! 4. [`tracker`]: per-file, per-page completion bookkeeping that decides
//!    when polling stops
//!
//! The stages are driven by [`crate::stream::recognize_stream`].

pub mod encode;
pub mod mime;
pub mod tracker;
pub mod transport;
