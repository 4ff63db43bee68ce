//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn SweepProgressCallback>`] via
//! [`crate::config::SweepRequestBuilder::progress_callback`] to be told as
//! [`crate::sweep_batch`] moves through the uploaded files.
//!
//! # Example
//!
//! ```rust
//! use data_sweeper::{SweepProgressCallback, SweepRequest};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl SweepProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, artifact_len: usize) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("file {}/{} done ({} bytes)", index + 1, total, artifact_len);
//!     }
//! }
//!
//! let request = SweepRequest::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::sweep_batch`] as it processes each file.
///
/// All methods default to no-ops so callers only override what they need.
/// Files are processed one after another on the caller's thread; the
/// `Send + Sync` bound only lets a request be shared with threaded hosts.
pub trait SweepProgressCallback: Send + Sync {
    /// Called once before the first file.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is ingested.
    ///
    /// # Arguments
    /// * `index` — 0-based position of the file in the batch
    /// * `total` — number of files in the batch
    /// * `name`  — the uploaded file name
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a file has been exported.
    ///
    /// `artifact_len` is the byte length of the exported artifact.
    fn on_file_complete(&self, index: usize, total: usize, artifact_len: usize) {
        let _ = (index, total, artifact_len);
    }

    /// Called when a file failed at any stage.
    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SweepProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SweepRequest`].
pub type ProgressCallback = Arc<dyn SweepProgressCallback>;
