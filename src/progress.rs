//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::TransformConfigBuilder::progress_callback`] to receive
//! events as a request moves through acquire → decode → transform → encode.
//!
//! Callers can forward events to a metrics sink, a log, or a terminal
//! spinner without the library knowing how the host application reports
//! progress. The trait is `Send + Sync`: decode, transform and encode run on
//! the blocking thread pool, so events for one request arrive from more than
//! one thread.
//!
//! # Example
//!
//! ```rust
//! use edgequake_imgops::{PipelineProgressCallback, Stage, TransformConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = TransformConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// One step of the transformation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Fetch, read or base64-decode the input and apply the size guard.
    Acquire,
    /// Sniff the container and decode to a pixel grid.
    Decode,
    /// Crop, resize or convert.
    Transform,
    /// Encode the pixel grid into the output container.
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Acquire => "acquire",
            Stage::Decode => "decode",
            Stage::Transform => "transform",
            Stage::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Called by the pipeline as a request passes through each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`      — the stage that finished
    /// * `elapsed_ms` — wall-clock time spent in the stage
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails. No further stages run for this request.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TransformConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: Mutex<Vec<(Stage, String)>>,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_stage_start(&self, _stage: Stage) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_complete(&self, _stage: Stage, _elapsed_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.errors.lock().unwrap().push((stage, error.to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Acquire);
        cb.on_stage_complete(Stage::Acquire, 3);
        cb.on_stage_error(Stage::Decode, "corrupt");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_stage_start(Stage::Acquire);
        tracker.on_stage_complete(Stage::Acquire, 1);
        tracker.on_stage_start(Stage::Decode);
        tracker.on_stage_error(Stage::Decode, "not an image");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        let errors = tracker.errors.lock().unwrap();
        assert_eq!(errors.as_slice(), &[(Stage::Decode, "not an image".to_string())]);
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::Acquire.to_string(), "acquire");
        assert_eq!(Stage::Encode.to_string(), "encode");
    }
}
