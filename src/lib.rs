//! # edgequake-imgops
//!
//! Crop, resize and convert images acquired from a URL, an inline base64
//! payload or a local file, and hand the result back as raw bytes or as a
//! `{ "image": "<base64>" }` response.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source
//!  │
//!  ├─ 1. Acquire    fetch URL / decode base64 / read file
//!  ├─ 2. Guard      20 MiB ceiling, checked before any decode
//!  ├─ 3. Decode     sniff container, decode to pixels (spawn_blocking)
//!  ├─ 4. Transform  crop / resize / convert
//!  ├─ 5. Encode     write the requested container
//!  └─ 6. Present    raw bytes or base64 JSON
//! ```
//!
//! Every request is independent: an [`ImagePipeline`] holds only immutable
//! configuration, and each buffer it creates is owned by exactly one request.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_imgops::{ImagePipeline, ImageSource, Presentation, TransformConfig, TransformRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = ImagePipeline::new(TransformConfig::default())?;
//!     let request = TransformRequest::crop(0, 0, 250, 250).with_format("PNG");
//!     let presented = pipeline
//!         .run_presented(
//!             ImageSource::remote("https://example.com/avatar.jpg"),
//!             &request,
//!             Presentation::Base64,
//!         )
//!         .await?;
//!     println!("{presented:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imgops` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-imgops = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ResampleFilter, TransformConfig, TransformConfigBuilder, MAX_PAYLOAD_BYTES};
pub use error::ImgOpsError;
pub use output::{Base64ImageResponse, Presentation, PresentedOutput, TransformOutput, TransformStats};
pub use pipeline::input::{Fetch, FetchResponse, HttpFetcher, RawImageBuffer};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
pub use request::{ImageSource, Operation, TransformRequest};
pub use service::{transform, transform_sync, transform_to_file, ImagePipeline};
