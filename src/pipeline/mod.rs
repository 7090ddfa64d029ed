//! Pipeline stages for image transformation.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the service only wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ guard ──▶ codec ──▶ transform ──▶ codec ──▶ encode
//! (URL/b64)  (20 MiB)  (decode)  (crop/resize)  (encode)  (raw/base64)
//! ```
//!
//! 1. [`input`]     — fetch, read or base64-decode the source into one owned
//!    buffer; the only stage with network I/O
//! 2. [`guard`]     — size ceiling on raw lengths and base64 estimates,
//!    checked before anything is decoded
//! 3. [`codec`]     — sniff and decode the container; encode the result
//! 4. [`transform`] — crop, resize or convert the pixel grid
//! 5. [`encode`]    — present the encoded bytes raw or as `{ "image": … }`
//!
//! Steps 3–4 are CPU-bound and run inside `spawn_blocking`.

pub mod codec;
pub mod encode;
pub mod guard;
pub mod input;
pub mod transform;
