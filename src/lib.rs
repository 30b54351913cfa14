//! # Listing Photos
//!
//! The image pipeline behind a property listing: photos come in from a file
//! picker or drop zone, get squeezed into a fixed byte budget, land in a
//! capacity-bounded gallery, and are shown with a logo watermark that follows
//! the photo currently on display.
//!
//! # Architecture
//!
//! ```text
//! files ─► Intake ─► compress ─► Gallery ─► Compositor ─► published / download
//!            │           │                       │
//!            └───────────┴──── ImageBackend ─────┘
//! ```
//!
//! - **Intake** filters non-images, truncates the batch to the free room, and
//!   re-encodes the rest one at a time.
//! - **compress** runs a bounded bisection over the JPEG quality factor until
//!   the encoded size lands in the byte window.
//! - **Gallery** keeps display order; slot 0 is the cover.
//! - **Compositor** renders the active photo with the logo blended over its
//!   center and publishes only the newest selection's result.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode / resize / JPEG-encode backend, placement math, blending |
//! | [`source`] | Media types, input bytes, data URLs, image references |
//! | [`compress`] | Byte-budget re-encoder |
//! | [`gallery`] | Ordered, capacity-bounded photo set and its JSON manifest |
//! | [`intake`] | Batch intake controller |
//! | [`watermark`] | Watermark compositor with generation-ordered publishing |
//! | [`naming`] | Entity ids, download and slot file names |
//! | [`config`] | `listing-photos.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling, and baseline JPEG encoding. No system libraries, no canvas:
//! the binary is self-contained and behaves the same on every machine.
//!
//! ## Backend Trait at the Seam
//!
//! Everything above [`imaging`] talks to an [`imaging::ImageBackend`]. Tests
//! swap in a mock that records operations and scripts encoded sizes, so the
//! quality search and the compositor's job ordering are tested without
//! touching pixels.
//!
//! ## Generations Instead of Cancellation
//!
//! A compositor job cannot be aborted mid-decode. Instead each job carries a
//! generation number and publishing compares it against the latest; overtaken
//! jobs finish and are dropped. See [`watermark`].

pub mod compress;
pub mod config;
pub mod gallery;
pub mod imaging;
pub mod intake;
pub mod naming;
pub mod output;
pub mod source;
pub mod watermark;

#[cfg(test)]
pub(crate) mod test_helpers;
