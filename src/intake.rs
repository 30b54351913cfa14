//! Batch intake: from a file selection or drop to gallery slots.
//!
//! ## Policy
//!
//! For each batch offered to a [`Gallery`]:
//!
//! 1. Inputs whose declared media type is not `image/...` are skipped. They
//!    never take up room in the gallery.
//! 2. Of the remaining images, the first `capacity - len(gallery)` in the
//!    order presented are accepted. The rest are dropped silently; a full
//!    gallery is not an error.
//! 3. Accepted images are re-encoded one at a time through
//!    [`compress`](crate::compress::compress) and appended in order.
//! 4. An image that fails to decode or encode is logged and left out. The
//!    rest of the batch carries on.
//!
//! ## One at a time
//!
//! Each image is decoded to an uncompressed raster that can be many times
//! the size of its file. Images are processed one after another, so peak
//! memory stays at a single decode/encode cycle. Files offered through
//! [`OfferedImage::file`] are read only when their turn comes; skipped and
//! dropped files are never read, and an unreadable one fails like a corrupt
//! image.
//!
//! ## Processing state
//!
//! [`ProcessingState`] is `true` for the whole duration of a batch. A UI
//! polls it (from any thread) to disable a second submission while a batch
//! is in flight. It has no effect on the outcome of any call.

use crate::compress::{CompressError, CompressionOutcome, compress};
use crate::gallery::{Gallery, GalleryEntry};
use crate::imaging::{EncodingTarget, ImageBackend, RustBackend};
use crate::source::OfferedImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Progress events emitted while a batch runs, for CLI output.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeEvent {
    BatchStarted {
        offered: usize,
        accepted: usize,
        dropped: usize,
    },
    Skipped {
        name: String,
        media_type: String,
    },
    Compressed {
        position: usize,
        name: String,
        original_bytes: usize,
        bytes: usize,
        outcome: CompressionOutcome,
        attempts: u32,
    },
    Failed {
        name: String,
        error: String,
    },
    BatchFinished {
        added: usize,
        len: usize,
        capacity: usize,
    },
}

/// What happened to one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeReport {
    /// Items offered in the batch.
    pub offered: usize,
    /// Names of inputs skipped for not being images.
    pub skipped: Vec<String>,
    /// Images dropped because the gallery had no room for them.
    pub dropped: usize,
    /// Gallery positions filled by this batch, in order.
    pub added: Vec<usize>,
    /// `(name, error)` for each accepted image that failed to process.
    pub failed: Vec<(String, String)>,
}

/// Shared "a batch is running" flag.
#[derive(Debug, Clone, Default)]
pub struct ProcessingState(Arc<AtomicBool>);

impl ProcessingState {
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn begin(&self) -> ProcessingGuard {
        self.0.store(true, Ordering::Release);
        ProcessingGuard(self.0.clone())
    }
}

/// Clears the processing flag when the batch ends, on every exit path.
struct ProcessingGuard(Arc<AtomicBool>);

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Batch intake controller.
#[derive(Debug, Clone, Default)]
pub struct Intake {
    target: EncodingTarget,
    state: ProcessingState,
}

impl Intake {
    pub fn new(target: EncodingTarget) -> Self {
        Self {
            target,
            state: ProcessingState::default(),
        }
    }

    pub fn target(&self) -> &EncodingTarget {
        &self.target
    }

    /// Handle for observing the processing flag from elsewhere.
    pub fn state(&self) -> ProcessingState {
        self.state.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.state.is_active()
    }

    /// Ingest a batch with the production backend.
    pub fn ingest<I: Into<OfferedImage>>(
        &self,
        files: impl IntoIterator<Item = I>,
        gallery: &mut Gallery,
        events: Option<Sender<IntakeEvent>>,
    ) -> IntakeReport {
        self.ingest_with_backend(&RustBackend::new(), files, gallery, events)
    }

    /// Ingest a batch using a specific backend (allows testing with mock).
    pub fn ingest_with_backend<I: Into<OfferedImage>>(
        &self,
        backend: &impl ImageBackend,
        files: impl IntoIterator<Item = I>,
        gallery: &mut Gallery,
        events: Option<Sender<IntakeEvent>>,
    ) -> IntakeReport {
        let _guard = self.state.begin();
        let emit = |event: IntakeEvent| {
            if let Some(tx) = &events {
                tx.send(event).ok();
            }
        };

        let mut report = IntakeReport::default();
        let room = gallery.remaining();
        let mut accepted = Vec::new();
        for file in files {
            let file: OfferedImage = file.into();
            report.offered += 1;
            if !file.media_type().is_image() {
                emit(IntakeEvent::Skipped {
                    name: file.name().to_string(),
                    media_type: file.media_type().to_string(),
                });
                report.skipped.push(file.name().to_string());
            } else if accepted.len() < room {
                accepted.push(file);
            } else {
                report.dropped += 1;
            }
        }

        if report.dropped > 0 {
            info!(
                dropped = report.dropped,
                capacity = gallery.capacity(),
                "gallery full, dropping rest of batch"
            );
        }
        emit(IntakeEvent::BatchStarted {
            offered: report.offered,
            accepted: accepted.len(),
            dropped: report.dropped,
        });

        for offered in accepted {
            let name = offered.name().to_string();
            let compressed = offered.load().map_err(CompressError::from).and_then(|source| {
                compress(backend, &source, &self.target).map(|result| (source.byte_len(), result))
            });
            match compressed {
                Ok((original_bytes, result)) => {
                    let event = IntakeEvent::Compressed {
                        position: gallery.len(),
                        name: name.clone(),
                        original_bytes,
                        bytes: result.byte_len(),
                        outcome: result.outcome,
                        attempts: result.attempts,
                    };
                    let entry = GalleryEntry { name, result };
                    // Never full here: only the free room was accepted.
                    if let Ok(position) = gallery.push(entry) {
                        report.added.push(position);
                        emit(event);
                    }
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "skipping image");
                    emit(IntakeEvent::Failed {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        emit(IntakeEvent::BatchFinished {
            added: report.added.len(),
            len: gallery.len(),
            capacity: gallery.capacity(),
        });
        report
    }
}

/// Expand a file selection into offered inputs. Directories are walked
/// recursively in name order.
///
/// Nothing is read here. Directory entries that cannot be listed are logged
/// and skipped; a missing file is offered as given and fails on its own when
/// intake gets to it.
pub fn collect_files(inputs: &[PathBuf]) -> Vec<OfferedImage> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(OfferedImage::file(input));
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    files.push(OfferedImage::file(entry.path()));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping unreadable directory entry"),
            }
        }
    }
    files
}
