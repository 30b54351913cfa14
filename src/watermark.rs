//! Watermark compositor: the logo, scaled and blended over the displayed photo.
//!
//! ## Jobs and generations
//!
//! Every change of the active photo creates a [`CompositeJob`] carrying a
//! strictly increasing generation number. The job decodes the photo and the
//! shared logo concurrently, composes, and then tries to publish. Publishing
//! only succeeds when the job's generation is still the latest one; a job
//! that was overtaken by a newer selection runs to completion and its result
//! is dropped at publish time. The displayed composite therefore always
//! belongs to the most recently selected photo, whatever order the jobs
//! finish in.
//!
//! ```text
//! select(i) ──► Pending ──┬─► Succeeded   (composite published)
//!                         ├─► Fallback    (original published)
//!                         └─► Superseded  (newer select; result dropped)
//! ```
//!
//! ## Composition
//!
//! The logo width is `scale` (0.30) times the photo width, its height
//! follows the logo's own aspect ratio, and it is centered on both axes. The
//! photo is the opaque base layer; the logo is blended at `opacity` (0.50).
//! The frame is encoded as JPEG at quality 0.95.
//!
//! ## Fallback
//!
//! If either image fails to load, or composing fails, the job publishes the
//! original photo unchanged. Nothing here blocks viewing or downloading a
//! photo; the worst case is a photo without a mark.

use crate::imaging::blend::compose_watermark;
use crate::imaging::{
    DecodeError, Dimensions, EncodingError, ImageBackend, Quality, ResizeParams,
    calculate_logo_placement, next_index, previous_index,
};
use crate::naming::{download_filename, format_entity_id};
use crate::source::{ImageSource, MediaType, SourceImage};
use image::DynamicImage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// How the logo is drawn and how downloads are named.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSettings {
    /// Logo width relative to photo width.
    pub scale: f64,
    /// Alpha of the logo layer.
    pub opacity: f32,
    /// JPEG quality of the published composite.
    pub quality: Quality,
    pub entity_prefix: String,
    pub download_prefix: String,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            scale: 0.30,
            opacity: 0.50,
            quality: Quality::COMPOSITE,
            entity_prefix: "SH".to_string(),
            download_prefix: "Sheltershub_Property".to_string(),
        }
    }
}

/// The logo image, decoded on first use and shared read-only afterwards.
///
/// The first load holds the lock across the decode, so concurrent first
/// jobs wait for it instead of decoding again. A failed load is not cached:
/// the next job tries again.
#[derive(Debug)]
pub struct LogoAsset {
    source: ImageSource,
    decoded: Mutex<Option<Arc<DynamicImage>>>,
}

impl LogoAsset {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            decoded: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<DynamicImage>>> {
        self.decoded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn load(&self, backend: &impl ImageBackend) -> Result<Arc<DynamicImage>, DecodeError> {
        let mut slot = self.slot();
        if let Some(logo) = slot.as_ref() {
            return Ok(Arc::clone(logo));
        }
        let raw = self.source.load()?;
        let logo = Arc::new(backend.decode(raw.bytes(), raw.media_type())?);
        debug!(
            width = logo.width(),
            height = logo.height(),
            "logo loaded"
        );
        *slot = Some(Arc::clone(&logo));
        Ok(logo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Fallback,
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeJob {
    pub generation: u64,
    pub source_index: usize,
    pub status: JobStatus,
}

/// Everything a worker needs to run one job, handed out by
/// [`Compositor::select`].
#[derive(Debug, Clone)]
pub struct JobTicket {
    generation: u64,
    index: usize,
    source: ImageSource,
}

impl JobTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }
}

/// Result of rendering a job, before the publish check.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Encoded watermarked JPEG.
    Composite(Vec<u8>),
    /// Load or compose failed; the original is shown instead.
    Fallback { reason: String },
}

/// The displayable image of a published job.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishedImage {
    Composite(Vec<u8>),
    Original(ImageSource),
}

impl PublishedImage {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Original(_))
    }

    /// Encoded bytes for display or download.
    pub fn load(&self) -> Result<SourceImage, DecodeError> {
        match self {
            Self::Composite(bytes) => Ok(SourceImage::new(
                "composite",
                bytes.clone(),
                MediaType::new("image/jpeg"),
            )),
            Self::Original(source) => source.load(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub generation: u64,
    pub index: usize,
    pub image: PublishedImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(JobStatus),
    /// A newer selection overtook the job.
    Discarded,
}

/// A download of the published image under its derived file name.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub image: PublishedImage,
}

/// How many superseded jobs stay visible through [`Compositor::job`].
///
/// Callers may drop tickets without running them, so older entries are
/// evicted rather than waiting for a publish that never comes.
pub const STALE_JOBS_TRACKED: usize = 16;

#[derive(Debug, Default)]
struct State {
    sources: Vec<ImageSource>,
    last_generation: u64,
    current: Option<CompositeJob>,
    /// Recently superseded pending jobs, oldest first. Bounded by
    /// [`STALE_JOBS_TRACKED`]; a job leaves when it reports back or ages out.
    stale: VecDeque<CompositeJob>,
    published: Option<Published>,
}

impl State {
    fn supersede_current(&mut self) {
        if let Some(mut previous) = self.current.take() {
            if previous.status == JobStatus::Pending {
                previous.status = JobStatus::Superseded;
                debug!(generation = previous.generation, "job superseded");
                if self.stale.len() == STALE_JOBS_TRACKED {
                    self.stale.pop_front();
                }
                self.stale.push_back(previous);
            }
        }
        self.published = None;
    }
}

struct Inner<B> {
    backend: Arc<B>,
    logo: Arc<LogoAsset>,
    settings: WatermarkSettings,
    state: Mutex<State>,
}

/// Tracks the active photo and publishes its watermarked rendition.
///
/// Cheap to clone; clones share state, so a clone can be moved to a worker
/// thread.
pub struct Compositor<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for Compositor<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ImageBackend + 'static> Compositor<B> {
    pub fn new(
        backend: Arc<B>,
        logo: Arc<LogoAsset>,
        settings: WatermarkSettings,
        sources: Vec<ImageSource>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                logo,
                settings,
                state: Mutex::new(State {
                    sources,
                    ..State::default()
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &WatermarkSettings {
        &self.inner.settings
    }

    pub fn len(&self) -> usize {
        self.state().sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state().current.map(|job| job.source_index)
    }

    pub fn current_job(&self) -> Option<CompositeJob> {
        self.state().current
    }

    /// Look up the current job or a recently superseded one still in flight.
    pub fn job(&self, generation: u64) -> Option<CompositeJob> {
        let state = self.state();
        state
            .current
            .filter(|job| job.generation == generation)
            .or_else(|| {
                state
                    .stale
                    .iter()
                    .find(|job| job.generation == generation)
                    .copied()
            })
    }

    pub fn published(&self) -> Option<Published> {
        self.state().published.clone()
    }

    /// Make `index` the active photo and open a new pending job for it.
    ///
    /// Returns `None` if `index` is out of range.
    pub fn select(&self, index: usize) -> Option<JobTicket> {
        let mut state = self.state();
        let source = state.sources.get(index)?.clone();
        state.supersede_current();
        state.last_generation += 1;
        let generation = state.last_generation;
        state.current = Some(CompositeJob {
            generation,
            source_index: index,
            status: JobStatus::Pending,
        });
        debug!(generation, index, "job pending");
        Some(JobTicket {
            generation,
            index,
            source,
        })
    }

    /// Step to the next photo, wrapping from the last to the first.
    pub fn next(&self) -> Option<JobTicket> {
        let (current, len) = self.position();
        self.select(next_index(current?, len))
    }

    /// Step to the previous photo, wrapping from the first to the last.
    pub fn previous(&self) -> Option<JobTicket> {
        let (current, len) = self.position();
        self.select(previous_index(current?, len))
    }

    fn position(&self) -> (Option<usize>, usize) {
        let state = self.state();
        (state.current.map(|job| job.source_index), state.sources.len())
    }

    /// Swap in a new set of photos (the gallery changed).
    ///
    /// The active index is kept when still in range, otherwise clamped to
    /// the last photo. An empty set leaves nothing active.
    pub fn replace_sources(&self, sources: Vec<ImageSource>) -> Option<JobTicket> {
        let index = {
            let mut state = self.state();
            let active = state.current.map(|job| job.source_index).unwrap_or(0);
            state.sources = sources;
            if state.sources.is_empty() {
                state.supersede_current();
                return None;
            }
            active.min(state.sources.len() - 1)
        };
        self.select(index)
    }

    /// Decode, compose and encode the job's photo. Does not publish.
    pub fn render(&self, ticket: &JobTicket) -> Rendered {
        let backend = &*self.inner.backend;
        let (photo, logo) = rayon::join(
            || {
                ticket
                    .source
                    .load()
                    .and_then(|raw| backend.decode(raw.bytes(), raw.media_type()))
            },
            || self.inner.logo.load(backend),
        );

        let (photo, logo) = match (photo, logo) {
            (Ok(photo), Ok(logo)) => (photo, logo),
            (Err(e), _) | (_, Err(e)) => {
                warn!(generation = ticket.generation, error = %e, "image load failed, showing original");
                return Rendered::Fallback {
                    reason: e.to_string(),
                };
            }
        };

        match self.compose(&photo, &logo) {
            Ok(bytes) => Rendered::Composite(bytes),
            Err(e) => {
                warn!(generation = ticket.generation, error = %e, "composite failed, showing original");
                Rendered::Fallback {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn compose(&self, photo: &DynamicImage, logo: &DynamicImage) -> Result<Vec<u8>, EncodingError> {
        let settings = &self.inner.settings;
        let placement = calculate_logo_placement(
            Dimensions::of(photo).as_tuple(),
            Dimensions::of(logo).as_tuple(),
            settings.scale,
        );
        let (_, _, width, height) = placement.to_pixels();
        let scaled = self
            .inner
            .backend
            .resize(logo, &ResizeParams { width, height })?;
        let canvas = compose_watermark(photo, &scaled, &placement, settings.opacity);
        self.inner
            .backend
            .encode_jpeg(&DynamicImage::ImageRgba8(canvas), settings.quality)
    }

    /// Publish a rendered job if it is still the latest one.
    pub fn publish(&self, ticket: JobTicket, rendered: Rendered) -> PublishOutcome {
        let mut state = self.state();
        let is_latest = state.last_generation == ticket.generation
            && state
                .current
                .is_some_and(|job| job.generation == ticket.generation);
        if !is_latest {
            state.stale.retain(|job| job.generation != ticket.generation);
            debug!(
                generation = ticket.generation,
                latest = state.last_generation,
                "discarding stale composite"
            );
            return PublishOutcome::Discarded;
        }

        let (status, image) = match rendered {
            Rendered::Composite(bytes) => (JobStatus::Succeeded, PublishedImage::Composite(bytes)),
            Rendered::Fallback { .. } => (JobStatus::Fallback, PublishedImage::Original(ticket.source)),
        };
        if let Some(job) = state.current.as_mut() {
            job.status = status;
        }
        state.published = Some(Published {
            generation: ticket.generation,
            index: ticket.index,
            image,
        });
        PublishOutcome::Published(status)
    }

    /// Render and publish on the calling thread.
    pub fn run(&self, ticket: JobTicket) -> PublishOutcome {
        let rendered = self.render(&ticket);
        self.publish(ticket, rendered)
    }

    /// Render and publish on a background thread.
    pub fn spawn(&self, ticket: JobTicket) -> JoinHandle<PublishOutcome> {
        let compositor = self.clone();
        std::thread::spawn(move || compositor.run(ticket))
    }

    /// Select `index` and start its job in the background.
    pub fn activate(&self, index: usize) -> Option<JoinHandle<PublishOutcome>> {
        self.select(index).map(|ticket| self.spawn(ticket))
    }

    /// The current published image under its download name.
    ///
    /// Only available once the current job has succeeded or fallen back.
    pub fn download(&self, entity_id: u32) -> Option<Download> {
        let state = self.state();
        let job = state.current?;
        if !matches!(job.status, JobStatus::Succeeded | JobStatus::Fallback) {
            return None;
        }
        let published = state.published.as_ref()?;
        let settings = &self.inner.settings;
        let entity = format_entity_id(&settings.entity_prefix, entity_id);
        Some(Download {
            filename: download_filename(&settings.download_prefix, &entity, published.index),
            image: published.image.clone(),
        })
    }
}
