//! The capacity-bounded, ordered set of photos attached to one listing.
//!
//! Insertion order is display order. Position 0 is the cover photo; removing
//! a slot shifts every later slot down by one, so the cover moves to whatever
//! lands at position 0. The cover flag is derived from position on every
//! read and never stored, so it cannot go stale.
//!
//! Capacity is enforced on insertion: the gallery never holds more than its
//! capacity, and [`Intake`](crate::intake::Intake) truncates incoming batches
//! to the remaining room instead of failing.

use crate::compress::{CompressionOutcome, CompressionResult};
use crate::naming::slot_filename;
use crate::source::{ImageSource, SourceImage, to_data_url};
use serde::{Deserialize, Serialize};

/// One accepted photo: its original file name and the encoded result.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    pub name: String,
    pub result: CompressionResult,
}

/// A read-only view of one gallery position.
#[derive(Debug, Clone, Copy)]
pub struct GallerySlot<'a> {
    pub position: usize,
    pub is_cover: bool,
    pub entry: &'a GalleryEntry,
}

impl GallerySlot<'_> {
    pub fn result(&self) -> &CompressionResult {
        &self.entry.result
    }

    /// The encoded bytes as a `data:` URL, the form payload representation.
    pub fn data_url(&self) -> String {
        to_data_url(&self.entry.result.media_type, &self.entry.result.bytes)
    }

    /// The encoded bytes as a displayable source for the compositor.
    pub fn source(&self) -> ImageSource {
        ImageSource::Inline(SourceImage::new(
            self.entry.name.clone(),
            self.entry.result.bytes.clone(),
            self.entry.result.media_type.clone(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gallery {
    capacity: usize,
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    /// Capacity of the full listing upload flow.
    pub const FULL_CAPACITY: usize = 10;
    /// Capacity of the simplified upload flow.
    pub const SIMPLIFIED_CAPACITY: usize = 5;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn full() -> Self {
        Self::new(Self::FULL_CAPACITY)
    }

    pub fn simplified() -> Self {
        Self::new(Self::SIMPLIFIED_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Free slots left before the gallery is full.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.entries.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Append an entry. Returns the entry back if the gallery is full.
    pub fn push(&mut self, entry: GalleryEntry) -> Result<usize, GalleryEntry> {
        if self.is_full() {
            return Err(entry);
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Remove the slot at `index`, shifting later slots down.
    ///
    /// Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) -> Option<GalleryEntry> {
        if index >= self.entries.len() {
            return None;
        }
        Some(self.entries.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<GallerySlot<'_>> {
        self.entries.get(index).map(|entry| GallerySlot {
            position: index,
            is_cover: index == 0,
            entry,
        })
    }

    pub fn cover(&self) -> Option<GallerySlot<'_>> {
        self.get(0)
    }

    pub fn slots(&self) -> impl Iterator<Item = GallerySlot<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| GallerySlot {
                position,
                is_cover: position == 0,
                entry,
            })
    }

    /// Displayable sources in display order, for the compositor.
    pub fn sources(&self) -> Vec<ImageSource> {
        self.slots().map(|slot| slot.source()).collect()
    }

    /// Serializable summary of every slot.
    pub fn manifest(&self) -> GalleryManifest {
        GalleryManifest {
            capacity: self.capacity,
            slots: self
                .slots()
                .map(|slot| {
                    let result = slot.result();
                    SlotRecord {
                        position: slot.position,
                        is_cover: slot.is_cover,
                        name: slot.entry.name.clone(),
                        file: slot_filename(slot.position, &result.media_type),
                        media_type: result.media_type.to_string(),
                        bytes: result.byte_len(),
                        outcome: result.outcome,
                        quality: result.quality.map(|q| q.value()),
                        attempts: result.attempts,
                        dimensions: result.encoded_dimensions.map(|d| d.as_tuple()),
                    }
                })
                .collect(),
        }
    }
}

/// `gallery.json` written next to the encoded slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryManifest {
    pub capacity: usize,
    pub slots: Vec<SlotRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRecord {
    pub position: usize,
    pub is_cover: bool,
    /// Original file name as supplied.
    pub name: String,
    /// Encoded file name within the output directory.
    pub file: String,
    pub media_type: String,
    pub bytes: usize,
    pub outcome: CompressionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
}
