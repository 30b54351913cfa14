//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every photo is shown by its 1-based gallery position and original file
//! name, with sizes and search details as indented context lines. The output
//! reads as an inventory of the listing's photos.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! Skipped notes.txt (text/plain)
//! Batch: 5 offered, 1 accepted, 4 dropped (gallery full)
//!     010 kitchen.jpg
//!         2.4 MiB -> 141.3 KiB (within-window, 3 attempts)
//! Gallery: 10/10
//! ```
//!
//! ## Gallery
//!
//! ```text
//! 001 kitchen.jpg (cover) -> 001.jpg
//!     141.3 KiB, within-window, quality 0.60, 3 attempts, 2500x1875
//! 002 garden.png -> 002.png
//!     88.0 KiB, unchanged
//! ```
//!
//! ## Watermark
//!
//! ```text
//! 001 kitchen.jpg: watermarked -> Sheltershub_Property_SH-001_1.jpg
//! 002 remote.jpg: original (watermark unavailable) -> Sheltershub_Property_SH-001_2.jpg
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::compress::CompressionOutcome;
use crate::gallery::Gallery;
use crate::intake::IntakeEvent;
use crate::naming::slot_filename;
use crate::watermark::JobStatus;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size: `512 B`, `141.3 KiB`, `2.4 MiB`.
fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{} B", bytes)
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

/// `1 attempt`, `3 attempts`.
fn format_attempts(attempts: u32) -> String {
    let plural = if attempts == 1 { "" } else { "s" };
    format!("{} attempt{}", attempts, plural)
}

fn outcome_label(outcome: CompressionOutcome) -> &'static str {
    match outcome {
        CompressionOutcome::Unchanged => "unchanged",
        CompressionOutcome::WithinWindow => "within-window",
        CompressionOutcome::ForcedAtCap => "forced-at-cap",
    }
}

// ============================================================================
// Ingest
// ============================================================================

/// Format a single intake progress event as display lines.
pub fn format_intake_event(event: &IntakeEvent) -> Vec<String> {
    match event {
        IntakeEvent::Skipped { name, media_type } => {
            vec![format!("Skipped {} ({})", name, media_type)]
        }
        IntakeEvent::BatchStarted {
            offered,
            accepted,
            dropped,
        } => {
            let mut line = format!("Batch: {} offered, {} accepted", offered, accepted);
            if *dropped > 0 {
                line.push_str(&format!(", {} dropped (gallery full)", dropped));
            }
            vec![line]
        }
        IntakeEvent::Compressed {
            position,
            name,
            original_bytes,
            bytes,
            outcome,
            attempts,
        } => {
            let detail = match outcome {
                CompressionOutcome::Unchanged => outcome_label(*outcome).to_string(),
                _ => format!("{}, {}", outcome_label(*outcome), format_attempts(*attempts)),
            };
            vec![
                format!("{}{} {}", indent(1), format_index(position + 1), name),
                format!(
                    "{}{} -> {} ({})",
                    indent(2),
                    format_size(*original_bytes),
                    format_size(*bytes),
                    detail
                ),
            ]
        }
        IntakeEvent::Failed { name, error } => {
            vec![format!("{}Failed {}: {}", indent(1), name, error)]
        }
        IntakeEvent::BatchFinished { len, capacity, .. } => {
            vec![format!("Gallery: {}/{}", len, capacity)]
        }
    }
}

/// Print an intake event to stdout.
pub fn print_intake_event(event: &IntakeEvent) {
    for line in format_intake_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Format the gallery contents with the file each slot is written to.
pub fn format_gallery(gallery: &Gallery) -> Vec<String> {
    let mut lines = Vec::new();
    for slot in gallery.slots() {
        let result = slot.result();
        let cover = if slot.is_cover { " (cover)" } else { "" };
        lines.push(format!(
            "{} {}{} -> {}",
            format_index(slot.position + 1),
            slot.entry.name,
            cover,
            slot_filename(slot.position, &result.media_type)
        ));

        let mut detail = vec![
            format_size(result.byte_len()),
            outcome_label(result.outcome).to_string(),
        ];
        if let Some(quality) = result.quality {
            detail.push(format!("quality {:.2}", quality.value()));
        }
        if result.attempts > 0 {
            detail.push(format_attempts(result.attempts));
        }
        if let Some(dims) = result.encoded_dimensions {
            detail.push(format!("{}x{}", dims.width, dims.height));
        }
        lines.push(format!("{}{}", indent(1), detail.join(", ")));
    }
    if gallery.is_empty() {
        lines.push("(no photos)".to_string());
    }
    lines
}

/// Print the gallery to stdout.
pub fn print_gallery(gallery: &Gallery) {
    for line in format_gallery(gallery) {
        println!("{}", line);
    }
}

// ============================================================================
// Watermark
// ============================================================================

/// Format the outcome of one watermark job.
///
/// `filename` is `None` when no download was produced.
pub fn format_composite(
    index: usize,
    name: &str,
    status: JobStatus,
    filename: Option<&str>,
) -> Vec<String> {
    let label = match status {
        JobStatus::Succeeded => "watermarked",
        JobStatus::Fallback => "original (watermark unavailable)",
        JobStatus::Pending => "pending",
        JobStatus::Superseded => "superseded",
    };
    let line = match filename {
        Some(f) => format!("{} {}: {} -> {}", format_index(index + 1), name, label, f),
        None => format!("{} {}: {}", format_index(index + 1), name, label),
    };
    vec![line]
}

/// Print the outcome of one watermark job to stdout.
pub fn print_composite(index: usize, name: &str, status: JobStatus, filename: Option<&str>) {
    for line in format_composite(index, name, status, filename) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::CompressionResult;
    use crate::gallery::GalleryEntry;
    use crate::imaging::{Dimensions, Quality};
    use crate::source::MediaType;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(10), "010");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(150 * 1024), "150.0 KiB");
        assert_eq!(format_size(2 * 1024 * 1024 + 400 * 1024), "2.4 MiB");
    }

    // =========================================================================
    // Ingest
    // =========================================================================

    #[test]
    fn batch_line_mentions_dropped_only_when_any() {
        let lines = format_intake_event(&IntakeEvent::BatchStarted {
            offered: 5,
            accepted: 1,
            dropped: 4,
        });
        assert_eq!(lines, vec!["Batch: 5 offered, 1 accepted, 4 dropped (gallery full)"]);

        let lines = format_intake_event(&IntakeEvent::BatchStarted {
            offered: 2,
            accepted: 2,
            dropped: 0,
        });
        assert_eq!(lines, vec!["Batch: 2 offered, 2 accepted"]);
    }

    #[test]
    fn compressed_event_shows_position_and_sizes() {
        let lines = format_intake_event(&IntakeEvent::Compressed {
            position: 9,
            name: "kitchen.jpg".to_string(),
            original_bytes: 300 * 1024,
            bytes: 120 * 1024,
            outcome: CompressionOutcome::WithinWindow,
            attempts: 1,
        });
        assert_eq!(
            lines,
            vec![
                "    010 kitchen.jpg",
                "        300.0 KiB -> 120.0 KiB (within-window, 1 attempt)",
            ]
        );
    }

    #[test]
    fn unchanged_event_omits_attempts() {
        let lines = format_intake_event(&IntakeEvent::Compressed {
            position: 0,
            name: "small.png".to_string(),
            original_bytes: 900,
            bytes: 900,
            outcome: CompressionOutcome::Unchanged,
            attempts: 0,
        });
        assert_eq!(lines[1], "        900 B -> 900 B (unchanged)");
    }

    #[test]
    fn failed_and_finished_events() {
        let failed = format_intake_event(&IntakeEvent::Failed {
            name: "broken.jpg".to_string(),
            error: "Decode failed: bad".to_string(),
        });
        assert_eq!(failed, vec!["    Failed broken.jpg: Decode failed: bad"]);

        let finished = format_intake_event(&IntakeEvent::BatchFinished {
            added: 1,
            len: 10,
            capacity: 10,
        });
        assert_eq!(finished, vec!["Gallery: 10/10"]);
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    #[test]
    fn gallery_lists_cover_and_details() {
        let mut gallery = Gallery::full();
        gallery
            .push(GalleryEntry {
                name: "kitchen.jpg".to_string(),
                result: CompressionResult {
                    bytes: vec![0; 140 * 1024],
                    media_type: MediaType::new("image/jpeg"),
                    quality: Some(Quality::new(0.6)),
                    attempts: 3,
                    outcome: CompressionOutcome::WithinWindow,
                    bracket: None,
                    original_dimensions: None,
                    encoded_dimensions: Some(Dimensions {
                        width: 2500,
                        height: 1875,
                    }),
                },
            })
            .unwrap();
        gallery
            .push(GalleryEntry {
                name: "garden.png".to_string(),
                result: CompressionResult {
                    bytes: vec![0; 88 * 1024],
                    media_type: MediaType::new("image/png"),
                    quality: None,
                    attempts: 0,
                    outcome: CompressionOutcome::Unchanged,
                    bracket: None,
                    original_dimensions: None,
                    encoded_dimensions: None,
                },
            })
            .unwrap();

        let lines = format_gallery(&gallery);
        assert_eq!(
            lines,
            vec![
                "001 kitchen.jpg (cover) -> 001.jpg",
                "    140.0 KiB, within-window, quality 0.60, 3 attempts, 2500x1875",
                "002 garden.png -> 002.png",
                "    88.0 KiB, unchanged",
            ]
        );
    }

    #[test]
    fn gallery_detail_uses_singular_attempt() {
        let mut gallery = Gallery::simplified();
        gallery
            .push(GalleryEntry {
                name: "porch.jpg".to_string(),
                result: CompressionResult {
                    bytes: vec![0; 120 * 1024],
                    media_type: MediaType::new("image/jpeg"),
                    quality: Some(Quality::INITIAL_PROBE),
                    attempts: 1,
                    outcome: CompressionOutcome::WithinWindow,
                    bracket: None,
                    original_dimensions: None,
                    encoded_dimensions: None,
                },
            })
            .unwrap();

        let lines = format_gallery(&gallery);
        assert_eq!(lines[1], "    120.0 KiB, within-window, quality 0.80, 1 attempt");
    }

    #[test]
    fn empty_gallery() {
        assert_eq!(format_gallery(&Gallery::simplified()), vec!["(no photos)"]);
    }

    // =========================================================================
    // Watermark
    // =========================================================================

    #[test]
    fn composite_lines() {
        assert_eq!(
            format_composite(0, "kitchen.jpg", JobStatus::Succeeded, Some("SH-001_1.jpg")),
            vec!["001 kitchen.jpg: watermarked -> SH-001_1.jpg"]
        );
        assert_eq!(
            format_composite(1, "remote.jpg", JobStatus::Fallback, Some("SH-001_2.jpg")),
            vec!["002 remote.jpg: original (watermark unavailable) -> SH-001_2.jpg"]
        );
        assert_eq!(
            format_composite(2, "x.jpg", JobStatus::Superseded, None),
            vec!["003 x.jpg: superseded"]
        );
    }
}
