//! Centralized file and identifier naming.
//!
//! ## Entity ids
//!
//! Listings are numbered; their display id is a short prefix plus the number
//! zero-padded to three digits: `7` → `SH-007`, `1234` → `SH-1234`.
//!
//! ## Download names
//!
//! A watermarked photo downloads as
//! `<download prefix>_<entity id>_<1-based position>.jpg`, e.g.
//! `Sheltershub_Property_SH-001_3.jpg`. With an empty download prefix the
//! name is just `<entity id>_<position>.jpg`.
//!
//! ## Slot files
//!
//! Encoded gallery slots are written as `NNN.<ext>` using their 1-based
//! position, so a directory listing sorts in display order.

use crate::source::MediaType;

/// Format a listing number as a display id: `format_entity_id("SH", 1)` → `"SH-001"`.
pub fn format_entity_id(prefix: &str, id: u32) -> String {
    if prefix.is_empty() {
        format!("{:0>3}", id)
    } else {
        format!("{}-{:0>3}", prefix, id)
    }
}

/// Download file name for the photo at 0-based `index`.
pub fn download_filename(download_prefix: &str, entity_id: &str, index: usize) -> String {
    if download_prefix.is_empty() {
        format!("{}_{}.jpg", entity_id, index + 1)
    } else {
        format!("{}_{}_{}.jpg", download_prefix, entity_id, index + 1)
    }
}

/// File extension conventionally used for a media type.
pub fn extension_for(media_type: &MediaType) -> &'static str {
    match media_type.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/tiff" => "tiff",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// File name of the encoded slot at 0-based `position`.
pub fn slot_filename(position: usize, media_type: &MediaType) -> String {
    format!("{:0>3}.{}", position + 1, extension_for(media_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_pads_to_three_digits() {
        assert_eq!(format_entity_id("SH", 1), "SH-001");
        assert_eq!(format_entity_id("SH", 42), "SH-042");
        assert_eq!(format_entity_id("SH", 1234), "SH-1234");
    }

    #[test]
    fn entity_id_without_prefix() {
        assert_eq!(format_entity_id("", 7), "007");
    }

    #[test]
    fn download_name_uses_one_based_position() {
        assert_eq!(
            download_filename("Sheltershub_Property", "SH-001", 2),
            "Sheltershub_Property_SH-001_3.jpg"
        );
    }

    #[test]
    fn download_name_without_prefix() {
        assert_eq!(download_filename("", "SH-010", 0), "SH-010_1.jpg");
    }

    #[test]
    fn slot_files_sort_in_display_order() {
        let jpeg = MediaType::new("image/jpeg");
        assert_eq!(slot_filename(0, &jpeg), "001.jpg");
        assert_eq!(slot_filename(9, &jpeg), "010.jpg");
        assert_eq!(slot_filename(1, &MediaType::new("image/png")), "002.png");
    }

    #[test]
    fn unknown_media_type_gets_bin_extension() {
        assert_eq!(extension_for(&MediaType::new("image/heic")), "bin");
    }
}
