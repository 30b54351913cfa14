//! End-to-end intake with the real `image` backend.
//!
//! Fixtures are synthetic noise photos encoded in memory; the byte window is
//! scaled down so the tests stay fast while still exercising downscaling and
//! the quality search.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use listing_photos::compress::{CompressionOutcome, compress};
use listing_photos::gallery::{Gallery, GalleryManifest};
use listing_photos::imaging::{EncodingTarget, ImageBackend, RustBackend};
use listing_photos::intake::{Intake, collect_files};
use listing_photos::source::{MediaType, SourceImage};

fn noise_jpeg(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_add(17);
    let img = RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let v = state.to_le_bytes();
        image::Rgb([v[1], v[2], v[3]])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 100)
        .encode_image(&img)
        .unwrap();
    buf
}

fn photo(name: &str, bytes: Vec<u8>) -> SourceImage {
    SourceImage::new(name, bytes, MediaType::new("image/jpeg"))
}

/// A window small enough for test-sized photos.
fn small_target() -> EncodingTarget {
    EncodingTarget {
        min_bytes: 4 * 1024,
        max_bytes: 40 * 1024,
        max_dimension: 300,
        max_iterations: 7,
    }
}

#[test]
fn oversized_photo_is_downscaled_and_budgeted() {
    let bytes = noise_jpeg(640, 480, 1);
    let target = small_target();
    assert!(bytes.len() > target.max_bytes);

    let backend = RustBackend::new();
    let result = compress(&backend, &photo("big.jpg", bytes), &target).unwrap();

    let dims = result.encoded_dimensions.unwrap();
    assert_eq!((dims.width, dims.height), (300, 225));
    assert!(target.contains(result.byte_len()) || result.attempts == 7);
    assert_ne!(result.outcome, CompressionOutcome::Unchanged);

    let decoded = backend
        .decode(&result.bytes, &MediaType::new("image/jpeg"))
        .unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 225));
}

#[test]
fn portrait_photo_caps_height() {
    let bytes = noise_jpeg(240, 600, 2);
    let result = compress(&RustBackend::new(), &photo("tall.jpg", bytes), &small_target()).unwrap();

    let dims = result.encoded_dimensions.unwrap();
    assert_eq!((dims.width, dims.height), (120, 300));
}

#[test]
fn small_photo_passes_through_byte_for_byte() {
    let bytes = noise_jpeg(32, 32, 3);
    let target = small_target();
    assert!(bytes.len() <= target.max_bytes);

    let result = compress(&RustBackend::new(), &photo("tiny.jpg", bytes.clone()), &target).unwrap();
    assert_eq!(result.outcome, CompressionOutcome::Unchanged);
    assert_eq!(result.bytes, bytes);
}

#[test]
fn batch_respects_capacity_and_skips_non_images() {
    let intake = Intake::new(small_target());
    let mut gallery = Gallery::new(3);
    let batch = vec![
        SourceImage::new("notes.txt", b"not a photo".to_vec(), MediaType::new("text/plain")),
        photo("a.jpg", noise_jpeg(400, 300, 10)),
        photo("b.jpg", noise_jpeg(64, 64, 11)),
        photo("c.jpg", noise_jpeg(400, 300, 12)),
        photo("d.jpg", noise_jpeg(400, 300, 13)),
    ];

    let report = intake.ingest(batch, &mut gallery, None);

    assert_eq!(report.skipped, vec!["notes.txt".to_string()]);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.added, vec![0, 1, 2]);
    assert!(!intake.is_processing());

    let names: Vec<&str> = gallery.slots().map(|s| s.entry.name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    assert!(gallery.cover().unwrap().is_cover);
}

#[test]
fn corrupt_photo_is_skipped_without_aborting_batch() {
    let intake = Intake::new(small_target());
    let mut gallery = Gallery::simplified();
    let corrupt = vec![0xFFu8; 64 * 1024];
    let batch = vec![
        photo("ok-1.jpg", noise_jpeg(400, 300, 20)),
        photo("corrupt.jpg", corrupt),
        photo("ok-2.jpg", noise_jpeg(400, 300, 21)),
    ];

    let report = intake.ingest(batch, &mut gallery, None);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "corrupt.jpg");
    assert_eq!(gallery.len(), 2);
    assert_eq!(gallery.get(1).unwrap().entry.name, "ok-2.jpg");
}

#[test]
fn manifest_survives_json_round_trip() {
    let intake = Intake::new(small_target());
    let mut gallery = Gallery::full();
    intake.ingest(
        vec![photo("front.jpg", noise_jpeg(400, 300, 30))],
        &mut gallery,
        None,
    );

    let json = serde_json::to_string_pretty(&gallery.manifest()).unwrap();
    let parsed: GalleryManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.capacity, 10);
    assert_eq!(parsed.slots.len(), 1);
    assert_eq!(parsed.slots[0].file, "001.jpg");
    assert_eq!(parsed.slots[0].dimensions, Some((300, 225)));
}

#[test]
fn removing_cover_promotes_next_photo() {
    let intake = Intake::new(small_target());
    let mut gallery = Gallery::full();
    intake.ingest(
        vec![
            photo("front.jpg", noise_jpeg(64, 64, 40)),
            photo("hall.jpg", noise_jpeg(64, 64, 41)),
        ],
        &mut gallery,
        None,
    );

    gallery.remove(0);
    let cover = gallery.cover().unwrap();
    assert_eq!(cover.entry.name, "hall.jpg");
    assert!(cover.data_url().starts_with("data:image/jpeg;base64,"));
}

#[test]
fn generic_raster_decodes_through_backend() {
    // PNG declared as a generic image is sniffed
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, image::Rgb([9, 9, 9])));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();

    let decoded = RustBackend::new()
        .decode(buf.get_ref(), &MediaType::new("image/*"))
        .unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 10));
}

#[test]
fn selection_with_missing_file_still_fills_gallery() {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().join("listing");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("a.txt"), b"floor plan notes").unwrap();
    std::fs::write(dir.join("b.jpg"), noise_jpeg(400, 300, 50)).unwrap();

    let files = collect_files(&[dir.clone(), dir.join("missing.jpg")]);
    let mut gallery = Gallery::simplified();
    let report = Intake::new(small_target()).ingest(files, &mut gallery, None);

    assert_eq!(report.offered, 3);
    assert_eq!(report.skipped, vec!["a.txt".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "missing.jpg");
    assert_eq!(gallery.len(), 1);
    assert_eq!(gallery.get(0).unwrap().entry.name, "b.jpg");
}
