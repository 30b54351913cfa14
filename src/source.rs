//! Input images as they arrive from collaborators.
//!
//! A file picker or drop zone hands over raw bytes with a declared media
//! type; a listing page refers to photos by reference (local path, data URL,
//! or remote URL). This module normalizes both into [`SourceImage`], the
//! immutable bytes-plus-type value the rest of the pipeline consumes.
//!
//! ## Data URLs
//!
//! Gallery payloads travel as `data:<mime>;base64,<payload>` strings. Sizes
//! are always measured on the decoded payload, never on the string length:
//! base64 inflates by a third, so a string-length estimate would put images
//! outside the byte window they were encoded for.
//!
//! ## Remote references
//!
//! Remote (`http://`, `https://`) references are never fetched. Loading one
//! fails with [`DecodeError::CrossOrigin`], the same outcome a browser gives
//! for a tainted cross-origin image, so callers take their fallback path.

use crate::imaging::DecodeError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use std::fmt;
use std::path::{Path, PathBuf};

/// A declared media type such as `image/jpeg`. Stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_ascii_lowercase())
    }

    /// Guess the media type of a file from its extension.
    ///
    /// Unknown extensions map to `application/octet-stream`, which intake
    /// filters out as a non-image.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let mime = match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "tif" | "tiff" => "image/tiff",
            "gif" => "image/gif",
            "avif" => "image/avif",
            "heic" => "image/heic",
            _ => "application/octet-stream",
        };
        Self::new(mime)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the type names an image (`image/...`).
    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/")
    }

    /// The decoder to use for this type.
    ///
    /// `Ok(None)` means "an image of unspecified format": the decoder sniffs
    /// the content. Non-image types and image formats without a compiled-in
    /// decoder are rejected.
    pub fn image_format(&self) -> Result<Option<ImageFormat>, DecodeError> {
        if !self.is_image() {
            return Err(DecodeError::UnsupportedType(self.0.clone()));
        }
        // Common non-standard spelling
        let format = if self.0 == "image/jpg" {
            Some(ImageFormat::Jpeg)
        } else {
            ImageFormat::from_mime_type(&self.0)
        };
        match format {
            Some(f) if f.reading_enabled() => Ok(Some(f)),
            Some(_) => Err(DecodeError::UnsupportedType(self.0.clone())),
            None => Ok(None),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw encoded bytes of one input image. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    name: String,
    bytes: Vec<u8>,
    media_type: MediaType,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self {
            name: name.into(),
            bytes,
            media_type,
        }
    }

    /// Read a file from disk, typing it by extension.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes, MediaType::from_path(path)))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(name: impl Into<String>, url: &str) -> Result<Self, DecodeError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| DecodeError::Malformed("not a data URL".to_string()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| DecodeError::Malformed("data URL has no payload".to_string()))?;
        let mime = meta.strip_suffix(";base64").ok_or_else(|| {
            DecodeError::Malformed("only base64 data URLs are supported".to_string())
        })?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DecodeError::Malformed(format!("bad base64 payload: {e}")))?;
        Ok(Self::new(name, bytes, MediaType::new(mime)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }
}

/// An input offered to intake, typed but not necessarily read yet.
///
/// Files are only read once intake has accepted them, so non-images and
/// photos past the gallery's free room never hold their bytes in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferedImage {
    Loaded(SourceImage),
    File {
        name: String,
        path: PathBuf,
        media_type: MediaType,
    },
}

impl OfferedImage {
    /// Type a file by extension without reading it.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = MediaType::from_path(&path);
        Self::File {
            name,
            path,
            media_type,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Loaded(image) => image.name(),
            Self::File { name, .. } => name,
        }
    }

    pub fn media_type(&self) -> &MediaType {
        match self {
            Self::Loaded(image) => image.media_type(),
            Self::File { media_type, .. } => media_type,
        }
    }

    pub fn load(self) -> Result<SourceImage, DecodeError> {
        match self {
            Self::Loaded(image) => Ok(image),
            Self::File {
                name,
                path,
                media_type,
            } => Ok(SourceImage::new(name, std::fs::read(&path)?, media_type)),
        }
    }
}

impl From<SourceImage> for OfferedImage {
    fn from(image: SourceImage) -> Self {
        Self::Loaded(image)
    }
}

/// Render encoded bytes as a base64 data URL.
pub fn to_data_url(media_type: &MediaType, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

/// Where a displayable image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Bytes already in memory (a gallery slot, a data URL).
    Inline(SourceImage),
    /// A local file.
    File(PathBuf),
    /// A reference on another origin; never fetched.
    Remote(String),
}

impl ImageSource {
    /// Classify a textual reference: `data:` URLs are parsed inline,
    /// `http(s)://` URLs are remote, anything else is a local path.
    pub fn from_reference(reference: &str) -> Result<Self, DecodeError> {
        if reference.starts_with("data:") {
            return SourceImage::from_data_url("inline", reference).map(Self::Inline);
        }
        let lower = reference.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Remote(reference.to_string()));
        }
        Ok(Self::File(PathBuf::from(reference)))
    }

    /// Materialize the encoded bytes.
    pub fn load(&self) -> Result<SourceImage, DecodeError> {
        match self {
            Self::Inline(image) => Ok(image.clone()),
            Self::File(path) => Ok(SourceImage::read(path)?),
            Self::Remote(url) => Err(DecodeError::CrossOrigin(url.clone())),
        }
    }
}
