//! Asset media types, naming, rating and storage-path helpers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of an asset display name.
pub const MAX_ASSET_NAME_LENGTH: usize = 255;

/// Highest star rating an asset can receive.
pub const MAX_RATING: i16 = 5;

/// Maximum number of tags per asset.
pub const MAX_TAGS: usize = 32;

/// Maximum length of a single tag.
pub const MAX_TAG_LENGTH: usize = 48;

/// Broad media class of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    Audio,
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "tif", "tiff", "bmp", "raw", "cr2", "cr3",
    "nef", "arw", "dng",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "avi", "mkv", "mxf"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "flac", "ogg", "aif", "aiff"];

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "other" => Ok(Self::Other),
            _ => Err(CoreError::Validation(format!(
                "Invalid asset type '{s}'. Must be one of: image, video, audio, other"
            ))),
        }
    }

    /// Classify an upload by MIME type, falling back to the file extension.
    pub fn detect(mime_type: Option<&str>, filename: &str) -> Self {
        if let Some(mime) = mime_type {
            let major = mime.split('/').next().unwrap_or_default();
            match major {
                "image" => return Self::Image,
                "video" => return Self::Video,
                "audio" => return Self::Audio,
                _ => {}
            }
        }

        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Audio
        } else {
            Self::Other
        }
    }
}

/// Validate an asset display name.
pub fn validate_asset_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Asset name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_ASSET_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Asset name must be at most {MAX_ASSET_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a star rating (0 clears the rating).
pub fn validate_rating(rating: i16) -> Result<(), CoreError> {
    if !(0..=MAX_RATING).contains(&rating) {
        return Err(CoreError::Validation(format!(
            "Rating must be between 0 and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}

/// Trim, lowercase and de-duplicate tags, preserving first-seen order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, CoreError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(CoreError::Validation(format!(
                "Tag '{tag}' exceeds {MAX_TAG_LENGTH} characters"
            )));
        }
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    if out.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "An asset can carry at most {MAX_TAGS} tags"
        )));
    }
    Ok(out)
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    // Strip any client-supplied directory components first.
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Lowercase a category and collapse every run of non-alphanumerics to `-`.
pub fn category_slug(category: &str) -> String {
    let mut slug = String::with_capacity(category.len());
    let mut pending_dash = false;
    for c in category.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "uncategorized".to_string()
    } else {
        slug
    }
}

/// Storage key for an uploaded file:
/// `projects/{project_id}/{category}/{timestamp_ms}-{filename}`.
pub fn storage_path(project_id: DbId, category: &str, timestamp_ms: i64, filename: &str) -> String {
    format!(
        "projects/{project_id}/{}/{timestamp_ms}-{}",
        category_slug(category),
        sanitize_filename(filename)
    )
}
