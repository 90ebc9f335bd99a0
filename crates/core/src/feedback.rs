//! Feedback (comment) validation and `@mention` extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum length of a feedback comment.
pub const MAX_FEEDBACK_LENGTH: usize = 5_000;

/// Maximum length of the display name attached to feedback.
pub const MAX_AUTHOR_NAME_LENGTH: usize = 120;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w@])@([A-Za-z0-9][A-Za-z0-9._-]{0,63})").expect("valid mention regex")
});

/// Validate feedback text and an optional video timestamp (seconds).
pub fn validate_feedback(text: &str, video_timestamp: Option<f64>) -> Result<(), CoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Feedback text must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_FEEDBACK_LENGTH {
        return Err(CoreError::Validation(format!(
            "Feedback text must be at most {MAX_FEEDBACK_LENGTH} characters"
        )));
    }
    if let Some(ts) = video_timestamp {
        if !ts.is_finite() || ts < 0.0 {
            return Err(CoreError::Validation(
                "video_timestamp must be a non-negative number of seconds".into(),
            ));
        }
    }
    Ok(())
}

/// Validate the free-text author name used by share-link visitors.
pub fn validate_author_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Your name is required".into()));
    }
    if trimmed.chars().count() > MAX_AUTHOR_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_AUTHOR_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Extract unique `@handle` mentions in order of first appearance.
///
/// Email addresses (`a@b.com`) are not mentions. Trailing punctuation is
/// dropped, so `@sam.` yields `sam`.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in MENTION_RE.captures_iter(text) {
        let handle = cap[1].trim_end_matches(['.', '-', '_']).to_string();
        if !handle.is_empty() && !out.iter().any(|h| h.eq_ignore_ascii_case(&handle)) {
            out.push(handle);
        }
    }
    out
}

/// Match a mention handle against a user's display name.
///
/// A handle matches when it equals the full name with spaces removed or the
/// first name, case-insensitively (`@janedoe` and `@jane` both match "Jane Doe").
pub fn mention_matches_name(handle: &str, name: &str) -> bool {
    let compact: String = name.split_whitespace().collect();
    let first = name.split_whitespace().next().unwrap_or_default();
    handle.eq_ignore_ascii_case(&compact) || handle.eq_ignore_ascii_case(first)
}

/// Format a video timestamp in seconds as `m:ss` (or `h:mm:ss`).
pub fn format_video_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
