//! Event signatures for cross-source duplicate detection
//!
//! Two fingerprints are computed per event:
//! - **Identity signature**: title | minute bucket | location | cover image
//! - **Venue signature**: location | minute bucket | organizer
//!
//! Empty components are kept. Two sparse records with no location or
//! organizer can therefore collide on the venue signature.

use crate::models::UnifiedEvent;

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_LOCATION_CHARS: usize = 80;
pub const MAX_ORGANIZER_CHARS: usize = 60;
pub const MAX_IMAGE_CHARS: usize = 200;
pub const MAX_DATE_LABEL_CHARS: usize = 30;

const SEPARATOR: char = '|';

/// Signature pair for one event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventSignatures {
    pub identity: String,
    pub venue: String,
}

/// Compute both signatures for an event
pub fn signatures(event: &UnifiedEvent) -> EventSignatures {
    EventSignatures {
        identity: identity_signature(event),
        venue: venue_signature(event),
    }
}

/// Strict fingerprint: title, time bucket, location, cover image
pub fn identity_signature(event: &UnifiedEvent) -> String {
    [
        normalize_text(&event.title, MAX_TITLE_CHARS),
        date_bucket(event),
        normalize_text(event.location.as_deref().unwrap_or(""), MAX_LOCATION_CHARS),
        normalize_image_url(event.cover_image.as_deref().unwrap_or("")),
    ]
    .join(&SEPARATOR.to_string())
}

/// Loose fingerprint: location, time bucket, organizer
pub fn venue_signature(event: &UnifiedEvent) -> String {
    [
        normalize_text(event.location.as_deref().unwrap_or(""), MAX_LOCATION_CHARS),
        date_bucket(event),
        normalize_text(
            event.organizer_name.as_deref().unwrap_or(""),
            MAX_ORGANIZER_CHARS,
        ),
    ]
    .join(&SEPARATOR.to_string())
}

/// Lowercase, trim, collapse whitespace/comma runs, truncate to `max_chars`
pub fn normalize_text(value: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_gap = false;

    for c in value.trim().chars() {
        if c.is_whitespace() || c == ',' {
            pending_gap = true;
            continue;
        }
        if pending_gap && !out.is_empty() {
            out.push(' ');
        }
        pending_gap = false;
        out.extend(c.to_lowercase());
    }

    truncate_chars(&out, max_chars)
}

/// Normalize an image URL to its path: no scheme, host, query, or fragment
///
/// Values that do not parse as absolute URLs are cut at the first `?` or `#`.
pub fn normalize_image_url(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let path = match reqwest::Url::parse(trimmed) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    truncate_chars(&path.to_lowercase(), MAX_IMAGE_CHARS)
}

/// Minute-precision UTC timestamp, or the normalized display date as fallback
pub fn date_bucket(event: &UnifiedEvent) -> String {
    match event.start_instant {
        Some(instant) => instant.format("%Y-%m-%dT%H:%M").to_string(),
        None => truncate_chars(
            &event.display_date.trim().to_lowercase(),
            MAX_DATE_LABEL_CHARS,
        ),
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
