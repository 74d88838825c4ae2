//! Placeholder cover image allocation
//!
//! Guarantees that no two events in one published list share a normalized
//! cover image. An event gets a placeholder when it has no image, or when its
//! image was already used earlier in the same pass.
//!
//! **Algorithm:**
//! 1. Pick the category pool (`other` for unknown or missing category)
//! 2. Start at `hash(id) % pool.len()` and probe forward cyclically for an
//!    unused candidate
//! 3. If the pool is exhausted, synthesize a per-event URL from the id

use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::signature::normalize_image_url;
use crate::models::UnifiedEvent;

/// Base for synthetic per-event placeholder URLs
pub const SYNTHETIC_PLACEHOLDER_BASE: &str = "https://evhub.invalid/placeholder";

const FALLBACK_CATEGORY: &str = "other";

const MUSIC_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1501386761578-eac5c94b800a?w=1200&q=80",
    "https://images.unsplash.com/photo-1470229722913-7c0e2dbbafd3?w=1200&q=80",
    "https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=1200&q=80",
    "https://images.unsplash.com/photo-1514525253161-7a46d19cd819?w=1200&q=80",
    "https://images.unsplash.com/photo-1459749411175-04bf5292ceea?w=1200&q=80",
];

const SPORTS_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=1200&q=80",
    "https://images.unsplash.com/photo-1517649763962-0c623066013b?w=1200&q=80",
    "https://images.unsplash.com/photo-1471295253337-3ceaaedca402?w=1200&q=80",
    "https://images.unsplash.com/photo-1508098682722-e99c43a406b2?w=1200&q=80",
];

const ARTS_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1507676184212-d03ab07a01bf?w=1200&q=80",
    "https://images.unsplash.com/photo-1460661419201-fd4cecdf8a8b?w=1200&q=80",
    "https://images.unsplash.com/photo-1503095396549-807759245b35?w=1200&q=80",
    "https://images.unsplash.com/photo-1513364776144-60967b0f800f?w=1200&q=80",
];

const FOOD_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?w=1200&q=80",
    "https://images.unsplash.com/photo-1555939594-58d7cb561ad1?w=1200&q=80",
    "https://images.unsplash.com/photo-1504674900247-0877df9cc836?w=1200&q=80",
];

const TECH_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1540575467063-178a50c2df87?w=1200&q=80",
    "https://images.unsplash.com/photo-1505373877841-8d25f7d46678?w=1200&q=80",
    "https://images.unsplash.com/photo-1515187029135-18ee286d815b?w=1200&q=80",
];

const NIGHTLIFE_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1566737236500-c8ac43014a67?w=1200&q=80",
    "https://images.unsplash.com/photo-1516450360452-9312f5e86fc7?w=1200&q=80",
    "https://images.unsplash.com/photo-1574391884720-bbc3740c59d1?w=1200&q=80",
];

const OTHER_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1492684223066-81342ee5ff30?w=1200&q=80",
    "https://images.unsplash.com/photo-1511795409834-ef04bbd61622?w=1200&q=80",
    "https://images.unsplash.com/photo-1523580494863-6f3031224c94?w=1200&q=80",
    "https://images.unsplash.com/photo-1429962714451-bb934ecdc4ec?w=1200&q=80",
];

/// Candidate pool for a category (case-insensitive), `other` if unknown
pub fn pool_for_category(category: Option<&str>) -> &'static [&'static str] {
    let key = category
        .map(|c| c.trim().to_lowercase())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

    match key.as_str() {
        "music" | "concert" | "concerts" => MUSIC_POOL,
        "sports" | "sport" => SPORTS_POOL,
        "arts" | "arts & theatre" | "theatre" | "theater" => ARTS_POOL,
        "food" | "food & drink" => FOOD_POOL,
        "tech" | "technology" => TECH_POOL,
        "nightlife" | "party" => NIGHTLIFE_POOL,
        _ => OTHER_POOL,
    }
}

/// Stable 64-bit hash of an event id
pub fn id_hash(id: &str) -> u64 {
    let digest = Sha256::digest(id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Synthetic placeholder URL derived from an event id
pub fn synthetic_placeholder(id: &str) -> String {
    let slug: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}/{}-{:016x}.jpg", SYNTHETIC_PLACEHOLDER_BASE, slug, id_hash(id))
}

/// Tracks which normalized images are taken in one display pass
#[derive(Debug, Default)]
pub struct ImageAllocator {
    used: HashSet<String>,
}

impl ImageAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of images assigned so far in this pass
    pub fn assigned(&self) -> usize {
        self.used.len()
    }

    /// Resolve the cover image for one event, claiming it
    pub fn assign(&mut self, event: &UnifiedEvent) -> String {
        if let Some(supplied) = event.cover_image.as_deref() {
            let key = normalize_image_url(supplied);
            if !key.is_empty() && self.used.insert(key) {
                return supplied.to_string();
            }
        }

        self.allocate_placeholder(&event.id, event.category.as_deref())
    }

    /// Pick an unused placeholder for `id`, falling back to a synthetic URL
    pub fn allocate_placeholder(&mut self, id: &str, category: Option<&str>) -> String {
        let pool = pool_for_category(category);
        if !pool.is_empty() {
            let start = (id_hash(id) % pool.len() as u64) as usize;
            for offset in 0..pool.len() {
                let candidate = pool[(start + offset) % pool.len()];
                if self.used.insert(normalize_image_url(candidate)) {
                    return candidate.to_string();
                }
            }
        }

        let base = synthetic_placeholder(id);
        if self.used.insert(normalize_image_url(&base)) {
            return base;
        }

        // Only reachable when a supplied image already equals the synthetic URL
        let stem = base.trim_end_matches(".jpg");
        let mut n = 1u32;
        loop {
            let candidate = format!("{}-{}.jpg", stem, n);
            if self.used.insert(normalize_image_url(&candidate)) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Give every event a cover image unique within the list
pub fn allocate_images(events: Vec<UnifiedEvent>) -> Vec<UnifiedEvent> {
    let mut allocator = ImageAllocator::new();
    let mut replaced = 0usize;

    let events: Vec<UnifiedEvent> = events
        .into_iter()
        .map(|mut event| {
            let image = allocator.assign(&event);
            if event.cover_image.as_deref() != Some(image.as_str()) {
                replaced += 1;
            }
            event.cover_image = Some(image);
            event
        })
        .collect();

    if replaced > 0 {
        tracing::debug!(
            total = events.len(),
            claimed = allocator.assigned(),
            replaced = replaced,
            "Assigned placeholder cover images"
        );
    }

    events
}
