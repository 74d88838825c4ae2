//! Remote event catalog client
//!
//! One-shot fetch of upcoming events from the third-party catalog, mapped into
//! [`UnifiedEvent`]. The remote source is best-effort: every failure (missing
//! key, network, timeout, non-2xx, malformed payload) yields an empty list and
//! a rate-limited warning. There is no retry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evhub_common::config::CatalogConfig;
use evhub_common::time::{local_wall_clock, millis_to_duration, parse_wall_date, parse_wall_time};
use evhub_common::{RateLimitedLog, RequestThrottle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{CatalogQuery, SourceOrigin, UnifiedEvent, UNTITLED_EVENT};

const USER_AGENT: &str = concat!("evhub/", env!("CARGO_PKG_VERSION"));

/// Images at least this wide with a 16:9 ratio are preferred as covers
const PREFERRED_IMAGE_MIN_WIDTH: u32 = 1000;
const PREFERRED_IMAGE_RATIO: &str = "16_9";

/// Source of external events
///
/// Implementations never fail: an unavailable catalog yields an empty list.
#[async_trait]
pub trait EventCatalog: Send + Sync {
    async fn fetch(&self, query: &CatalogQuery) -> Vec<UnifiedEvent>;
}

/// Catalog client errors (internal; `fetch` maps all of them to an empty list)
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog API key not configured")]
    MissingCredentials,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl CatalogError {
    /// Key for rate-limited logging
    fn log_key(&self) -> &'static str {
        match self {
            CatalogError::MissingCredentials => "catalog.missing_credentials",
            CatalogError::NetworkError(_) => "catalog.network",
            CatalogError::Timeout(_) => "catalog.timeout",
            CatalogError::ApiError(..) => "catalog.api",
            CatalogError::ParseError(_) => "catalog.parse",
        }
    }
}

/// Catalog search response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogResponse {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<CatalogEmbedded>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogEmbedded {
    #[serde(default)]
    pub events: Vec<CatalogEvent>,
}

/// One catalog event
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogEvent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub info: Option<String>,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
    pub dates: Option<CatalogDates>,
    #[serde(default)]
    pub classifications: Vec<CatalogClassification>,
    #[serde(rename = "priceRanges", default)]
    pub price_ranges: Vec<CatalogPriceRange>,
    pub promoter: Option<CatalogNamed>,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<CatalogEventEmbedded>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogImage {
    pub url: String,
    pub ratio: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogDates {
    pub start: Option<CatalogStart>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogStart {
    #[serde(rename = "localDate")]
    pub local_date: Option<String>,
    #[serde(rename = "localTime")]
    pub local_time: Option<String>,
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogClassification {
    pub segment: Option<CatalogNamed>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogNamed {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogPriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogEventEmbedded {
    #[serde(default)]
    pub venues: Vec<CatalogVenue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogVenue {
    pub name: Option<String>,
    pub address: Option<CatalogAddress>,
    pub city: Option<CatalogNamed>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogAddress {
    pub line1: Option<String>,
}

/// HTTP client for the remote event catalog
pub struct RemoteEventFetcher {
    http_client: reqwest::Client,
    throttle: RequestThrottle,
    config: CatalogConfig,
    warnings: Arc<RateLimitedLog>,
}

impl RemoteEventFetcher {
    pub fn new(config: CatalogConfig, warnings: Arc<RateLimitedLog>) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            throttle: RequestThrottle::new(millis_to_duration(config.min_request_interval_ms)),
            config,
            warnings,
        })
    }

    /// Longer bound when external aggregation is requested
    pub fn timeout_for(&self, query: &CatalogQuery) -> Duration {
        if query.include_external {
            Duration::from_millis(self.config.external_fetch_timeout_ms)
        } else {
            Duration::from_millis(self.config.fetch_timeout_ms)
        }
    }

    /// Fetch and map upcoming events, surfacing the failure reason
    pub async fn try_fetch(&self, query: &CatalogQuery) -> Result<Vec<UnifiedEvent>, CatalogError> {
        let api_key = self
            .config
            .valid_api_key()
            .ok_or(CatalogError::MissingCredentials)?;

        let waited = self.throttle.acquire().await;
        if !waited.is_zero() {
            tracing::debug!(waited_ms = waited.as_millis() as u64, "Catalog request throttled");
        }

        let timeout = self.timeout_for(query);
        let start_after = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let page_size = query.page_size.to_string();
        let include_external = query.include_external.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("apikey", api_key),
            ("city", query.location.as_str()),
            ("size", page_size.as_str()),
            ("sort", "date,asc"),
            ("startDateTime", start_after.as_str()),
            ("includeExternal", include_external.as_str()),
        ];
        if let Some(category) = query.category.as_deref() {
            params.push(("classificationName", category));
        }
        if let Some(search) = query.search.as_deref() {
            params.push(("keyword", search));
        }

        tracing::debug!(
            city = %query.location,
            category = ?query.category,
            search = ?query.search,
            timeout_ms = timeout.as_millis() as u64,
            "Querying event catalog"
        );

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout(timeout)
                } else {
                    CatalogError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(status.as_u16(), error_text));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout(timeout)
            } else {
                CatalogError::NetworkError(e.to_string())
            }
        })?;

        let parsed: CatalogResponse =
            serde_json::from_str(&body).map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let events = map_catalog_response(parsed, &query.location);

        tracing::info!(
            city = %query.location,
            count = events.len(),
            "Retrieved events from catalog"
        );

        Ok(events)
    }
}

#[async_trait]
impl EventCatalog for RemoteEventFetcher {
    async fn fetch(&self, query: &CatalogQuery) -> Vec<UnifiedEvent> {
        match self.try_fetch(query).await {
            Ok(events) => events,
            Err(e) => {
                self.warnings
                    .warn(e.log_key(), format_args!("Remote catalog unavailable: {}", e));
                Vec::new()
            }
        }
    }
}

/// Map a catalog response into unified events
///
/// Events without an id are skipped; everything else is kept with defaults.
pub fn map_catalog_response(response: CatalogResponse, queried_city: &str) -> Vec<UnifiedEvent> {
    response
        .embedded
        .map(|e| e.events)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|event| map_catalog_event(event, queried_city))
        .collect()
}

/// Map one catalog event; `None` if it has no usable id
pub fn map_catalog_event(event: CatalogEvent, queried_city: &str) -> Option<UnifiedEvent> {
    let id = event.id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;

    let title = event
        .name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED_EVENT);

    let mut unified = UnifiedEvent::new(id, title, SourceOrigin::External);

    if let Some(start) = event.dates.as_ref().and_then(|d| d.start.as_ref()) {
        apply_start(&mut unified, start);
    }

    unified.cover_image = select_cover_image(&event.images);
    unified.location = Some(select_location(&event, queried_city));
    unified.description = event.info.clone().filter(|i| !i.trim().is_empty());
    unified.organizer_name = event
        .promoter
        .as_ref()
        .and_then(|p| p.name.clone())
        .filter(|n| !n.trim().is_empty());
    unified.category = event
        .classifications
        .first()
        .and_then(|c| c.segment.as_ref())
        .and_then(|s| s.name.as_deref())
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty());

    let min_price = minimum_price(&event.price_ranges);
    unified.price = min_price;
    unified.is_free = min_price.map(|p| p == 0.0);

    Some(unified)
}

/// Prefer a wide 16:9 image, else the first image
pub fn select_cover_image(images: &[CatalogImage]) -> Option<String> {
    images
        .iter()
        .find(|img| {
            img.ratio.as_deref() == Some(PREFERRED_IMAGE_RATIO)
                && img.width.unwrap_or(0) >= PREFERRED_IMAGE_MIN_WIDTH
        })
        .or_else(|| images.first())
        .map(|img| img.url.clone())
        .filter(|url| !url.trim().is_empty())
}

/// Street address + city, else venue name, else the queried city
pub fn select_location(event: &CatalogEvent, queried_city: &str) -> String {
    let venue = event
        .embedded
        .as_ref()
        .and_then(|e| e.venues.first());

    if let Some(venue) = venue {
        let line1 = venue
            .address
            .as_ref()
            .and_then(|a| a.line1.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let city = venue
            .city
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let (Some(line1), Some(city)) = (line1, city) {
            return format!("{}, {}", line1, city);
        }

        if let Some(name) = venue.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return name.to_string();
        }
    }

    queried_city.to_string()
}

fn minimum_price(ranges: &[CatalogPriceRange]) -> Option<f64> {
    ranges
        .iter()
        .filter_map(|r| r.min)
        .filter(|p| p.is_finite())
        .reduce(f64::min)
}

fn apply_start(event: &mut UnifiedEvent, start: &CatalogStart) {
    let local_date = start.local_date.as_deref().and_then(parse_wall_date);
    let local_time = start.local_time.as_deref().and_then(parse_wall_time);

    // Wall-clock values resolve the same way local records do
    let instant = start
        .date_time
        .as_deref()
        .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            local_date
                .and_then(|d| local_wall_clock(d, local_time))
                .map(|dt| dt.with_timezone(&Utc))
        });

    if let Some(instant) = instant {
        event.set_start(instant);
    }

    // Display the venue's wall-clock values when the catalog provides them
    if let Some(date) = local_date {
        event.display_date = date.format("%a, %b %-d").to_string();
        event.display_time = local_time
            .map(|t| t.format("%-I:%M %p").to_string())
            .unwrap_or_default();
    }
}
