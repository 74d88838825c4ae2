//! Query parameters for the feed and the remote catalog

use serde::{Deserialize, Serialize};

/// Parameters a UI consumer opens the feed with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedParams {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl FeedParams {
    pub fn new(category: Option<String>, search: Option<String>) -> Self {
        Self {
            category: category.filter(|c| !c.trim().is_empty()),
            search: search.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// One remote catalog request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// City or location string
    pub location: String,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page_size: u32,
    /// Ask the catalog to include third-party aggregated results
    pub include_external: bool,
}

impl CatalogQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            category: None,
            search: None,
            page_size: 50,
            include_external: true,
        }
    }

    /// Build a catalog query from feed parameters and the configured city
    pub fn from_params(
        params: &FeedParams,
        config: &evhub_common::config::CatalogConfig,
    ) -> Self {
        Self {
            location: config.default_city.clone(),
            category: params.category.clone(),
            search: params.search.clone(),
            page_size: config.page_size,
            include_external: config.include_external,
        }
    }
}
