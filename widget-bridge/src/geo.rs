//! Coarse user location, looked up once per process

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::Result;

/// Location as shared with guests. Never finer than city level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Source of the location, typically an IP lookup service
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self) -> Result<UserLocation>;
}

static GLOBAL: Lazy<GeoCache> = Lazy::new(GeoCache::new);

/// Memoized location.
///
/// Concurrent [`resolve`](Self::resolve) calls share one lookup. The first
/// success is kept for the life of the cache; a failure leaves it empty so
/// a later call tries again.
#[derive(Debug, Default)]
pub struct GeoCache {
    cell: OnceCell<UserLocation>,
}

impl GeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache
    pub fn global() -> &'static GeoCache {
        &GLOBAL
    }

    /// Location if a lookup already succeeded
    pub fn cached(&self) -> Option<&UserLocation> {
        self.cell.get()
    }

    pub async fn resolve(&self, locator: &dyn GeoLocator) -> Result<&UserLocation> {
        self.cell
            .get_or_try_init(|| async move {
                let location = locator.locate().await;
                if let Err(e) = &location {
                    tracing::warn!(error = %e, "geolocation lookup failed");
                }
                location
            })
            .await
    }
}
