//! In-memory memoisation of symbol resolutions for the duration of a run.
//!
//! [`ResolutionCache`] holds finished resolutions. [`IsinMappings`] holds raw
//! ISIN to ticker mappings fetched in bulk before resolution starts.

use std::collections::HashMap;
use std::sync::Arc;

use crate::resolver::Resolution;
use crate::{Isin, StockRequest, Ticker};

/// Identity of a request as far as resolution is concerned.
///
/// An explicit ticker fully determines the outcome. Otherwise the ISIN and
/// the case-folded name together do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionKey {
    Ticker(String),
    Lookup {
        isin: Option<String>,
        name: String,
    },
}

impl ResolutionKey {
    pub fn for_request(request: &StockRequest) -> Self {
        match &request.ticker {
            Some(ticker) => Self::Ticker(ticker.to_ascii_uppercase()),
            None => Self::Lookup {
                isin: request.isin.as_ref().map(|isin| isin.to_ascii_uppercase()),
                name: request.name.to_lowercase(),
            },
        }
    }
}

/// Thread-safe resolution cache shared by concurrent lookups.
#[derive(Debug, Clone)]
pub struct ResolutionCache {
    inner: Arc<tokio::sync::RwLock<HashMap<ResolutionKey, Resolution>>>,
    enabled: bool,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            enabled: true,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub async fn get(&self, key: &ResolutionKey) -> Option<Resolution> {
        if !self.enabled {
            return None;
        }
        let store = self.inner.read().await;
        store.get(key).cloned()
    }

    pub async fn put(&self, key: ResolutionKey, resolution: Resolution) {
        if !self.enabled {
            return;
        }
        let mut store = self.inner.write().await;
        store.insert(key, resolution);
    }

    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.clear();
    }

    pub const fn is_disabled(&self) -> bool {
        !self.enabled
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Unvalidated ISIN mappings. `Some(None)` records that the ISIN is unknown.
#[derive(Debug, Clone, Default)]
pub struct IsinMappings {
    inner: Arc<tokio::sync::RwLock<HashMap<Isin, Option<Ticker>>>>,
}

impl IsinMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, isin: &Isin) -> Option<Option<Ticker>> {
        let store = self.inner.read().await;
        store.get(isin).cloned()
    }

    pub async fn contains(&self, isin: &Isin) -> bool {
        let store = self.inner.read().await;
        store.contains_key(isin)
    }

    pub async fn extend(&self, mappings: impl IntoIterator<Item = (Isin, Option<Ticker>)>) {
        let mut store = self.inner.write().await;
        store.extend(mappings);
    }
}
