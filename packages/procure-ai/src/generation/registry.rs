//! Named provider selection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GenerationError, Result};
use crate::generation::adapter::{GenerationAdapter, GenerationDefaults};
use crate::generation::retry::RetryPolicy;
use crate::traits::GenerationProvider;

struct Entry {
    provider: Arc<dyn GenerationProvider>,
    available: AtomicBool,
}

/// Availability snapshot for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub available: bool,
    pub is_default: bool,
}

/// Registered providers in registration order, plus a default.
///
/// Lookup by name falls back to the first available provider, so a missing
/// or unhealthy choice degrades instead of failing.
pub struct ProviderRegistry {
    entries: Vec<Entry>,
    default: Option<String>,
    defaults: GenerationDefaults,
    retry: RetryPolicy,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            default: None,
            defaults: GenerationDefaults::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Defaults handed to every adapter built from this registry.
    pub fn with_defaults(mut self, defaults: GenerationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Add a provider. The first one registered becomes the default unless
    /// a later call sets `make_default`. Re-registering a name replaces it.
    pub fn register(&mut self, provider: Arc<dyn GenerationProvider>, make_default: bool) {
        let name = provider.name().to_string();
        let entry = Entry {
            provider,
            available: AtomicBool::new(true),
        };

        match self.entries.iter().position(|e| e.provider.name() == name) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }

        if make_default || self.default.is_none() {
            self.default = Some(name);
        }
    }

    /// Change the default. Unknown names are rejected.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.entries.iter().any(|e| e.provider.name() == name) {
            return Err(GenerationError::NoProvider {
                requested: Some(name.to_string()),
            });
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Probe every provider and record which ones are usable.
    pub async fn initialize(&self) {
        let checks = self.entries.iter().map(|e| e.provider.health_check());
        let results = join_all(checks).await;

        for (entry, healthy) in self.entries.iter().zip(results) {
            entry.available.store(healthy, Ordering::Relaxed);
            if healthy {
                info!(provider = entry.provider.name(), "Generation provider available");
            } else {
                warn!(provider = entry.provider.name(), "Generation provider unavailable");
            }
        }
    }

    /// Resolve a provider: the named one, else the default, else the first
    /// available.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn GenerationProvider>> {
        let wanted = name.or(self.default.as_deref());

        if let Some(wanted) = wanted {
            if let Some(entry) = self
                .entries
                .iter()
                .find(|e| e.provider.name() == wanted && e.available.load(Ordering::Relaxed))
            {
                return Ok(Arc::clone(&entry.provider));
            }
        }

        match self.entries.iter().find(|e| e.available.load(Ordering::Relaxed)) {
            Some(entry) => {
                if let Some(wanted) = wanted {
                    warn!(
                        requested = wanted,
                        using = entry.provider.name(),
                        "Requested provider unavailable, falling back"
                    );
                }
                Ok(Arc::clone(&entry.provider))
            }
            None => Err(GenerationError::NoProvider {
                requested: name.map(str::to_string),
            }),
        }
    }

    /// An adapter over the resolved provider.
    pub fn adapter(&self, name: Option<&str>) -> Result<GenerationAdapter> {
        Ok(GenerationAdapter::new(self.get(name)?)
            .with_defaults(self.defaults.clone())
            .with_retry(self.retry.clone()))
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.entries
            .iter()
            .map(|e| ProviderInfo {
                name: e.provider.name().to_string(),
                available: e.available.load(Ordering::Relaxed),
                is_default: self.default.as_deref() == Some(e.provider.name()),
            })
            .collect()
    }
}
