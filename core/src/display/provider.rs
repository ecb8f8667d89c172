//! One-per-process acquisition of the map provider.
//!
//! The provider is requested once with a credential and a list of feature libraries.
//! A registry keyed on a capability marker answers "is it already here?" so a second
//! caller reuses the loaded capabilities instead of requesting them again. The first
//! caller holds a [`ProviderGuard`]; dropping it releases the marker. A failed load
//! stays failed for the life of the registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Library that carries heatmap rendering support.
pub const VISUALIZATION_LIBRARY: &str = "visualization";

/// Parameters for the one-time provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub base_url: String,
    pub credential: String,
    pub libraries: Vec<String>,
}

impl ProviderRequest {
    pub fn new(base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: credential.into(),
            libraries: vec![VISUALIZATION_LIBRARY.to_string()],
        }
    }

    pub fn url(&self) -> String {
        format!("{}/provider", self.base_url.trim_end_matches('/'))
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.credential.clone()),
            ("libraries", self.libraries.join(",")),
        ]
    }
}

/// What the provider reported as loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub libraries: Vec<String>,
}

impl ProviderCapabilities {
    pub fn has_library(&self, name: &str) -> bool {
        self.libraries.iter().any(|lib| lib == name)
    }

    pub fn supports_heatmap(&self) -> bool {
        self.has_library(VISUALIZATION_LIBRARY)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Loading,
    Ready(ProviderCapabilities),
    Failed(String),
}

/// Result of asking the registry for a provider.
#[derive(Debug)]
pub enum Acquisition {
    /// Caller must perform the load and report back through the guard.
    Owner(ProviderGuard),
    /// Already loaded in this process.
    Present(ProviderCapabilities),
    /// Another caller is loading it right now.
    InFlight,
    /// An earlier load failed; no retry in this process.
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by the whole process.
    pub fn global() -> ProviderRegistry {
        static GLOBAL: OnceLock<ProviderRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ProviderRegistry::new).clone()
    }

    pub fn acquire(&self, marker: &str) -> Acquisition {
        let Ok(mut entries) = self.entries.lock() else {
            return Acquisition::Failed("provider registry poisoned".into());
        };
        match entries.get(marker) {
            Some(Entry::Ready(capabilities)) => Acquisition::Present(capabilities.clone()),
            Some(Entry::Loading) => Acquisition::InFlight,
            Some(Entry::Failed(reason)) => Acquisition::Failed(reason.clone()),
            None => {
                entries.insert(marker.to_string(), Entry::Loading);
                Acquisition::Owner(ProviderGuard {
                    marker: marker.to_string(),
                    entries: self.entries.clone(),
                })
            }
        }
    }

    pub fn capabilities(&self, marker: &str) -> Option<ProviderCapabilities> {
        let entries = self.entries.lock().ok()?;
        match entries.get(marker) {
            Some(Entry::Ready(capabilities)) => Some(capabilities.clone()),
            _ => None,
        }
    }

    pub fn is_present(&self, marker: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(marker))
            .unwrap_or(false)
    }
}

/// Held by whoever loaded the provider; releases the marker on drop.
#[derive(Debug)]
pub struct ProviderGuard {
    marker: String,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl ProviderGuard {
    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn resolve(&self, result: Result<ProviderCapabilities, String>) {
        if let Ok(mut entries) = self.entries.lock() {
            let entry = match result {
                Ok(capabilities) => Entry::Ready(capabilities),
                Err(reason) => Entry::Failed(reason),
            };
            entries.insert(self.marker.clone(), entry);
        }
    }
}

impl Drop for ProviderGuard {
    fn drop(&mut self) {
        if let Ok(mut entries) = self.entries.lock() {
            // a failure outlives its guard so the process never retries
            if !matches!(entries.get(&self.marker), Some(Entry::Failed(_))) {
                entries.remove(&self.marker);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> ProviderCapabilities {
        ProviderCapabilities {
            libraries: vec![VISUALIZATION_LIBRARY.into()],
        }
    }

    #[test]
    fn second_acquire_reuses_loaded_provider() {
        let registry = ProviderRegistry::new();
        let Acquisition::Owner(guard) = registry.acquire("maps") else {
            panic!("first acquire must own the load");
        };
        assert!(matches!(registry.acquire("maps"), Acquisition::InFlight));

        guard.resolve(Ok(caps()));
        match registry.acquire("maps") {
            Acquisition::Present(found) => assert!(found.supports_heatmap()),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(registry.capabilities("maps"), Some(caps()));
    }

    #[test]
    fn dropping_guard_releases_marker() {
        let registry = ProviderRegistry::new();
        if let Acquisition::Owner(guard) = registry.acquire("maps") {
            guard.resolve(Ok(caps()));
            assert!(registry.is_present("maps"));
        }
        assert!(!registry.is_present("maps"));
        assert!(matches!(registry.acquire("maps"), Acquisition::Owner(_)));
    }

    #[test]
    fn failure_is_sticky() {
        let registry = ProviderRegistry::new();
        if let Acquisition::Owner(guard) = registry.acquire("maps") {
            guard.resolve(Err("script blocked".into()));
        }
        match registry.acquire("maps") {
            Acquisition::Failed(reason) => assert_eq!(reason, "script blocked"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(registry.capabilities("maps"), None);
    }

    #[test]
    fn global_registry_is_shared() {
        let marker = "provider-test-global-marker";
        let first = ProviderRegistry::global();
        let Acquisition::Owner(_guard) = first.acquire(marker) else {
            panic!("marker must be fresh");
        };
        assert!(ProviderRegistry::global().is_present(marker));
    }

    #[test]
    fn request_carries_credential_and_libraries() {
        let request = ProviderRequest::new("http://127.0.0.1:9000/", "key-123");
        assert_eq!(request.url(), "http://127.0.0.1:9000/provider");
        assert_eq!(
            request.query(),
            vec![
                ("key", "key-123".to_string()),
                ("libraries", "visualization".to_string())
            ]
        );
        assert!(!ProviderCapabilities::default().supports_heatmap());
    }
}
