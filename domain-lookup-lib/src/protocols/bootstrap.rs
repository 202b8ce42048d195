//! IANA RDAP bootstrap directory.
//!
//! The directory merges three sources of RDAP base URLs for a TLD, in order:
//! configured overrides, the built-in registry table and the IANA bootstrap
//! document (`dns.json`). The bootstrap map is refreshed only when it is
//! missing or older than its TTL, and a refresh replaces the whole snapshot.

use crate::error::LookupError;
use crate::protocols::registry;
use crate::types::LookupConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// TLD -> ordered list of RDAP base URLs, as published by IANA.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapMap {
    servers: HashMap<String, Vec<String>>,
}

impl BootstrapMap {
    /// Build a map from the IANA bootstrap JSON.
    ///
    /// Each entry of `services` is a `[tlds, urls]` pair. Malformed entries are skipped;
    /// a document without a `services` array is an error.
    pub fn from_json(json: &Value) -> Result<Self, LookupError> {
        let services = json
            .get("services")
            .and_then(|s| s.as_array())
            .ok_or_else(|| {
                LookupError::parse("Invalid bootstrap JSON: missing or invalid 'services' array")
            })?;

        let mut servers: HashMap<String, Vec<String>> = HashMap::new();

        for service in services {
            let Some(pair) = service.as_array() else {
                continue;
            };
            if pair.len() < 2 {
                continue;
            }

            let urls: Vec<String> = pair[1]
                .as_array()
                .map(|urls| {
                    urls.iter()
                        .filter_map(|u| u.as_str())
                        .map(|u| u.trim_end_matches('/').to_string())
                        .collect()
                })
                .unwrap_or_default();
            if urls.is_empty() {
                continue;
            }

            if let Some(tlds) = pair[0].as_array() {
                for tld in tlds.iter().filter_map(|t| t.as_str()) {
                    servers
                        .entry(tld.to_lowercase())
                        .or_default()
                        .extend(urls.iter().cloned());
                }
            }
        }

        Ok(Self { servers })
    }

    /// Base URLs for a TLD, empty when the TLD is not listed.
    pub fn get(&self, tld: &str) -> &[String] {
        self.servers
            .get(&tld.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    map: Option<Arc<BootstrapMap>>,
    last_refreshed: Option<Instant>,
}

/// Process-wide RDAP server directory.
///
/// Shared through an `Arc` between the resolver and the RDAP client. Reads
/// clone the current `Arc<BootstrapMap>` under a short read lock, so a
/// concurrent refresh never exposes a half-built map.
#[derive(Debug)]
pub struct BootstrapDirectory {
    http: reqwest::Client,
    url: String,
    enabled: bool,
    ttl: Duration,
    overrides: HashMap<String, Vec<String>>,
    state: RwLock<Snapshot>,
}

impl BootstrapDirectory {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                LookupError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        let overrides = config
            .rdap_servers
            .iter()
            .map(|(tld, urls)| (tld.to_lowercase(), urls.clone()))
            .collect();

        Ok(Self {
            http,
            url: config.bootstrap_url.clone(),
            enabled: config.enable_bootstrap,
            ttl: config.bootstrap_ttl,
            overrides,
            state: RwLock::new(Snapshot::default()),
        })
    }

    /// Directory seeded with an already-fetched map, stamped as refreshed now.
    pub fn with_map(config: &LookupConfig, map: BootstrapMap) -> Result<Self, LookupError> {
        let directory = Self::new(config)?;
        directory.install(Some(map), Instant::now());
        Ok(directory)
    }

    /// When the bootstrap was last fetched (successfully or not).
    pub fn last_refreshed(&self) -> Option<Instant> {
        self.read_state().last_refreshed
    }

    /// Whether a refresh is due at `now`. Always false when bootstrap is disabled.
    pub fn is_stale_at(&self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        match self.read_state().last_refreshed {
            Some(at) => now.saturating_duration_since(at) >= self.ttl,
            None => true,
        }
    }

    /// Fetch the IANA bootstrap if the cached map is missing or expired.
    ///
    /// Failures are logged and leave the previous map in place. The attempt
    /// time is recorded either way, so an unreachable endpoint is retried
    /// only after another TTL.
    pub async fn refresh_if_stale(&self) {
        let now = Instant::now();
        if !self.is_stale_at(now) {
            return;
        }

        debug!(url = %self.url, "Refreshing RDAP bootstrap");
        match self.fetch().await {
            Ok(map) => {
                debug!(tlds = map.len(), "RDAP bootstrap loaded");
                self.install(Some(map), now);
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "RDAP bootstrap refresh failed, keeping previous map");
                self.install(None, now);
            }
        }
    }

    async fn fetch(&self) -> Result<BootstrapMap, LookupError> {
        let response = self.http.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(LookupError::network(format!(
                "Bootstrap registry returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        BootstrapMap::from_json(&json)
    }

    fn install(&self, map: Option<BootstrapMap>, at: Instant) {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Bootstrap write lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if let Some(map) = map {
            state.map = Some(Arc::new(map));
        }
        state.last_refreshed = Some(at);
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Bootstrap read lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn snapshot(&self) -> Option<Arc<BootstrapMap>> {
        self.read_state().map.clone()
    }

    /// Ordered RDAP base URLs for a TLD.
    ///
    /// Configured overrides and the built-in table come first, followed by
    /// the bootstrap entries. Duplicates are dropped. An empty list means
    /// RDAP is not available for the TLD.
    pub fn rdap_servers(&self, tld: &str) -> Vec<String> {
        let tld = tld.to_lowercase();
        let mut servers: Vec<String> = Vec::new();
        let mut push = |url: &str| {
            let url = url.trim_end_matches('/');
            if !url.is_empty() && !servers.iter().any(|s| s == url) {
                servers.push(url.to_string());
            }
        };

        if let Some(urls) = self.overrides.get(&tld) {
            urls.iter().for_each(|u| push(u));
        }
        if let Some(base) = registry::builtin_rdap_base(&tld) {
            push(base);
        }
        if let Some(map) = self.snapshot() {
            map.get(&tld).iter().for_each(|u| push(u));
        }

        servers
    }
}
