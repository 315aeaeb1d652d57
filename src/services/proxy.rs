//! Rotating outbound HTTP proxies
//!
//! [`ProxyPool`] owns a cache of candidate proxies harvested from a public
//! list. The cache, its rotation cursor and the last refresh instant sit
//! behind one async mutex, so reads and refreshes never interleave.
//! Refreshes are time-gated to bound how often the list is fetched, even
//! when the cache is empty; until the gate opens callers go direct.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::metrics::Metrics;

/// Anything that can hand out a working proxy URL
#[async_trait::async_trait]
pub trait ProxySource: Send + Sync {
    /// A proxy believed to work right now, or `None` to go direct
    async fn get_working_proxy(&self) -> Option<String>;
}

/// Supplies raw proxy candidates
#[async_trait::async_trait]
pub trait ProxyHarvester: Send + Sync {
    async fn harvest(&self) -> Result<Vec<String>, ProxyError>;
}

/// Checks whether a proxy currently forwards traffic
#[async_trait::async_trait]
pub trait ProxyProbe: Send + Sync {
    async fn is_alive(&self, proxy: &str) -> bool;
}

#[derive(Debug, Default)]
struct ProxyCache {
    entries: Vec<String>,
    cursor: usize,
    last_refresh: Option<Instant>,
}

impl ProxyCache {
    fn is_stale(&self, refresh_interval: Duration) -> bool {
        match self.last_refresh {
            Some(at) => at.elapsed() >= refresh_interval,
            None => true,
        }
    }

    /// Next candidate in rotation order
    fn next_candidate(&mut self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }
        let candidate = self.entries[self.cursor].clone();
        self.cursor += 1;
        Some(candidate)
    }

    fn evict(&mut self, proxy: &str) {
        if let Some(pos) = self.entries.iter().position(|p| p == proxy) {
            self.entries.remove(pos);
            if pos < self.cursor {
                self.cursor -= 1;
            }
        }
    }
}

pub struct ProxyPool {
    harvester: Arc<dyn ProxyHarvester>,
    probe: Arc<dyn ProxyProbe>,
    refresh_interval: Duration,
    max_attempts: u32,
    cache: Mutex<ProxyCache>,
    metrics: Option<Arc<Metrics>>,
}

impl ProxyPool {
    pub fn new(
        harvester: Arc<dyn ProxyHarvester>,
        probe: Arc<dyn ProxyProbe>,
        refresh_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            harvester,
            probe,
            refresh_interval,
            max_attempts: max_attempts.max(1),
            cache: Mutex::new(ProxyCache::default()),
            metrics: None,
        }
    }

    /// Pool backed by the HTTP list harvester and probe
    pub fn from_config(config: &ProxyConfig, http_timeout: Duration) -> Result<Self, ProxyError> {
        let harvester = HttpProxyHarvester::new(config.list_url.clone(), http_timeout)?;
        let probe = HttpProxyProbe::new(config.probe_url.clone(), config.probe_timeout);
        Ok(Self::new(
            Arc::new(harvester),
            Arc::new(probe),
            config.refresh_interval,
            config.max_attempts,
        ))
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Number of cached candidates
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.entries.len()
    }

    async fn refresh(&self, cache: &mut ProxyCache) {
        match self.harvester.harvest().await {
            Ok(entries) => {
                info!(count = entries.len(), "Refreshed proxy list");
                cache.entries = entries;
                cache.cursor = 0;
            }
            Err(e) => {
                // Keep the old entries; the refresh gate advances regardless.
                warn!(error = %e, "Failed to refresh proxy list");
            }
        }
        cache.last_refresh = Some(Instant::now());
        if let Some(ref metrics) = self.metrics {
            metrics.proxy_refreshes_total.inc();
        }
    }
}

#[async_trait::async_trait]
impl ProxySource for ProxyPool {
    async fn get_working_proxy(&self) -> Option<String> {
        let mut cache = self.cache.lock().await;

        if cache.is_stale(self.refresh_interval) {
            self.refresh(&mut cache).await;
        }

        for attempt in 1..=self.max_attempts {
            let candidate = match cache.next_candidate() {
                Some(candidate) => candidate,
                None => break,
            };

            if self.probe.is_alive(&candidate).await {
                debug!(proxy = %candidate, attempt, "Selected working proxy");
                return Some(candidate);
            }

            debug!(proxy = %candidate, attempt, "Proxy failed liveness probe, evicting");
            cache.evict(&candidate);
        }

        warn!(
            max_attempts = self.max_attempts,
            remaining = cache.entries.len(),
            "No working proxy found, continuing without one"
        );
        None
    }
}

/// Fetches a plain-text list with one `host:port` per line
pub struct HttpProxyHarvester {
    list_url: String,
    client: Client,
}

impl HttpProxyHarvester {
    pub fn new(list_url: impl Into<String>, timeout: Duration) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Harvest(e.to_string()))?;
        Ok(Self {
            list_url: list_url.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl ProxyHarvester for HttpProxyHarvester {
    async fn harvest(&self) -> Result<Vec<String>, ProxyError> {
        let response = self
            .client
            .get(&self.list_url)
            .send()
            .await
            .map_err(|e| ProxyError::Harvest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Harvest(format!("status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProxyError::Harvest(e.to_string()))?;

        Ok(parse_proxy_list(&body))
    }
}

/// Parse `host:port` lines into proxy URLs, skipping blanks, comments and
/// anything that does not form a valid URL
pub fn parse_proxy_list(body: &str) -> Vec<String> {
    let mut proxies = Vec::new();
    for line in body.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match normalize_proxy(line) {
            Ok(proxy) => {
                if !proxies.contains(&proxy) {
                    proxies.push(proxy);
                }
            }
            Err(e) => debug!(error = %e, "Skipping proxy entry"),
        }
    }
    proxies
}

/// Turn `host:port` (or a full URL) into `scheme://host:port`
pub fn normalize_proxy(entry: &str) -> Result<String, ProxyError> {
    let candidate = if entry.contains("://") {
        entry.to_string()
    } else {
        format!("http://{}", entry)
    };

    let url = Url::parse(&candidate).map_err(|_| ProxyError::InvalidAddress(entry.to_string()))?;
    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => Ok(format!("{}://{}:{}", url.scheme(), host, port)),
        _ => Err(ProxyError::InvalidAddress(entry.to_string())),
    }
}

/// Sends a GET to a known endpoint through the proxy with a short timeout
pub struct HttpProxyProbe {
    probe_url: String,
    timeout: Duration,
}

impl HttpProxyProbe {
    pub fn new(probe_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            probe_url: probe_url.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ProxyProbe for HttpProxyProbe {
    async fn is_alive(&self, proxy: &str) -> bool {
        let proxy = match reqwest::Proxy::all(proxy) {
            Ok(proxy) => proxy,
            Err(_) => return false,
        };
        let client = match Client::builder().proxy(proxy).timeout(self.timeout).build() {
            Ok(client) => client,
            Err(_) => return false,
        };
        match client.get(&self.probe_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
