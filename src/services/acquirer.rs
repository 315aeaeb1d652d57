//! Price series acquisition with bounded retries and linear backoff

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, Retryable};
use tracing::{debug, error, info, warn};

use crate::core::clock::Sleeper;
use crate::error::{AcquireError, FeedError};
use crate::metrics::Metrics;
use crate::models::market::{KlineRequest, PriceSeries};
use crate::services::market_data::PriceFeed;
use crate::services::proxy::ProxySource;

/// Fewer klines than this counts as a failed fetch
pub const MIN_KLINES: usize = 2;

/// Attempt budget for one acquisition.
///
/// `max_attempts` counts every call including the first. After the k-th
/// failure the acquirer waits `k * base_delay` before trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn backoff(&self) -> LinearBackoffBuilder {
        LinearBackoffBuilder {
            base_delay: self.base_delay,
            max_attempts: self.max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinearBackoffBuilder {
    base_delay: Duration,
    max_attempts: u32,
}

impl BackoffBuilder for LinearBackoffBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            base_delay: self.base_delay,
            max_attempts: self.max_attempts,
            attempt: 1,
        }
    }
}

/// Yields `base, 2*base, 3*base, ...`, one delay per remaining attempt
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_delay: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        let delay = self.base_delay * self.attempt;
        self.attempt += 1;
        Some(delay)
    }
}

/// Bridges the injectable [`Sleeper`] into backon's sleep hook
#[derive(Clone)]
struct SleeperAdapter(Arc<dyn Sleeper>);

impl backon::Sleeper for SleeperAdapter {
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep(&self, dur: Duration) -> Self::Sleep {
        let sleeper = self.0.clone();
        Box::pin(async move { sleeper.sleep(dur).await })
    }
}

pub struct FeedAcquirer {
    feed: Arc<dyn PriceFeed>,
    proxies: Option<Arc<dyn ProxySource>>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl FeedAcquirer {
    pub fn new(feed: Arc<dyn PriceFeed>, sleeper: Arc<dyn Sleeper>, policy: RetryPolicy) -> Self {
        Self {
            feed,
            proxies: None,
            sleeper,
            policy,
            metrics: None,
        }
    }

    pub fn with_proxies(mut self, proxies: Arc<dyn ProxySource>) -> Self {
        self.proxies = Some(proxies);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch a fresh price series, retrying until the attempt budget is spent.
    /// Never returns a partial result.
    pub async fn acquire(&self, request: &KlineRequest) -> Result<PriceSeries, AcquireError> {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let this = self;

        let result = (move || async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            this.attempt(request, attempt).await
        })
        .retry(self.policy.backoff())
        .sleep(SleeperAdapter(self.sleeper.clone()))
        .notify(|err: &FeedError, delay: Duration| {
            warn!(
                symbol = %request.symbol,
                attempt = attempts.load(Ordering::SeqCst),
                max_attempts = self.policy.max_attempts,
                delay_secs = delay.as_secs_f64(),
                error = %err,
                "Kline fetch failed, retrying"
            );
        })
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        match result {
            Ok(series) => {
                info!(
                    symbol = %request.symbol,
                    prices = series.len(),
                    attempts,
                    "Acquired price series"
                );
                Ok(series)
            }
            Err(source) => {
                error!(
                    symbol = %request.symbol,
                    attempts,
                    error = %source,
                    "Price feed unavailable, giving up"
                );
                Err(AcquireError::FeedUnavailable {
                    symbol: request.symbol.clone(),
                    attempts,
                    source,
                })
            }
        }
    }

    async fn attempt(&self, request: &KlineRequest, attempt: u32) -> Result<PriceSeries, FeedError> {
        if let Some(ref metrics) = self.metrics {
            metrics.fetch_attempts_total.inc();
        }

        let proxy = match self.proxies {
            Some(ref source) => source.get_working_proxy().await,
            None => None,
        };

        debug!(
            symbol = %request.symbol,
            attempt,
            proxy = proxy.as_deref().unwrap_or("none"),
            "Fetching klines"
        );

        let result = self
            .feed
            .fetch_klines(request, proxy.as_deref())
            .await
            .and_then(|klines| {
                if klines.len() < MIN_KLINES {
                    Err(FeedError::InsufficientData {
                        received: klines.len(),
                    })
                } else {
                    Ok(PriceSeries::from_klines(request.symbol.clone(), &klines))
                }
            });

        if result.is_err() {
            if let Some(ref metrics) = self.metrics {
                metrics.fetch_failures_total.inc();
            }
        }
        result
    }
}
