//! One polling cycle: acquire prices, evaluate RSI, classify, notify

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use futures_util::FutureExt;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::MonitorConfig;
use crate::error::CycleError;
use crate::indicators::momentum::rsi::calculate_rsi;
use crate::metrics::Metrics;
use crate::models::indicators::RsiIndicator;
use crate::models::market::KlineRequest;
use crate::services::acquirer::FeedAcquirer;
use crate::services::notifier::Notifier;
use crate::signals::alerts::{cycle_error_alert, feed_unavailable_alert, signal_alert};
use crate::signals::classification::SignalClass;

/// Result of a cycle that ran to completion
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// RSI crossed a threshold and an alert was attempted
    Alerted {
        signal: SignalClass,
        rsi: f64,
        delivered: bool,
    },
    /// RSI within the normal band, nothing sent
    Neutral { rsi: f64 },
    /// Every fetch attempt failed; a feed-unavailable notice was attempted
    FeedUnavailable,
}

pub struct RsiMonitor {
    config: MonitorConfig,
    acquirer: FeedAcquirer,
    notifier: Arc<dyn Notifier>,
    metrics: Option<Arc<Metrics>>,
    last_rsi: RwLock<Option<RsiIndicator>>,
}

impl RsiMonitor {
    pub fn new(config: MonitorConfig, acquirer: FeedAcquirer, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            acquirer,
            notifier,
            metrics: None,
            last_rsi: RwLock::new(None),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The most recent successfully computed RSI
    pub async fn last_rsi(&self) -> Option<RsiIndicator> {
        self.last_rsi.read().await.clone()
    }

    fn request(&self) -> KlineRequest {
        KlineRequest::new(
            self.config.symbol.clone(),
            self.config.interval.clone(),
            self.config.kline_limit,
        )
    }

    /// Run a single cycle. Feed outages are an outcome, not an error;
    /// `Err` means something unexpected went wrong.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let started = Instant::now();
        let symbol = self.config.symbol.as_str();
        if let Some(ref metrics) = self.metrics {
            metrics.cycles_total.inc();
        }
        info!(symbol = %symbol, interval = %self.config.interval, "Starting RSI check");

        let series = match self.acquirer.acquire(&self.request()).await {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Skipping RSI evaluation this cycle");
                if let Some(ref metrics) = self.metrics {
                    metrics.feed_unavailable_total.inc();
                }
                self.notify(&feed_unavailable_alert(symbol)).await;
                return Ok(CycleOutcome::FeedUnavailable);
            }
        };

        let rsi = calculate_rsi(series.closes(), self.config.rsi_period, self.config.rsi_method);
        if !rsi.value.is_finite() {
            return Err(CycleError::NonFiniteRsi {
                symbol: symbol.to_string(),
            });
        }

        if let Some(ref metrics) = self.metrics {
            metrics.last_rsi.set(rsi.value);
        }
        *self.last_rsi.write().await = Some(rsi.clone());

        let signal = SignalClass::from_rsi(rsi.value);
        info!(
            symbol = %symbol,
            rsi = rsi.value,
            method = %rsi.method,
            signal = %signal,
            "RSI computed"
        );

        let outcome = match signal_alert(symbol, signal, rsi.value, &Local::now()) {
            Some(message) => {
                let delivered = self.notify(&message).await;
                if delivered {
                    if let Some(ref metrics) = self.metrics {
                        metrics.alerts_sent_total.inc();
                    }
                }
                CycleOutcome::Alerted {
                    signal,
                    rsi: rsi.value,
                    delivered,
                }
            }
            None => {
                info!(symbol = %symbol, rsi = rsi.value, "RSI within normal range");
                CycleOutcome::Neutral { rsi: rsi.value }
            }
        };

        info!(
            symbol = %symbol,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "RSI check finished"
        );
        Ok(outcome)
    }

    /// Run a cycle and absorb any failure, including panics. Failures are
    /// logged and reported through a best-effort notification.
    pub async fn tick(&self) -> Option<CycleOutcome> {
        let error = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(Ok(outcome)) => return Some(outcome),
            Ok(Err(e)) => e,
            Err(panic) => CycleError::Panicked(panic_message(panic.as_ref())),
        };

        if let Some(ref metrics) = self.metrics {
            metrics.cycle_errors_total.inc();
        }
        error!(
            symbol = %self.config.symbol,
            error = %error,
            "Unexpected error during RSI check"
        );
        self.notify(&cycle_error_alert(&self.config.symbol)).await;
        None
    }

    /// Deliver a message; failures are logged and counted, never propagated
    async fn notify(&self, message: &str) -> bool {
        match self.notifier.send(message).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to deliver notification");
                if let Some(ref metrics) = self.metrics {
                    metrics.notifications_failed_total.inc();
                }
                false
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
