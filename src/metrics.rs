//! Prometheus metrics for the monitor

use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub cycles_total: IntCounter,
    pub cycle_errors_total: IntCounter,
    pub fetch_attempts_total: IntCounter,
    pub fetch_failures_total: IntCounter,
    pub feed_unavailable_total: IntCounter,
    pub alerts_sent_total: IntCounter,
    pub notifications_failed_total: IntCounter,
    pub proxy_refreshes_total: IntCounter,
    pub last_rsi: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_total = IntCounter::new("rsi_cycles_total", "Polling cycles started")?;
        let cycle_errors_total = IntCounter::new(
            "rsi_cycle_errors_total",
            "Polling cycles aborted by an unexpected error",
        )?;
        let fetch_attempts_total =
            IntCounter::new("rsi_fetch_attempts_total", "Kline fetch attempts")?;
        let fetch_failures_total =
            IntCounter::new("rsi_fetch_failures_total", "Failed kline fetch attempts")?;
        let feed_unavailable_total = IntCounter::new(
            "rsi_feed_unavailable_total",
            "Cycles where every fetch attempt failed",
        )?;
        let alerts_sent_total =
            IntCounter::new("rsi_alerts_sent_total", "Overbought/oversold alerts delivered")?;
        let notifications_failed_total = IntCounter::new(
            "rsi_notifications_failed_total",
            "Notifications that could not be delivered",
        )?;
        let proxy_refreshes_total =
            IntCounter::new("rsi_proxy_refreshes_total", "Proxy list refreshes")?;
        let last_rsi = Gauge::new("rsi_last_value", "Most recently computed RSI")?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycle_errors_total.clone()))?;
        registry.register(Box::new(fetch_attempts_total.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(feed_unavailable_total.clone()))?;
        registry.register(Box::new(alerts_sent_total.clone()))?;
        registry.register(Box::new(notifications_failed_total.clone()))?;
        registry.register(Box::new(proxy_refreshes_total.clone()))?;
        registry.register(Box::new(last_rsi.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycle_errors_total,
            fetch_attempts_total,
            fetch_failures_total,
            feed_unavailable_total,
            alerts_sent_total,
            notifications_failed_total,
            proxy_refreshes_total,
            last_rsi,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
