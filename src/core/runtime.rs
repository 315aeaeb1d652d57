//! Wires configuration into a ready-to-run monitor

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::core::clock::{Sleeper, TokioSleeper};
use crate::core::cycle::RsiMonitor;
use crate::core::scheduler::PollScheduler;
use crate::metrics::Metrics;
use crate::services::acquirer::{FeedAcquirer, RetryPolicy};
use crate::services::binance::BinanceRestClient;
use crate::services::notifier::LineNotifier;
use crate::services::proxy::ProxyPool;

/// Everything the binary needs, built from one [`Config`]
pub struct MonitorRuntime {
    pub monitor: Arc<RsiMonitor>,
    pub scheduler: PollScheduler,
    pub metrics: Arc<Metrics>,
}

impl MonitorRuntime {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let metrics = Arc::new(Metrics::new()?);
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);

        let feed = Arc::new(BinanceRestClient::new(&config.binance, config.http_timeout)?);
        let policy = RetryPolicy::new(config.monitor.max_retries, config.monitor.backoff_base);
        let mut acquirer =
            FeedAcquirer::new(feed, sleeper.clone(), policy).with_metrics(metrics.clone());

        match config.proxy {
            Some(ref proxy_config) => {
                info!(list_url = %proxy_config.list_url, "Proxy rotation enabled");
                let pool = ProxyPool::from_config(proxy_config, config.http_timeout)?
                    .with_metrics(metrics.clone());
                acquirer = acquirer.with_proxies(Arc::new(pool));
            }
            None => info!("Proxy rotation disabled, fetching directly"),
        }

        let notifier = Arc::new(LineNotifier::new(&config.line, config.http_timeout)?);

        let monitor = Arc::new(
            RsiMonitor::new(config.monitor.clone(), acquirer, notifier).with_metrics(metrics.clone()),
        );
        let scheduler = PollScheduler::new(monitor.clone(), config.monitor.poll_interval, sleeper);

        Ok(Self {
            monitor,
            scheduler,
            metrics,
        })
    }
}
