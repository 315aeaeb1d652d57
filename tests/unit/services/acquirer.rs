//! Unit tests for feed acquisition retries

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use rsiwatch::error::{AcquireError, FeedError};
use rsiwatch::metrics::Metrics;
use rsiwatch::models::market::KlineRequest;
use rsiwatch::services::acquirer::{FeedAcquirer, RetryPolicy};
use tokio_test::{assert_err, assert_ok};

use crate::fakes::{klines_from_closes, rising, RecordingSleeper, ScriptedFeed, StaticProxySource};

fn request() -> KlineRequest {
    KlineRequest::new("BTCUSDT", "1m", 100)
}

fn acquirer(feed: &Arc<ScriptedFeed>, sleeper: &Arc<RecordingSleeper>, attempts: u32) -> FeedAcquirer {
    FeedAcquirer::new(
        feed.clone(),
        sleeper.clone(),
        RetryPolicy::new(attempts, Duration::from_secs(5)),
    )
}

#[test]
fn test_linear_backoff_schedule() {
    let delays: Vec<Duration> = RetryPolicy::new(4, Duration::from_secs(5))
        .backoff()
        .build()
        .collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_secs(15)
        ]
    );
}

#[test]
fn test_single_attempt_has_no_backoff() {
    let delays: Vec<Duration> = RetryPolicy::new(1, Duration::from_secs(5))
        .backoff()
        .build()
        .collect();
    assert!(delays.is_empty());
}

#[test]
fn test_policy_requires_one_attempt() {
    assert_eq!(RetryPolicy::new(0, Duration::from_secs(5)).max_attempts, 1);
}

#[tokio::test]
async fn test_always_failing_feed_exhausts_attempts() {
    let feed = Arc::new(ScriptedFeed::always_failing());
    let sleeper = Arc::new(RecordingSleeper::default());

    let result = acquirer(&feed, &sleeper, 3).acquire(&request()).await;

    let err = assert_err!(result);
    assert_eq!(feed.calls(), 3);
    assert_eq!(
        sleeper.sleeps(),
        vec![Duration::from_secs(5), Duration::from_secs(10)]
    );
    match err {
        AcquireError::FeedUnavailable {
            symbol,
            attempts,
            source,
        } => {
            assert_eq!(symbol, "BTCUSDT");
            assert_eq!(attempts, 3);
            assert!(matches!(source, FeedError::Transport(_)));
        }
    }
}

#[tokio::test]
async fn test_success_on_second_attempt_stops_retrying() {
    let closes = rising(20);
    let feed = Arc::new(ScriptedFeed::new(vec![
        Err(FeedError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }),
        Ok(klines_from_closes(&closes)),
        Ok(klines_from_closes(&[1.0, 2.0])),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());

    let series = assert_ok!(acquirer(&feed, &sleeper, 3).acquire(&request()).await);

    assert_eq!(feed.calls(), 2);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(5)]);
    assert_eq!(series.closes(), closes.as_slice());
    assert_eq!(series.symbol(), "BTCUSDT");
}

#[tokio::test]
async fn test_fewer_than_two_klines_is_a_failed_fetch() {
    let feed = Arc::new(ScriptedFeed::new(vec![
        Ok(klines_from_closes(&[100.0])),
        Ok(Vec::new()),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = assert_err!(acquirer(&feed, &sleeper, 2).acquire(&request()).await);

    assert_eq!(feed.calls(), 2);
    let AcquireError::FeedUnavailable { source, .. } = err;
    assert_eq!(source, FeedError::InsufficientData { received: 0 });
}

#[tokio::test]
async fn test_single_attempt_never_sleeps() {
    let feed = Arc::new(ScriptedFeed::always_failing());
    let sleeper = Arc::new(RecordingSleeper::default());

    assert_err!(acquirer(&feed, &sleeper, 1).acquire(&request()).await);

    assert_eq!(feed.calls(), 1);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_request_is_forwarded_unchanged() {
    let feed = Arc::new(ScriptedFeed::with_closes(&rising(5)));
    let sleeper = Arc::new(RecordingSleeper::default());

    assert_ok!(acquirer(&feed, &sleeper, 3).acquire(&request()).await);

    assert_eq!(feed.last_request(), Some(request()));
}

#[tokio::test]
async fn test_proxy_from_source_is_used_each_attempt() {
    let feed = Arc::new(ScriptedFeed::new(vec![
        Err(FeedError::Transport("timeout".to_string())),
        Ok(klines_from_closes(&rising(5))),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let proxy = "http://10.0.0.1:8080".to_string();

    let acquirer = acquirer(&feed, &sleeper, 3)
        .with_proxies(Arc::new(StaticProxySource(Some(proxy.clone()))));
    assert_ok!(acquirer.acquire(&request()).await);

    assert_eq!(feed.proxies_seen(), vec![Some(proxy.clone()), Some(proxy)]);
}

#[tokio::test]
async fn test_missing_proxy_goes_direct() {
    let feed = Arc::new(ScriptedFeed::with_closes(&rising(5)));
    let sleeper = Arc::new(RecordingSleeper::default());

    let acquirer = acquirer(&feed, &sleeper, 3).with_proxies(Arc::new(StaticProxySource(None)));
    assert_ok!(acquirer.acquire(&request()).await);

    assert_eq!(feed.proxies_seen(), vec![None]);
}

#[tokio::test]
async fn test_attempts_are_counted_in_metrics() {
    let feed = Arc::new(ScriptedFeed::always_failing());
    let sleeper = Arc::new(RecordingSleeper::default());
    let metrics = Arc::new(Metrics::new().expect("metrics"));

    let acquirer = acquirer(&feed, &sleeper, 3).with_metrics(metrics.clone());
    assert_err!(acquirer.acquire(&request()).await);

    assert_eq!(metrics.fetch_attempts_total.get(), 3);
    assert_eq!(metrics.fetch_failures_total.get(), 3);
}

#[tokio::test]
async fn test_acquire_runs_on_spawned_task() {
    let feed = Arc::new(ScriptedFeed::new(vec![
        Err(FeedError::Transport("connection reset".to_string())),
        Ok(klines_from_closes(&rising(20))),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let acquirer = Arc::new(acquirer(&feed, &sleeper, 3));

    let result = tokio::spawn(async move { acquirer.acquire(&request()).await })
        .await
        .unwrap();

    assert_ok!(result);
    assert_eq!(feed.calls(), 2);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(5)]);
}
