//! Integration tests for the Binance REST client and acquisition against a mock feed

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rsiwatch::core::clock::Sleeper;
use rsiwatch::error::{AcquireError, FeedError};
use rsiwatch::models::market::KlineRequest;
use rsiwatch::services::acquirer::{FeedAcquirer, RetryPolicy};
use rsiwatch::services::binance::BinanceRestClient;
use rsiwatch::services::market_data::PriceFeed;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::{kline_rows, API_KEY};

#[derive(Default)]
struct InstantSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait::async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn client(server: &MockServer) -> BinanceRestClient {
    BinanceRestClient::with_client(
        server.uri(),
        API_KEY,
        Duration::from_secs(5),
        reqwest::Client::new(),
    )
}

fn request() -> KlineRequest {
    KlineRequest::new("BTCUSDT", "1m", 3)
}

#[tokio::test]
async fn fetches_and_parses_klines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "1m"))
        .and(query_param("limit", "3"))
        .and(header("X-MBX-APIKEY", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_rows(&[
            42000.5, 42010.0, 41990.25,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let klines = client(&server).fetch_klines(&request(), None).await.unwrap();

    let closes: Vec<f64> = klines.iter().map(|k| k.close).collect();
    assert_eq!(closes, vec![42000.5, 42010.0, 41990.25]);
}

#[tokio::test]
async fn non_success_status_is_reported_distinctly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_klines(&request(), None).await.unwrap_err();

    assert_eq!(
        err,
        FeedError::Status {
            status: 429,
            body: "Too many requests".to_string()
        }
    );
}

#[tokio::test]
async fn empty_result_is_not_an_error_at_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let klines = client(&server).fetch_klines(&request(), None).await.unwrap();
    assert!(klines.is_empty());
}

#[tokio::test]
async fn acquirer_recovers_after_transient_outage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_rows(&[1.0, 2.0, 3.0])))
        .with_priority(2)
        .mount(&server)
        .await;

    let sleeper = Arc::new(InstantSleeper::default());
    let acquirer = FeedAcquirer::new(
        Arc::new(client(&server)),
        sleeper.clone(),
        RetryPolicy::new(3, Duration::from_secs(5)),
    );

    let series = acquirer.acquire(&request()).await.unwrap();

    assert_eq!(series.closes(), &[1.0, 2.0, 3.0]);
    assert_eq!(
        *sleeper.sleeps.lock().unwrap(),
        vec![Duration::from_secs(5), Duration::from_secs(10)]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn acquirer_gives_up_on_persistent_outage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let acquirer = FeedAcquirer::new(
        Arc::new(client(&server)),
        Arc::new(InstantSleeper::default()),
        RetryPolicy::new(3, Duration::from_secs(5)),
    );

    let err = acquirer.acquire(&request()).await.unwrap_err();

    let AcquireError::FeedUnavailable { attempts, source, .. } = err;
    assert_eq!(attempts, 3);
    assert!(matches!(source, FeedError::Status { status: 500, .. }));
}
