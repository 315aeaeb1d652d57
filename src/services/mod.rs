//! External collaborators: price feed, proxies, notifications.

pub mod acquirer;
pub mod binance;
pub mod market_data;
pub mod notifier;
pub mod proxy;

pub use acquirer::{FeedAcquirer, RetryPolicy};
pub use binance::BinanceRestClient;
pub use market_data::PriceFeed;
pub use notifier::{LineNotifier, Notifier};
pub use proxy::{ProxyPool, ProxySource};
