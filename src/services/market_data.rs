//! Market data provider interface.

use crate::error::FeedError;
use crate::models::market::{Kline, KlineRequest};

#[async_trait::async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the most recent closed klines for a symbol, oldest first.
    /// `proxy` routes the call through an outbound HTTP proxy when set.
    async fn fetch_klines(
        &self,
        request: &KlineRequest,
        proxy: Option<&str>,
    ) -> Result<Vec<Kline>, FeedError>;
}
