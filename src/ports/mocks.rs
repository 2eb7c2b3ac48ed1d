//! Recording mocks for the three ports. Test-support only, but compiled
//! into the crate so integration tests can share them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::bar::{Bar, Quote};
use crate::domain::news::NewsItem;
use crate::ports::broker::{
    AccountSnapshot, BrokerError, BrokerPort, OrderAck, OrderRequest, OrderStatus,
};
use crate::ports::market_data::{MarketDataError, MarketDataPort};
use crate::ports::news::{NewsFeedError, NewsFeedPort};

/// Mock market data port that records calls and serves canned bars/quotes.
#[derive(Debug, Default, Clone)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<String>>>,
    bars: Arc<Mutex<HashMap<String, Vec<Bar>>>>,
    quotes: Arc<Mutex<HashMap<String, f64>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.lock().unwrap().insert(symbol.to_string(), bars);
        self
    }

    pub fn with_quote(self, symbol: &str, price: f64) -> Self {
        self.quotes.lock().unwrap().insert(symbol.to_string(), price);
        self
    }

    /// Change a quote after construction, for monitor-loop tests.
    pub fn set_quote(&self, symbol: &str, price: f64) {
        self.quotes.lock().unwrap().insert(symbol.to_string(), price);
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, MarketDataError> {
        self.calls.lock().unwrap().push(format!("bars:{}", symbol));
        if *self.fail.lock().unwrap() {
            return Err(MarketDataError::RestError("mock failure".into()));
        }
        let bars = self
            .bars
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::Unavailable(symbol.to_string()))?;
        let start = bars.len().saturating_sub(limit);
        Ok(bars[start..].to_vec())
    }

    async fn last_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.calls.lock().unwrap().push(format!("quote:{}", symbol));
        if *self.fail.lock().unwrap() {
            return Err(MarketDataError::RestError("mock failure".into()));
        }
        let price = self
            .quotes
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| MarketDataError::Unavailable(symbol.to_string()))?;
        Ok(Quote { symbol: symbol.to_string(), price, timestamp: Utc::now() })
    }

    async fn health_check(&self) -> Result<(), MarketDataError> {
        if *self.fail.lock().unwrap() {
            Err(MarketDataError::RestError("mock failure".into()))
        } else {
            Ok(())
        }
    }
}

/// Mock news feed with canned items per symbol.
#[derive(Debug, Default, Clone)]
pub struct MockNewsFeed {
    calls: Arc<Mutex<Vec<String>>>,
    items: Arc<Mutex<HashMap<String, Vec<NewsItem>>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockNewsFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, symbol: &str, items: Vec<NewsItem>) -> Self {
        self.items.lock().unwrap().insert(symbol.to_string(), items);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsFeedPort for MockNewsFeed {
    async fn recent_news(&self, symbol: &str, _window_hours: i64) -> Result<Vec<NewsItem>, NewsFeedError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        if *self.fail.lock().unwrap() {
            return Err(NewsFeedError::RestError("mock failure".into()));
        }
        Ok(self.items.lock().unwrap().get(symbol).cloned().unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), NewsFeedError> {
        if *self.fail.lock().unwrap() {
            Err(NewsFeedError::RestError("mock failure".into()))
        } else {
            Ok(())
        }
    }
}

/// Mock broker recording submitted orders, filling them immediately.
#[derive(Debug, Clone)]
pub struct MockBroker {
    orders: Arc<Mutex<Vec<OrderRequest>>>,
    cancellations: Arc<Mutex<Vec<String>>>,
    buying_power: Arc<Mutex<f64>>,
    equity: Arc<Mutex<f64>>,
    reject_next: Arc<Mutex<bool>>,
    next_id: Arc<Mutex<u64>>,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self {
            orders: Arc::new(Mutex::new(Vec::new())),
            cancellations: Arc::new(Mutex::new(Vec::new())),
            buying_power: Arc::new(Mutex::new(100_000.0)),
            equity: Arc::new(Mutex::new(100_000.0)),
            reject_next: Arc::new(Mutex::new(false)),
            next_id: Arc::new(Mutex::new(1)),
        }
    }
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buying_power(self, amount: f64) -> Self {
        *self.buying_power.lock().unwrap() = amount;
        *self.equity.lock().unwrap() = amount;
        self
    }

    pub fn reject_next_order(&self) {
        *self.reject_next.lock().unwrap() = true;
    }

    pub fn submitted_orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn cancelled_orders(&self) -> Vec<String> {
        self.cancellations.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrokerPort for MockBroker {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, BrokerError> {
        if std::mem::take(&mut *self.reject_next.lock().unwrap()) {
            return Err(BrokerError::Rejected("mock rejection".into()));
        }
        self.orders.lock().unwrap().push(request.clone());
        let mut id = self.next_id.lock().unwrap();
        let order_id = format!("mock-{}", *id);
        *id += 1;
        Ok(OrderAck {
            order_id,
            status: OrderStatus::Filled,
            filled_price: request.limit_price,
            submitted_at: Utc::now(),
        })
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        self.cancellations.lock().unwrap().push(order_id.to_string());
        Ok(())
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderAck, BrokerError> {
        Ok(OrderAck {
            order_id: order_id.to_string(),
            status: OrderStatus::Filled,
            filled_price: None,
            submitted_at: Utc::now(),
        })
    }

    async fn account(&self) -> Result<AccountSnapshot, BrokerError> {
        Ok(AccountSnapshot {
            equity: *self.equity.lock().unwrap(),
            buying_power: *self.buying_power.lock().unwrap(),
        })
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Side;

    #[tokio::test]
    async fn test_mock_market_data_records_calls() {
        let mock = MockMarketData::new().with_quote("AAPL", 150.0);

        let quote = mock.last_quote("AAPL").await.unwrap();
        assert_eq!(quote.price, 150.0);
        assert_eq!(mock.get_calls(), vec!["quote:AAPL".to_string()]);

        assert!(matches!(
            mock.last_quote("MSFT").await,
            Err(MarketDataError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_broker_fills_and_records() {
        let mock = MockBroker::new();
        let request = OrderRequest::market("AAPL", Side::Long, 10.0);

        let ack = mock.submit_order(&request).await.unwrap();
        assert_eq!(ack.status, OrderStatus::Filled);
        assert_eq!(mock.submitted_orders().len(), 1);
        assert_eq!(mock.submitted_orders()[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_mock_broker_rejection() {
        let mock = MockBroker::new();
        mock.reject_next_order();
        let request = OrderRequest::market("AAPL", Side::Long, 10.0);
        assert!(mock.submit_order(&request).await.is_err());
        // Rejection is one-shot
        assert!(mock.submit_order(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_news_feed_empty_default() {
        let mock = MockNewsFeed::new();
        let items = mock.recent_news("AAPL", 24).await.unwrap();
        assert!(items.is_empty());
    }
}
