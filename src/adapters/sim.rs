//! Simulation adapters for paper trading and demos.
//!
//! The market feed is a seeded random walk: the same seed and symbol
//! always produce the same series, so paper runs are reproducible. The
//! paper broker fills instantly and keeps simple cash accounting. The
//! news feed emits canned headlines for a deterministic subset of symbols.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::bar::{Bar, MarketSession, Quote};
use crate::domain::news::NewsItem;
use crate::ports::broker::{
    AccountSnapshot, BrokerError, BrokerPort, OrderAck, OrderRequest, OrderStatus,
};
use crate::domain::position::Side;
use crate::ports::market_data::{MarketDataError, MarketDataPort};
use crate::ports::news::{NewsFeedError, NewsFeedPort};

fn symbol_seed(seed: u64, symbol: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    symbol.hash(&mut hasher);
    seed ^ hasher.finish()
}

/// Random-walk bar generator. Bars are five minutes apart, ending now.
#[derive(Debug, Clone)]
pub struct SimMarketData {
    seed: u64,
    /// Per-step drift, percent.
    drift_pct: f64,
    /// Per-step volatility, percent.
    volatility_pct: f64,
}

impl SimMarketData {
    pub fn new(seed: u64) -> Self {
        Self { seed, drift_pct: 0.02, volatility_pct: 0.4 }
    }

    fn walk(&self, symbol: &str, bars: usize, now: DateTime<Utc>) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(symbol_seed(self.seed, symbol));
        // Base price in the scanner's tradable band, fixed per symbol
        let mut price = 20.0 + rng.gen::<f64>() * 180.0;
        let mut out = Vec::with_capacity(bars);

        for i in 0..bars {
            let step = self.drift_pct / 100.0 + rng.gen_range(-1.0..1.0) * self.volatility_pct / 100.0;
            let open = price;
            let close = open * (1.0 + step);
            let spread = open.max(close) * rng.gen_range(0.0005..0.002);
            let volume = 500_000.0 + rng.gen::<f64>() * 1_500_000.0;
            out.push(Bar {
                timestamp: now - Duration::minutes((bars - i) as i64 * 5),
                open,
                high: open.max(close) + spread,
                low: open.min(close) - spread,
                close,
                volume,
            });
            price = close;
        }
        out
    }
}

#[async_trait]
impl MarketDataPort for SimMarketData {
    async fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, MarketDataError> {
        Ok(self.walk(symbol, limit, Utc::now()))
    }

    async fn last_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let bars = self.walk(symbol, 60, Utc::now());
        let last = bars.last().ok_or_else(|| MarketDataError::Unavailable(symbol.to_string()))?;
        Ok(Quote {
            symbol: symbol.to_string(),
            price: last.close,
            timestamp: Utc::now(),
        })
    }

    async fn health_check(&self) -> Result<(), MarketDataError> {
        Ok(())
    }
}

/// Paper broker: instant fills, simple cash accounting, no rejections.
#[derive(Debug, Clone)]
pub struct PaperBroker {
    cash: Arc<Mutex<f64>>,
    orders: Arc<Mutex<HashMap<String, OrderAck>>>,
    next_id: Arc<Mutex<u64>>,
    market_data: Option<Arc<SimMarketData>>,
}

impl PaperBroker {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            cash: Arc::new(Mutex::new(starting_cash)),
            orders: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            market_data: None,
        }
    }

    /// Fill market orders at the simulated last price instead of leaving
    /// the fill price empty.
    pub fn with_market_data(mut self, market_data: Arc<SimMarketData>) -> Self {
        self.market_data = Some(market_data);
        self
    }

    pub fn cash(&self) -> f64 {
        *self.cash.lock().unwrap()
    }

    async fn fill_price(&self, request: &OrderRequest) -> Option<f64> {
        if let Some(limit) = request.limit_price {
            return Some(limit);
        }
        match self.market_data {
            Some(ref md) => md.last_quote(&request.symbol).await.ok().map(|q| q.price),
            None => None,
        }
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, BrokerError> {
        let filled_price = self.fill_price(request).await;

        if let Some(price) = filled_price {
            let notional = price * request.quantity;
            let mut cash = self.cash.lock().unwrap();
            match request.side {
                Side::Long => *cash -= notional,
                Side::Short => *cash += notional,
            }
        }

        let order_id = {
            let mut id = self.next_id.lock().unwrap();
            let order_id = format!("paper-{}", *id);
            *id += 1;
            order_id
        };
        let ack = OrderAck {
            order_id: order_id.clone(),
            status: OrderStatus::Filled,
            filled_price,
            submitted_at: Utc::now(),
        };
        self.orders.lock().unwrap().insert(order_id, ack.clone());

        tracing::info!(
            symbol = %request.symbol,
            side = ?request.side,
            quantity = request.quantity,
            price = ?filled_price,
            "paper fill"
        );
        Ok(ack)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        match self.orders.lock().unwrap().get_mut(order_id) {
            Some(ack) => {
                ack.status = OrderStatus::Cancelled;
                Ok(())
            }
            None => Err(BrokerError::UnknownOrder(order_id.to_string())),
        }
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderAck, BrokerError> {
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| BrokerError::UnknownOrder(order_id.to_string()))
    }

    async fn account(&self) -> Result<AccountSnapshot, BrokerError> {
        let cash = *self.cash.lock().unwrap();
        Ok(AccountSnapshot { equity: cash, buying_power: cash })
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

const SIM_HEADLINES: &[(&str, bool)] = &[
    ("{SYM} earnings beat estimates, raises full-year outlook", false),
    ("{SYM} announces acquisition talks with strategic partner", false),
    ("BREAKING: FDA approval granted for {SYM} lead candidate", true),
    ("Analyst upgrade lifts {SYM} price target", false),
    ("{SYM} misses on revenue, cuts guidance", false),
    ("{SYM} unveils new product line at annual event", false),
];

/// Canned news feed. Roughly a third of symbols get headlines, chosen
/// deterministically from the seed.
#[derive(Debug, Clone)]
pub struct SimNewsFeed {
    seed: u64,
    utc_offset_hours: i64,
}

impl SimNewsFeed {
    pub fn new(seed: u64, utc_offset_hours: i64) -> Self {
        Self { seed, utc_offset_hours }
    }
}

#[async_trait]
impl NewsFeedPort for SimNewsFeed {
    async fn recent_news(&self, symbol: &str, window_hours: i64) -> Result<Vec<NewsItem>, NewsFeedError> {
        let mut rng = StdRng::seed_from_u64(symbol_seed(self.seed, symbol));
        if rng.gen::<f64>() > 0.35 {
            return Ok(Vec::new());
        }

        let count = rng.gen_range(1..=3usize);
        let now = Utc::now();
        let items = (0..count)
            .map(|_| {
                let (template, breaking) = SIM_HEADLINES[rng.gen_range(0..SIM_HEADLINES.len())];
                let age_minutes = rng.gen_range(10..window_hours.max(1) * 60);
                let published_at = now - Duration::minutes(age_minutes);
                NewsItem {
                    symbol: symbol.to_string(),
                    headline: template.replace("{SYM}", symbol),
                    source: "sim".to_string(),
                    published_at,
                    is_breaking: breaking,
                    session: MarketSession::at(published_at, self.utc_offset_hours),
                }
            })
            .collect();
        Ok(items)
    }

    async fn health_check(&self) -> Result<(), NewsFeedError> {
        Ok(())
    }
}
