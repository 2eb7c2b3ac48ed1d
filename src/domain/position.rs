//! Trade lifecycle: pending order through monitored position to close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::signal::SignalType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_signal(signal_type: SignalType) -> Option<Self> {
        match signal_type {
            SignalType::Buy => Some(Side::Long),
            SignalType::Sell => Some(Side::Short),
            SignalType::Hold => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Pending,
    Open,
    Closing,
    Closed,
}

/// Why a position was exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    Target1,
    Target2,
    TimeStop,
    TrailingStop,
    Manual,
    /// Flattened at the end of the trading day.
    CycleEnd,
}

#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    #[error("Trade is already closed")]
    AlreadyClosed,
    #[error("Trade is not open yet")]
    NotOpen,
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(f64),
    #[error("Invalid entry price: {0}")]
    InvalidEntryPrice(f64),
}

/// A live trade tied to the signal that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub signal_id: String,
    pub symbol: String,
    pub side: Side,
    pub status: PositionStatus,
    pub quantity: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target_1: f64,
    pub target_2: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    pub exit_reason: Option<ExitReason>,
    /// Best price seen since entry, for trailing-stop bookkeeping.
    pub high_water_mark: f64,
    /// Set once target 1 has been touched; partial exits fire at most once.
    pub target_1_hit: bool,
    pub last_price: f64,
}

impl Trade {
    pub fn new(
        id: String,
        signal_id: String,
        symbol: String,
        side: Side,
        quantity: f64,
        entry_price: f64,
        stop_loss: f64,
        target_1: f64,
        target_2: f64,
    ) -> Result<Self, TradeError> {
        if quantity < 1.0 {
            return Err(TradeError::InvalidQuantity(quantity));
        }
        if entry_price <= 0.0 {
            return Err(TradeError::InvalidEntryPrice(entry_price));
        }

        Ok(Self {
            id,
            signal_id,
            symbol,
            side,
            status: PositionStatus::Pending,
            quantity,
            entry_price,
            stop_loss,
            target_1,
            target_2,
            opened_at: Utc::now(),
            closed_at: None,
            exit_price: None,
            exit_reason: None,
            high_water_mark: entry_price,
            target_1_hit: false,
            last_price: entry_price,
        })
    }

    /// Mark the pending order as filled.
    pub fn mark_open(&mut self, fill_price: f64) -> Result<(), TradeError> {
        match self.status {
            PositionStatus::Pending => {
                self.status = PositionStatus::Open;
                self.entry_price = fill_price;
                self.high_water_mark = fill_price;
                self.last_price = fill_price;
                self.opened_at = Utc::now();
                Ok(())
            }
            PositionStatus::Closed => Err(TradeError::AlreadyClosed),
            _ => Ok(()),
        }
    }

    /// Update mark price and the high-water mark. No-op unless open.
    pub fn mark_price(&mut self, price: f64) {
        if self.status != PositionStatus::Open {
            return;
        }
        self.last_price = price;
        let improved = match self.side {
            Side::Long => price > self.high_water_mark,
            Side::Short => price < self.high_water_mark,
        };
        if improved {
            self.high_water_mark = price;
        }
    }

    /// Begin closing. Idempotent across monitor ticks: a second call while
    /// `Closing` is an error the caller treats as already-in-flight.
    pub fn begin_close(&mut self, reason: ExitReason) -> Result<(), TradeError> {
        match self.status {
            PositionStatus::Open => {
                self.status = PositionStatus::Closing;
                self.exit_reason = Some(reason);
                Ok(())
            }
            PositionStatus::Closed | PositionStatus::Closing => Err(TradeError::AlreadyClosed),
            PositionStatus::Pending => Err(TradeError::NotOpen),
        }
    }

    pub fn finalize_close(&mut self, exit_price: f64) -> Result<(), TradeError> {
        if self.status == PositionStatus::Closed {
            return Err(TradeError::AlreadyClosed);
        }
        self.status = PositionStatus::Closed;
        self.exit_price = Some(exit_price);
        self.closed_at = Some(Utc::now());
        Ok(())
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => (price - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - price) * self.quantity,
        }
    }

    pub fn realized_pnl(&self) -> Option<f64> {
        self.exit_price.map(|exit| match self.side {
            Side::Long => (exit - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - exit) * self.quantity,
        })
    }

    pub fn holding_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.opened_at).num_minutes()
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}
