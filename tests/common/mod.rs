#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::Cell;
use std::io::Write;
use tradejournal::adapters::memory_adapter::MemoryStorageAdapter;
use tradejournal::domain::error::JournalError;
use tradejournal::domain::strategy::{StrategyInput, StrategyType};
use tradejournal::domain::trade::{Direction, TradeInput};
use tradejournal::ports::storage_port::StoragePort;

/// Wraps a memory adapter and fails every write once `fail_writes` is set.
pub struct FailingStoragePort {
    pub inner: MemoryStorageAdapter,
    pub fail_writes: Cell<bool>,
}

impl FailingStoragePort {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorageAdapter::new(),
            fail_writes: Cell::new(false),
        }
    }
}

impl StoragePort for FailingStoragePort {
    fn read(&self, key: &str) -> Result<Option<String>, JournalError> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), JournalError> {
        if self.fail_writes.get() {
            return Err(JournalError::Storage {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.inner.write(key, payload)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn trade_input(direction: Direction, entry: f64, stop_loss: f64, exit: f64) -> TradeInput {
    TradeInput {
        date: date(2024, 3, 1),
        pair: "EUR/USD".to_string(),
        lot: 1.0,
        direction,
        entry,
        stop_loss,
        take_profit: entry + (entry - stop_loss) * 2.0,
        exit,
        holding_time: Some(60),
        entry_logic: None,
        exit_logic: None,
        strategy: None,
        time_frame: None,
        risk: None,
        rules: None,
        notes: None,
    }
}

/// A long trade risking 1.0 per unit that closes at `entry + pnl`.
pub fn long_with_pnl(pnl: f64) -> TradeInput {
    trade_input(Direction::Long, 100.0, 99.0, 100.0 + pnl)
}

pub fn with_strategy(mut input: TradeInput, strategy: &str) -> TradeInput {
    input.strategy = Some(strategy.to_string());
    input
}

pub fn breakout_strategy() -> StrategyInput {
    let mut input = StrategyInput::new("London Breakout", StrategyType::Breakout);
    input.instruments = vec!["EUR/USD".to_string(), "GBP/USD".to_string()];
    input.entry_rules = vec!["Break of Asian range high".to_string()];
    input.exit_rules = vec!["Close at NY open".to_string()];
    input
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
