//! The trade journal and strategy library: record lifecycle plus the
//! statistics view, behind one call per user action.

use log::{info, warn};

use super::error::JournalError;
use super::id::IdGenerator;
use super::record_store::{Record, RecordStore};
use super::statistics::{
    DrawdownMethod, EquityPoint, Statistics, StrategyBreakdown, equity_curve,
};
use super::strategy::{Strategy, StrategyInput};
use super::trade::{HoldingTimePolicy, Trade, TradeInput};
use crate::ports::storage_port::StoragePort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalSettings {
    pub drawdown: DrawdownMethod,
    pub holding_time: HoldingTimePolicy,
}

/// Reads the persisted trades without keeping a journal open.
pub fn load_trades(port: &dyn StoragePort) -> Vec<Trade> {
    RecordStore::<Trade>::load(port).records().to_vec()
}

/// Reads the persisted strategies without keeping a library open.
pub fn load_strategies(port: &dyn StoragePort) -> Vec<Strategy> {
    RecordStore::<Strategy>::load(port).records().to_vec()
}

fn seeded_ids<T: Record>(store: &RecordStore<'_, T>) -> IdGenerator {
    let ids = IdGenerator::new();
    for record in store.records() {
        if let Some(id) = record.record_id() {
            ids.observe(id);
        }
    }
    ids
}

pub struct TradeJournal<'a> {
    store: RecordStore<'a, Trade>,
    ids: IdGenerator,
    settings: JournalSettings,
}

impl<'a> TradeJournal<'a> {
    pub fn load(port: &'a dyn StoragePort, settings: JournalSettings) -> Self {
        let store = RecordStore::load(port);
        let ids = seeded_ids(&store);
        Self {
            store,
            ids,
            settings,
        }
    }

    pub fn trades(&self) -> &[Trade] {
        self.store.records()
    }

    pub fn get(&self, id: &str) -> Option<&Trade> {
        self.store.get(id)
    }

    pub fn settings(&self) -> JournalSettings {
        self.settings
    }

    /// Derives the computed fields, assigns an id, and appends the trade.
    pub fn create_trade(&mut self, input: TradeInput) -> Result<Trade, JournalError> {
        let trade = Trade::from_input(input, self.ids.next_id(), self.settings.holding_time)?;
        self.store.append(trade.clone())?;
        info!(
            "logged trade {} {} {} P/L {:.5}",
            trade.id, trade.pair, trade.direction, trade.profit_loss
        );
        Ok(trade)
    }

    pub fn delete_trade(&mut self, id: &str) -> Result<bool, JournalError> {
        let removed = self.store.remove(id)?;
        if removed {
            info!("deleted trade {}", id);
        } else {
            warn!("delete requested for unknown trade {}", id);
        }
        Ok(removed)
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::compute(self.trades(), self.settings.drawdown)
    }

    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        equity_curve(self.trades())
    }

    pub fn strategy_breakdown(&self) -> Vec<StrategyBreakdown> {
        StrategyBreakdown::compute_per_strategy(self.trades())
    }
}

pub struct StrategyLibrary<'a> {
    store: RecordStore<'a, Strategy>,
    ids: IdGenerator,
}

impl<'a> StrategyLibrary<'a> {
    pub fn load(port: &'a dyn StoragePort) -> Self {
        let store = RecordStore::load(port);
        let ids = seeded_ids(&store);
        Self { store, ids }
    }

    pub fn strategies(&self) -> &[Strategy] {
        self.store.records()
    }

    pub fn get(&self, id: &str) -> Option<&Strategy> {
        self.store.get(id)
    }

    /// Creates a strategy when `existing_id` is `None`; otherwise replaces
    /// the stored strategy with that id in place, keeping the id.
    pub fn create_or_update_strategy(
        &mut self,
        input: StrategyInput,
        existing_id: Option<&str>,
    ) -> Result<Strategy, JournalError> {
        match existing_id {
            None => {
                let strategy = Strategy::from_input(input, self.ids.next_id())?;
                self.store.append(strategy.clone())?;
                info!("created strategy '{}'", strategy.name);
                Ok(strategy)
            }
            Some(id) => {
                let strategy = Strategy::from_input(input, id.to_string())?;
                if !self.store.replace(id, strategy.clone())? {
                    return Err(JournalError::NotFound {
                        kind: "strategy".into(),
                        id: id.to_string(),
                    });
                }
                info!("updated strategy '{}' ({})", strategy.name, id);
                Ok(strategy)
            }
        }
    }

    pub fn delete_strategy(&mut self, id: &str) -> Result<bool, JournalError> {
        let removed = self.store.remove(id)?;
        if removed {
            info!("deleted strategy {}", id);
        } else {
            warn!("delete requested for unknown strategy {}", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_adapter::MemoryStorageAdapter;
    use crate::domain::strategy::StrategyType;
    use crate::domain::trade::Direction;
    use chrono::NaiveDate;

    fn trade_input(entry: f64, stop_loss: f64, exit: f64) -> TradeInput {
        TradeInput {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            pair: "EUR/USD".into(),
            lot: 0.1,
            direction: Direction::Long,
            entry,
            stop_loss,
            take_profit: exit,
            exit,
            holding_time: Some(45),
            entry_logic: None,
            exit_logic: None,
            strategy: None,
            time_frame: None,
            risk: None,
            rules: None,
            notes: None,
        }
    }

    fn strategy_input(name: &str) -> StrategyInput {
        let mut input = StrategyInput::new(name, StrategyType::Swing);
        input.instruments = vec!["US30".into()];
        input
    }

    #[test]
    fn create_trade_appends_and_persists() {
        let port = MemoryStorageAdapter::new();
        let mut journal = TradeJournal::load(&port, JournalSettings::default());

        let trade = journal.create_trade(trade_input(100.0, 90.0, 120.0)).unwrap();

        assert_eq!(journal.trades().len(), 1);
        assert_eq!(load_trades(&port), vec![trade]);
    }

    #[test]
    fn trade_ids_are_unique() {
        let port = MemoryStorageAdapter::new();
        let mut journal = TradeJournal::load(&port, JournalSettings::default());
        let a = journal.create_trade(trade_input(1.0, 0.9, 1.1)).unwrap();
        let b = journal.create_trade(trade_input(1.0, 0.9, 1.2)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn reopened_journal_ids_follow_existing() {
        let port = MemoryStorageAdapter::new();
        let first_id = {
            let mut journal = TradeJournal::load(&port, JournalSettings::default());
            journal.create_trade(trade_input(1.0, 0.9, 1.1)).unwrap().id
        };
        let mut journal = TradeJournal::load(&port, JournalSettings::default());
        let second_id = journal.create_trade(trade_input(1.0, 0.9, 1.1)).unwrap().id;

        assert!(second_id.parse::<i64>().unwrap() > first_id.parse::<i64>().unwrap());
    }

    #[test]
    fn invalid_trade_is_not_stored() {
        let port = MemoryStorageAdapter::new();
        let mut journal = TradeJournal::load(&port, JournalSettings::default());
        let mut input = trade_input(1.0, 0.9, 1.1);
        input.lot = -1.0;

        assert!(journal.create_trade(input).is_err());
        assert!(journal.trades().is_empty());
        assert_eq!(port.read("trades").unwrap(), None);
    }

    #[test]
    fn statistics_follow_mutations() {
        let port = MemoryStorageAdapter::new();
        let mut journal = TradeJournal::load(&port, JournalSettings::default());
        assert_eq!(journal.statistics(), Statistics::default());

        let win = journal.create_trade(trade_input(100.0, 90.0, 120.0)).unwrap();
        journal.create_trade(trade_input(100.0, 90.0, 95.0)).unwrap();
        let stats = journal.statistics();
        assert_eq!((stats.wins, stats.losses), (1, 1));

        assert!(journal.delete_trade(&win.id).unwrap());
        let stats = journal.statistics();
        assert_eq!((stats.total_trades, stats.wins), (1, 0));
    }

    #[test]
    fn settings_choose_drawdown_method() {
        let port = MemoryStorageAdapter::new();
        let settings = JournalSettings {
            drawdown: DrawdownMethod::RollingPair,
            holding_time: HoldingTimePolicy::Explicit,
        };
        let mut journal = TradeJournal::load(&port, settings);
        journal.create_trade(trade_input(100.0, 90.0, 200.0)).unwrap();
        journal.create_trade(trade_input(100.0, 90.0, 50.0)).unwrap();
        journal.create_trade(trade_input(100.0, 90.0, 130.0)).unwrap();

        assert!((journal.statistics().max_drawdown - 120.0).abs() < 1e-9);
    }

    #[test]
    fn create_then_update_strategy_keeps_id() {
        let port = MemoryStorageAdapter::new();
        let mut library = StrategyLibrary::load(&port);
        let created = library
            .create_or_update_strategy(strategy_input("Swing H4"), None)
            .unwrap();
        let id = created.id.clone().unwrap();

        let mut edit = strategy_input("Swing H4 v2");
        edit.tags = Some(vec!["trend".into()]);
        let updated = library.create_or_update_strategy(edit, Some(&id)).unwrap();

        assert_eq!(updated.id.as_deref(), Some(id.as_str()));
        assert_eq!(library.strategies().len(), 1);
        assert_eq!(load_strategies(&port)[0].name, "Swing H4 v2");
    }

    #[test]
    fn update_unknown_strategy_is_not_found() {
        let port = MemoryStorageAdapter::new();
        let mut library = StrategyLibrary::load(&port);
        let err = library
            .create_or_update_strategy(strategy_input("Ghost"), Some("123"))
            .unwrap_err();
        assert!(matches!(err, JournalError::NotFound { .. }));
        assert!(library.strategies().is_empty());
    }

    #[test]
    fn delete_strategy_by_id() {
        let port = MemoryStorageAdapter::new();
        let mut library = StrategyLibrary::load(&port);
        let a = library.create_or_update_strategy(strategy_input("A"), None).unwrap();
        library.create_or_update_strategy(strategy_input("B"), None).unwrap();

        assert!(library.delete_strategy(a.id.as_deref().unwrap()).unwrap());
        assert!(!library.delete_strategy("missing").unwrap());
        assert_eq!(load_strategies(&port).len(), 1);
    }
}
