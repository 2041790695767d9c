//! CSV export of the trade journal.

use crate::domain::error::JournalError;
use crate::domain::trade::Trade;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 20] = [
    "id",
    "date",
    "pair",
    "lot",
    "type",
    "entry",
    "stopLoss",
    "takeProfit",
    "exit",
    "profitLoss",
    "rMultiple",
    "roi",
    "holdingTime",
    "entryLogic",
    "exitLogic",
    "strategy",
    "timeFrame",
    "risk",
    "rules",
    "notes",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_error(e: csv::Error) -> JournalError {
    JournalError::Serialization {
        key: "trades.csv".into(),
        reason: e.to_string(),
    }
}

/// Writes one header row and one row per trade; absent optional fields are
/// empty cells.
pub fn write_trades<W: Write>(writer: W, trades: &[Trade]) -> Result<(), JournalError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(csv_error)?;

    for t in trades {
        wtr.write_record([
            t.id.clone(),
            t.date.format("%Y-%m-%d").to_string(),
            t.pair.clone(),
            t.lot.to_string(),
            t.direction.to_string(),
            t.entry.to_string(),
            t.stop_loss.to_string(),
            t.take_profit.to_string(),
            t.exit.to_string(),
            t.profit_loss.to_string(),
            t.r_multiple.to_string(),
            opt(t.roi.as_deref()),
            opt(t.holding_time),
            opt(t.entry_logic),
            opt(t.exit_logic),
            opt(t.strategy.as_deref()),
            opt(t.time_frame.as_deref()),
            opt(t.risk),
            opt(t.rules),
            opt(t.notes.as_deref()),
        ])
        .map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_trades(path: &Path, trades: &[Trade]) -> Result<(), JournalError> {
    let file = File::create(path)?;
    write_trades(file, trades)
}
