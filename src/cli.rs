//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_export;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_file_adapter::JsonFileAdapter;
use crate::adapters::memory_adapter::MemoryStorageAdapter;
use crate::domain::config_validation::{
    StorageBackend, parse_setting, storage_backend, validate_journal_config,
};
use crate::domain::error::JournalError;
use crate::domain::journal::{JournalSettings, StrategyLibrary, TradeJournal};
use crate::domain::statistics::{DrawdownMethod, Statistics, StrategyBreakdown};
use crate::domain::strategy::{Session, Strategy, StrategyInput, StrategyType};
use crate::domain::trade::{
    Direction, EntryLogic, ExitLogic, HoldingTimePolicy, RiskSize, RulesFollowed, Trade,
    TradeInput,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::storage_port::StoragePort;

#[derive(Parser, Debug)]
#[command(name = "tradejournal", about = "Personal trading journal and strategy library")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log a closed trade
    #[command(allow_negative_numbers = true)]
    AddTrade {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        trade: TradeArgs,
    },
    /// List logged trades in journal order
    Trades {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Delete a trade by id
    DeleteTrade {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Show performance statistics
    Stats {
        #[arg(short, long)]
        config: PathBuf,
        /// Override `[journal] drawdown` (equity | rolling_pair)
        #[arg(long)]
        drawdown: Option<DrawdownMethod>,
        /// Also print cumulative equity after each trade
        #[arg(long)]
        equity_curve: bool,
        #[arg(long)]
        json: bool,
    },
    /// Create a strategy, or replace one in place with --id
    SaveStrategy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// List saved strategies
    Strategies {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Delete a strategy by id
    DeleteStrategy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Write all trades to a CSV file
    ExportTrades {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate a journal configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TradeArgs {
    /// Trade date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub pair: String,
    #[arg(long)]
    pub lot: f64,
    /// Long or Short
    #[arg(long = "type", value_name = "DIRECTION")]
    pub direction: Direction,
    #[arg(long)]
    pub entry: f64,
    #[arg(long)]
    pub stop_loss: f64,
    #[arg(long)]
    pub take_profit: f64,
    #[arg(long)]
    pub exit: f64,
    /// Minutes the position was open
    #[arg(long)]
    pub holding_time: Option<u32>,
    #[arg(long)]
    pub entry_logic: Option<EntryLogic>,
    #[arg(long)]
    pub exit_logic: Option<ExitLogic>,
    #[arg(long)]
    pub strategy: Option<String>,
    #[arg(long)]
    pub time_frame: Option<String>,
    #[arg(long)]
    pub risk: Option<RiskSize>,
    #[arg(long)]
    pub rules: Option<RulesFollowed>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl TradeArgs {
    pub fn into_input(self, today: NaiveDate) -> TradeInput {
        TradeInput {
            date: self.date.unwrap_or(today),
            pair: self.pair,
            lot: self.lot,
            direction: self.direction,
            entry: self.entry,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            exit: self.exit,
            holding_time: self.holding_time,
            entry_logic: self.entry_logic,
            exit_logic: self.exit_logic,
            strategy: self.strategy,
            time_frame: self.time_frame,
            risk: self.risk,
            rules: self.rules,
            notes: self.notes,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StrategyArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long = "type", value_name = "TYPE")]
    pub strategy_type: StrategyType,
    /// Repeat for each instrument traded
    #[arg(long = "instrument", required = true)]
    pub instruments: Vec<String>,
    #[arg(long, default_value = "All")]
    pub session: Session,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "timeframe")]
    pub timeframes: Vec<String>,
    #[arg(long = "indicator")]
    pub indicators: Vec<String>,
    #[arg(long = "entry-rule")]
    pub entry_rules: Vec<String>,
    #[arg(long = "exit-rule")]
    pub exit_rules: Vec<String>,
    #[arg(long = "stop-loss-rule")]
    pub stop_loss_rules: Vec<String>,
    #[arg(long = "take-profit-rule")]
    pub take_profit_rules: Vec<String>,
    #[arg(long)]
    pub risk_management: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl StrategyArgs {
    pub fn into_input(self) -> StrategyInput {
        StrategyInput {
            name: self.name,
            description: self.description,
            strategy_type: self.strategy_type,
            instruments: self.instruments,
            session: self.session,
            timeframes: Some(self.timeframes),
            indicators: Some(self.indicators),
            entry_rules: self.entry_rules,
            exit_rules: self.exit_rules,
            stop_loss_rules: self.stop_loss_rules,
            take_profit_rules: self.take_profit_rules,
            risk_management: self.risk_management,
            tags: Some(self.tags),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::AddTrade { config, trade } => run_add_trade(&config, trade),
        Command::Trades { config, json } => run_list_trades(&config, json),
        Command::DeleteTrade { config, id } => run_delete_trade(&config, &id),
        Command::Stats {
            config,
            drawdown,
            equity_curve,
            json,
        } => run_stats(&config, drawdown, equity_curve, json),
        Command::SaveStrategy {
            config,
            id,
            strategy,
        } => run_save_strategy(&config, id.as_deref(), strategy),
        Command::Strategies { config, json } => run_list_strategies(&config, json),
        Command::DeleteStrategy { config, id } => run_delete_strategy(&config, &id),
        Command::ExportTrades { config, output } => run_export_trades(&config, &output),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: JournalError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Initialises `env_logger` from `[logging] level` (default `warn`);
/// `RUST_LOG` still takes precedence when set.
pub fn init_logging(config: &dyn ConfigPort) {
    let level = config
        .get_string("logging", "level")
        .and_then(|l| l.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Warn);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();
    // Already initialised when `run` is called twice in one process.
    let _ = builder.try_init();
}

pub fn build_journal_settings(config: &dyn ConfigPort) -> Result<JournalSettings, JournalError> {
    Ok(JournalSettings {
        drawdown: parse_setting::<DrawdownMethod>(config, "journal", "drawdown")?
            .unwrap_or_default(),
        holding_time: parse_setting::<HoldingTimePolicy>(config, "journal", "holding_time")?
            .unwrap_or_default(),
    })
}

pub fn open_storage(config: &dyn ConfigPort) -> Result<Box<dyn StoragePort>, JournalError> {
    match storage_backend(config)? {
        StorageBackend::Json => Ok(Box::new(JsonFileAdapter::from_config(config))),
        StorageBackend::Memory => Ok(Box::new(MemoryStorageAdapter::new())),
        StorageBackend::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                Ok(Box::new(SqliteAdapter::from_config(config)?))
            }

            #[cfg(not(feature = "sqlite"))]
            {
                Err(JournalError::ConfigInvalid {
                    section: "storage".into(),
                    key: "backend".into(),
                    reason: "sqlite feature is required for the sqlite backend".into(),
                })
            }
        }
    }
}

/// Opened storage plus the settings read from the same config file.
struct Context {
    storage: Box<dyn StoragePort>,
    settings: JournalSettings,
}

fn open_session(config_path: &PathBuf) -> Result<Context, ExitCode> {
    let config = load_config(config_path)?;
    init_logging(&config);
    validate_journal_config(&config).map_err(fail)?;
    let settings = build_journal_settings(&config).map_err(fail)?;
    let storage = open_storage(&config).map_err(fail)?;
    Ok(Context { storage, settings })
}

fn run_add_trade(config_path: &PathBuf, args: TradeArgs) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let mut journal = TradeJournal::load(session.storage.as_ref(), session.settings);

    match journal.create_trade(args.into_input(Local::now().date_naive())) {
        Ok(trade) => {
            println!("{}", format_trade_row(&trade));
            eprintln!("Trade {} logged ({} total)", trade.id, journal.trades().len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_list_trades(config_path: &PathBuf, json: bool) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let journal = TradeJournal::load(session.storage.as_ref(), session.settings);

    if json {
        return print_json(journal.trades());
    }
    if journal.trades().is_empty() {
        eprintln!("No trades logged");
        return ExitCode::SUCCESS;
    }
    println!("{}", trade_table_header());
    for trade in journal.trades() {
        println!("{}", format_trade_row(trade));
    }
    eprintln!("{} trades", journal.trades().len());
    ExitCode::SUCCESS
}

fn run_delete_trade(config_path: &PathBuf, id: &str) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let mut journal = TradeJournal::load(session.storage.as_ref(), session.settings);

    match journal.delete_trade(id) {
        Ok(true) => {
            eprintln!("Deleted trade {}", id);
            ExitCode::SUCCESS
        }
        Ok(false) => fail(JournalError::NotFound {
            kind: "trade".into(),
            id: id.to_string(),
        }),
        Err(e) => fail(e),
    }
}

fn run_stats(
    config_path: &PathBuf,
    drawdown: Option<DrawdownMethod>,
    equity_curve: bool,
    json: bool,
) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let mut settings = session.settings;
    if let Some(method) = drawdown {
        settings.drawdown = method;
    }
    let journal = TradeJournal::load(session.storage.as_ref(), settings);
    let stats = journal.statistics();

    if json {
        return print_json(&stats);
    }

    print!("{}", format_statistics(&stats, settings.drawdown));

    let breakdown = journal.strategy_breakdown();
    if !breakdown.is_empty() {
        println!("\n=== Per-Strategy Summary ===");
        for line in format_breakdown(&breakdown) {
            println!("{}", line);
        }
    }

    if equity_curve {
        println!("\n=== Equity Curve ===");
        for point in journal.equity_curve() {
            println!(
                "  {} {:<15} {:>12.5}",
                point.date.format("%Y-%m-%d"),
                point.trade_id,
                point.equity
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_save_strategy(config_path: &PathBuf, id: Option<&str>, args: StrategyArgs) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let mut library = StrategyLibrary::load(session.storage.as_ref());

    match library.create_or_update_strategy(args.into_input(), id) {
        Ok(strategy) => {
            println!("{}", format_strategy_row(&strategy));
            let verb = if id.is_some() { "Updated" } else { "Saved" };
            eprintln!(
                "{} strategy {}",
                verb,
                strategy.id.as_deref().unwrap_or_default()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_list_strategies(config_path: &PathBuf, json: bool) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let library = StrategyLibrary::load(session.storage.as_ref());

    if json {
        return print_json(library.strategies());
    }
    if library.strategies().is_empty() {
        eprintln!("No strategies saved");
        return ExitCode::SUCCESS;
    }
    for strategy in library.strategies() {
        println!("{}", format_strategy_row(strategy));
    }
    ExitCode::SUCCESS
}

fn run_delete_strategy(config_path: &PathBuf, id: &str) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let mut library = StrategyLibrary::load(session.storage.as_ref());

    match library.delete_strategy(id) {
        Ok(true) => {
            eprintln!("Deleted strategy {}", id);
            ExitCode::SUCCESS
        }
        Ok(false) => fail(JournalError::NotFound {
            kind: "strategy".into(),
            id: id.to_string(),
        }),
        Err(e) => fail(e),
    }
}

fn run_export_trades(config_path: &PathBuf, output: &PathBuf) -> ExitCode {
    let session = match open_session(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let journal = TradeJournal::load(session.storage.as_ref(), session.settings);

    match csv_export::export_trades(output, journal.trades()) {
        Ok(()) => {
            eprintln!(
                "Exported {} trades to {}",
                journal.trades().len(),
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_journal_config(&config) {
        return fail(e);
    }
    let settings = match build_journal_settings(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let backend = match storage_backend(&config) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };

    eprintln!("  storage:      {}", backend);
    eprintln!("  drawdown:     {}", settings.drawdown);
    eprintln!("  holding time: {}", settings.holding_time);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => fail(JournalError::Serialization {
            key: "stdout".into(),
            reason: e.to_string(),
        }),
    }
}

pub fn trade_table_header() -> String {
    format!(
        "{:<15} {:<10} {:<10} {:<5} {:>12} {:>12} {:>12} {:>7} {:>8}",
        "ID", "DATE", "PAIR", "TYPE", "ENTRY", "EXIT", "P/L", "R", "ROI"
    )
}

pub fn format_trade_row(trade: &Trade) -> String {
    format!(
        "{:<15} {:<10} {:<10} {:<5} {:>12} {:>12} {:>12.5} {:>7.2} {:>8}",
        trade.id,
        trade.date.format("%Y-%m-%d"),
        trade.pair,
        trade.direction,
        trade.entry,
        trade.exit,
        trade.profit_loss,
        trade.r_multiple,
        trade.roi.as_deref().unwrap_or("-"),
    )
}

pub fn format_strategy_row(strategy: &Strategy) -> String {
    format!(
        "{:<15} {:<30} {:<10} {:<8} {} ({} rules)",
        strategy.id.as_deref().unwrap_or("-"),
        strategy.name,
        strategy.strategy_type,
        strategy.session,
        strategy.instruments.join(", "),
        strategy.rule_count(),
    )
}

pub fn format_statistics(stats: &Statistics, method: DrawdownMethod) -> String {
    let mut out = String::from("=== Journal Statistics ===\n");
    out.push_str(&format!("Total Trades:     {}\n", stats.total_trades));
    out.push_str(&format!("Wins / Losses:    {} / {}\n", stats.wins, stats.losses));
    out.push_str(&format!("Win Rate:         {:.2}%\n", stats.win_rate));
    out.push_str(&format!("Net Profit:       {:.5}\n", stats.net_profit));
    out.push_str(&format!("Profit Factor:    {:.2}\n", stats.profit_factor));
    out.push_str(&format!("Avg R-Multiple:   {:.2}\n", stats.avg_r_multiple));
    out.push_str(&format!("Avg Holding Time: {:.0} min\n", stats.avg_holding_time));
    out.push_str(&format!(
        "Max Drawdown:     {:.5} ({})\n",
        stats.max_drawdown, method
    ));
    out
}

pub fn format_breakdown(breakdown: &[StrategyBreakdown]) -> Vec<String> {
    breakdown
        .iter()
        .map(|b| {
            let sign = if b.net_profit >= 0.0 { "+" } else { "" };
            format!(
                "  {}:  {} trades, {:.1}% win rate, {}{:.5}, avg {:.2}R",
                b.strategy, b.total_trades, b.win_rate, sign, b.net_profit, b.avg_r_multiple,
            )
        })
        .collect()
}
