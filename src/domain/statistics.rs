//! Performance statistics derived from the trade list.
//!
//! Everything here is a pure function of the trades passed in; nothing is
//! cached or persisted.

use chrono::NaiveDate;
use serde::Serialize;

use super::trade::Trade;

labelled_enum! {
    /// How `maxDrawdown` is measured.
    ///
    /// `Equity` tracks the running peak of cumulative net profit (starting
    /// from zero) and reports the largest peak-to-trough gap. `RollingPair`
    /// reproduces older journals, which compared the sum of each trade and
    /// its predecessor against a peak seeded with the first trade.
    DrawdownMethod ("drawdown method") {
        Equity => "equity" | "cumulative",
        RollingPair => "rolling_pair" | "rolling-pair" | "legacy",
    }
}

impl Default for DrawdownMethod {
    fn default() -> Self {
        DrawdownMethod::Equity
    }
}

const UNASSIGNED_STRATEGY: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage, 0 to 100.
    pub win_rate: f64,
    pub avg_r_multiple: f64,
    pub profit_factor: f64,
    /// Minutes; trades without a holding time count as zero.
    pub avg_holding_time: f64,
    pub max_drawdown: f64,
    pub net_profit: f64,
}

impl Statistics {
    pub fn compute(trades: &[Trade], method: DrawdownMethod) -> Self {
        if trades.is_empty() {
            return Statistics::default();
        }

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut net_profit = 0.0_f64;
        let mut total_r = 0.0_f64;
        let mut total_holding = 0.0_f64;

        for trade in trades {
            let pnl = trade.profit_loss;
            if pnl > 0.0 {
                wins += 1;
                gross_profit += pnl;
            } else if pnl < 0.0 {
                losses += 1;
                gross_loss += pnl.abs();
            }
            net_profit += pnl;
            total_r += trade.r_multiple;
            total_holding += f64::from(trade.holding_time.unwrap_or(0));
        }

        let n = trades.len() as f64;

        // With no losing trades the factor degenerates to the gross profit
        // itself rather than infinity.
        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else {
            gross_profit
        };

        let pnls: Vec<f64> = trades.iter().map(|t| t.profit_loss).collect();
        let max_drawdown = match method {
            DrawdownMethod::Equity => equity_drawdown(&pnls),
            DrawdownMethod::RollingPair => rolling_pair_drawdown(&pnls),
        };

        Statistics {
            total_trades: trades.len(),
            wins,
            losses,
            win_rate: wins as f64 / n * 100.0,
            avg_r_multiple: total_r / n,
            profit_factor,
            avg_holding_time: total_holding / n,
            max_drawdown,
            net_profit,
        }
    }
}

/// Statistics with the default drawdown method.
pub fn compute_statistics(trades: &[Trade]) -> Statistics {
    Statistics::compute(trades, DrawdownMethod::default())
}

fn equity_drawdown(pnls: &[f64]) -> f64 {
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for pnl in pnls {
        equity += pnl;
        if equity > peak {
            peak = equity;
        }
        let dd = peak - equity;
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd
}

fn rolling_pair_drawdown(pnls: &[f64]) -> f64 {
    let Some(&first) = pnls.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for pair in pnls.windows(2) {
        let current = pair[0] + pair[1];
        if current > peak {
            peak = current;
        } else {
            let dd = peak - current;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub trade_id: String,
    pub date: NaiveDate,
    /// Cumulative net profit after this trade.
    pub equity: f64,
}

/// Cumulative net profit after each trade, in journal order.
pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    let mut equity = 0.0_f64;
    trades
        .iter()
        .map(|trade| {
            equity += trade.profit_loss;
            EquityPoint {
                trade_id: trade.id.clone(),
                date: trade.date,
                equity,
            }
        })
        .collect()
}

/// Per-strategy-label summary of the journal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyBreakdown {
    pub strategy: String,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub net_profit: f64,
    pub avg_r_multiple: f64,
}

impl StrategyBreakdown {
    /// Groups trades by their strategy label, ordered by first appearance.
    /// Trades without a label are grouped under "Unassigned".
    pub fn compute_per_strategy(trades: &[Trade]) -> Vec<StrategyBreakdown> {
        let mut groups: Vec<(&str, Vec<&Trade>)> = Vec::new();

        for trade in trades {
            let label = trade
                .strategy
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNASSIGNED_STRATEGY);
            match groups.iter_mut().find(|(name, _)| *name == label) {
                Some((_, members)) => members.push(trade),
                None => groups.push((label, vec![trade])),
            }
        }

        groups
            .into_iter()
            .map(|(label, members)| {
                let n = members.len();
                let wins = members.iter().filter(|t| t.profit_loss > 0.0).count();
                let losses = members.iter().filter(|t| t.profit_loss < 0.0).count();
                let net_profit: f64 = members.iter().map(|t| t.profit_loss).sum();
                let total_r: f64 = members.iter().map(|t| t.r_multiple).sum();

                StrategyBreakdown {
                    strategy: label.to_string(),
                    total_trades: n,
                    wins,
                    losses,
                    win_rate: wins as f64 / n as f64 * 100.0,
                    net_profit,
                    avg_r_multiple: total_r / n as f64,
                }
            })
            .collect()
    }
}
