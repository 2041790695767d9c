//! Journal trade records and their derived fields.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::JournalError;
use super::id::serde_id;
use super::non_blank;

labelled_enum! {
    Direction ("direction") {
        Long => "Long" | "buy",
        Short => "Short" | "sell",
    }
}

labelled_enum! {
    EntryLogic ("entry logic") {
        Manual => "Manual",
        Limit => "Limit",
    }
}

labelled_enum! {
    /// How a position was closed: manually, at the stop, at the target,
    /// at break-even, or after the stop was pulled.
    ExitLogic ("exit logic") {
        Manual => "Manual",
        StopLoss => "SL" | "stop-loss",
        TakeProfit => "TP" | "take-profit",
        BreakEven => "BR" | "break-even",
        StopPulled => "SP" | "stop-pulled",
    }
}

labelled_enum! {
    RiskSize ("risk size") {
        Full => "FULL",
        Half => "HALF",
    }
}

labelled_enum! {
    /// Whether the trade followed the trader's own rules.
    RulesFollowed ("rules") {
        Yes => "Yes",
        No => "No",
    }
}

labelled_enum! {
    /// Where a new trade's holding time comes from.
    ///
    /// `Placeholder` fills a missing value with a random 15..255 minute
    /// duration. It is a stand-in for a real entry/exit timestamp
    /// difference and exists only to reproduce demo data.
    HoldingTimePolicy ("holding time policy") {
        Explicit => "explicit",
        Placeholder => "placeholder",
    }
}

impl Default for HoldingTimePolicy {
    fn default() -> Self {
        HoldingTimePolicy::Explicit
    }
}

pub const PLACEHOLDER_HOLDING_MINUTES: std::ops::Range<u32> = 15..255;

impl HoldingTimePolicy {
    pub fn resolve(self, explicit: Option<u32>) -> Option<u32> {
        self.resolve_with(explicit, &mut rand::thread_rng())
    }

    pub fn resolve_with<R: Rng>(self, explicit: Option<u32>, rng: &mut R) -> Option<u32> {
        match (self, explicit) {
            (_, Some(minutes)) => Some(minutes),
            (HoldingTimePolicy::Explicit, None) => None,
            (HoldingTimePolicy::Placeholder, None) => {
                Some(rng.gen_range(PLACEHOLDER_HOLDING_MINUTES))
            }
        }
    }
}

/// Older journals stored a blank numeric field as `null` (a NaN that went
/// through JSON); such fields read back as zero.
pub(crate) mod serde_num {
    use serde::{Deserialize, Deserializer};

    pub fn or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Option::<f64>::deserialize(deserializer).map(|value| value.unwrap_or(0.0))
    }
}

/// A user-submitted trade, before an id and derived fields are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeInput {
    pub date: NaiveDate,
    pub pair: String,
    pub lot: f64,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub exit: f64,
    /// Minutes the position was held.
    #[serde(default)]
    pub holding_time: Option<u32>,
    #[serde(default)]
    pub entry_logic: Option<EntryLogic>,
    #[serde(default)]
    pub exit_logic: Option<ExitLogic>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub time_frame: Option<String>,
    #[serde(default)]
    pub risk: Option<RiskSize>,
    #[serde(default)]
    pub rules: Option<RulesFollowed>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TradeInput {
    /// Rejects input that would otherwise poison the derived fields with
    /// NaN or infinity.
    pub fn validate(&self) -> Result<(), JournalError> {
        if self.pair.trim().is_empty() {
            return Err(invalid("pair", "must not be blank"));
        }
        let numbers = [
            ("lot", self.lot),
            ("entry", self.entry),
            ("stopLoss", self.stop_loss),
            ("takeProfit", self.take_profit),
            ("exit", self.exit),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(invalid(field, "must be a finite number"));
            }
        }
        if self.lot <= 0.0 {
            return Err(invalid("lot", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> JournalError {
    JournalError::InvalidTrade {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// One logged position as persisted in the `trades` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(deserialize_with = "serde_id::required")]
    pub id: String,
    pub date: NaiveDate,
    pub pair: String,
    #[serde(deserialize_with = "serde_num::or_zero")]
    pub lot: f64,
    #[serde(rename = "type")]
    pub direction: Direction,
    #[serde(deserialize_with = "serde_num::or_zero")]
    pub entry: f64,
    #[serde(deserialize_with = "serde_num::or_zero")]
    pub stop_loss: f64,
    #[serde(deserialize_with = "serde_num::or_zero")]
    pub take_profit: f64,
    #[serde(deserialize_with = "serde_num::or_zero")]
    pub exit: f64,
    #[serde(default, deserialize_with = "serde_num::or_zero")]
    pub profit_loss: f64,
    #[serde(default, deserialize_with = "serde_num::or_zero")]
    pub r_multiple: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_logic: Option<EntryLogic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_logic: Option<ExitLogic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_frame: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RulesFollowed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Trade {
    pub fn from_input(
        input: TradeInput,
        id: String,
        policy: HoldingTimePolicy,
    ) -> Result<Self, JournalError> {
        input.validate()?;

        let risk = risk_per_unit(input.direction, input.entry, input.stop_loss);
        let profit_loss = profit_loss(input.direction, input.entry, input.exit);

        Ok(Trade {
            id,
            date: input.date,
            pair: input.pair.trim().to_string(),
            lot: input.lot,
            direction: input.direction,
            entry: input.entry,
            stop_loss: input.stop_loss,
            take_profit: input.take_profit,
            exit: input.exit,
            profit_loss,
            r_multiple: r_multiple(profit_loss, risk),
            roi: Some(format_roi(profit_loss, input.entry, risk)),
            holding_time: policy.resolve(input.holding_time),
            entry_logic: input.entry_logic,
            exit_logic: input.exit_logic,
            strategy: non_blank(input.strategy),
            time_frame: non_blank(input.time_frame),
            risk: input.risk,
            rules: input.rules,
            notes: non_blank(input.notes),
        })
    }

    /// Price distance between entry and stop, positive when the stop sits on
    /// the losing side of the entry.
    pub fn risk_per_unit(&self) -> f64 {
        risk_per_unit(self.direction, self.entry, self.stop_loss)
    }
}

pub fn risk_per_unit(direction: Direction, entry: f64, stop_loss: f64) -> f64 {
    match direction {
        Direction::Long => entry - stop_loss,
        Direction::Short => stop_loss - entry,
    }
}

pub fn profit_loss(direction: Direction, entry: f64, exit: f64) -> f64 {
    match direction {
        Direction::Long => exit - entry,
        Direction::Short => entry - exit,
    }
}

pub fn r_multiple(profit_loss: f64, risk: f64) -> f64 {
    if risk != 0.0 { profit_loss / risk } else { 0.0 }
}

pub fn format_roi(profit_loss: f64, entry: f64, risk: f64) -> String {
    if risk == 0.0 || entry == 0.0 {
        return "0%".to_string();
    }
    format!("{:.2}%", profit_loss / entry * 100.0)
}
