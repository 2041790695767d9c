//! Strategy library records and submission normalization.

use serde::{Deserialize, Serialize};

use super::error::JournalError;
use super::id::serde_id;
use super::non_blank;

labelled_enum! {
    StrategyType ("strategy type") {
        Trend => "Trend",
        Range => "Range",
        Breakout => "Breakout",
        Reversal => "Reversal",
        Scalping => "Scalping",
        Swing => "Swing",
        Other => "Other",
    }
}

labelled_enum! {
    Session ("session") {
        All => "All",
        NewYork => "NewYork" | "new-york" | "new_york" | "ny",
        Asian => "Asian" | "asia",
        London => "London",
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::All
    }
}

/// A strategy as submitted from the create/edit form, without an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub strategy_type: StrategyType,
    pub instruments: Vec<String>,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub timeframes: Option<Vec<String>>,
    #[serde(default)]
    pub indicators: Option<Vec<String>>,
    #[serde(default)]
    pub entry_rules: Vec<String>,
    #[serde(default)]
    pub exit_rules: Vec<String>,
    #[serde(default)]
    pub stop_loss_rules: Vec<String>,
    #[serde(default)]
    pub take_profit_rules: Vec<String>,
    #[serde(default)]
    pub risk_management: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl StrategyInput {
    pub fn new(name: impl Into<String>, strategy_type: StrategyType) -> Self {
        StrategyInput {
            name: name.into(),
            description: None,
            strategy_type,
            instruments: Vec::new(),
            session: Session::All,
            timeframes: None,
            indicators: None,
            entry_rules: Vec::new(),
            exit_rules: Vec::new(),
            stop_loss_rules: Vec::new(),
            take_profit_rules: Vec::new(),
            risk_management: None,
            tags: None,
        }
    }

    /// Trims every entry and drops blanks. Set-like fields are deduplicated
    /// keeping first occurrence; rule lists keep order and repeats. Empty
    /// optional sets collapse to absent so "not specified" survives storage.
    pub fn normalize(self) -> Self {
        StrategyInput {
            name: self.name.trim().to_string(),
            description: non_blank(self.description),
            strategy_type: self.strategy_type,
            instruments: clean_set(self.instruments),
            session: self.session,
            timeframes: clean_optional_set(self.timeframes),
            indicators: clean_optional_set(self.indicators),
            entry_rules: clean_rules(self.entry_rules),
            exit_rules: clean_rules(self.exit_rules),
            stop_loss_rules: clean_rules(self.stop_loss_rules),
            take_profit_rules: clean_rules(self.take_profit_rules),
            risk_management: non_blank(self.risk_management),
            tags: clean_optional_set(self.tags),
        }
    }

    pub fn validate(&self) -> Result<(), JournalError> {
        if self.name.trim().is_empty() {
            return Err(JournalError::InvalidStrategy {
                reason: "name must not be blank".into(),
            });
        }
        if !self.instruments.iter().any(|i| !i.trim().is_empty()) {
            return Err(JournalError::InvalidStrategy {
                reason: format!("'{}' needs at least one instrument", self.name.trim()),
            });
        }
        Ok(())
    }
}

fn clean_rules(rules: Vec<String>) -> Vec<String> {
    rules
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

fn clean_set(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in clean_rules(values) {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn clean_optional_set(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values.map(clean_set).filter(|v| !v.is_empty())
}

/// A named trading edge as persisted in the `strategies` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    #[serde(
        default,
        deserialize_with = "serde_id::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub strategy_type: StrategyType,
    pub instruments: Vec<String>,
    #[serde(default)]
    pub session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<String>>,
    #[serde(default)]
    pub entry_rules: Vec<String>,
    #[serde(default)]
    pub exit_rules: Vec<String>,
    #[serde(default)]
    pub stop_loss_rules: Vec<String>,
    #[serde(default)]
    pub take_profit_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_management: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Strategy {
    /// Normalizes and validates `input`, then stamps it with `id`.
    pub fn from_input(input: StrategyInput, id: String) -> Result<Self, JournalError> {
        let input = input.normalize();
        input.validate()?;

        Ok(Strategy {
            id: Some(id),
            name: input.name,
            description: input.description,
            strategy_type: input.strategy_type,
            instruments: input.instruments,
            session: input.session,
            timeframes: input.timeframes,
            indicators: input.indicators,
            entry_rules: input.entry_rules,
            exit_rules: input.exit_rules,
            stop_loss_rules: input.stop_loss_rules,
            take_profit_rules: input.take_profit_rules,
            risk_management: input.risk_management,
            tags: input.tags,
        })
    }

    pub fn rule_count(&self) -> usize {
        self.entry_rules.len()
            + self.exit_rules.len()
            + self.stop_loss_rules.len()
            + self.take_profit_rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sample_input() -> StrategyInput {
        let mut input = StrategyInput::new("London Breakout", StrategyType::Breakout);
        input.instruments = strings(&["EUR/USD", "GBP/USD"]);
        input.session = Session::London;
        input
    }

    #[test]
    fn rule_lists_drop_blank_entries() {
        let mut input = sample_input();
        input.entry_rules = strings(&["Break of Asian high", "  ", "", " Retest holds "]);
        input.exit_rules = strings(&["   "]);
        let strategy = Strategy::from_input(input, "1".into()).unwrap();

        assert_eq!(
            strategy.entry_rules,
            strings(&["Break of Asian high", "Retest holds"])
        );
        assert!(strategy.exit_rules.is_empty());
    }

    #[test]
    fn rule_lists_keep_duplicates_and_order() {
        let mut input = sample_input();
        input.stop_loss_rules = strings(&["Below range", "Below range"]);
        let strategy = Strategy::from_input(input, "1".into()).unwrap();
        assert_eq!(strategy.stop_loss_rules.len(), 2);
    }

    #[test]
    fn empty_optional_sets_collapse_to_absent() {
        let mut input = sample_input();
        input.timeframes = Some(vec![]);
        input.indicators = Some(strings(&[" "]));
        input.tags = Some(strings(&["momentum", "momentum", " pullback"]));
        let strategy = Strategy::from_input(input, "1".into()).unwrap();

        assert_eq!(strategy.timeframes, None);
        assert_eq!(strategy.indicators, None);
        assert_eq!(strategy.tags, Some(strings(&["momentum", "pullback"])));
    }

    #[test]
    fn instruments_are_deduplicated() {
        let mut input = sample_input();
        input.instruments = strings(&["EUR/USD", " EUR/USD", "XAU/USD"]);
        let strategy = Strategy::from_input(input, "1".into()).unwrap();
        assert_eq!(strategy.instruments, strings(&["EUR/USD", "XAU/USD"]));
    }

    #[test]
    fn blank_name_rejected() {
        let mut input = sample_input();
        input.name = "  ".into();
        let err = Strategy::from_input(input, "1".into()).unwrap_err();
        assert!(matches!(err, JournalError::InvalidStrategy { .. }));
    }

    #[test]
    fn missing_instruments_rejected() {
        let mut input = sample_input();
        input.instruments = strings(&["", "  "]);
        let err = Strategy::from_input(input, "1".into()).unwrap_err();
        assert!(err.to_string().contains("at least one instrument"));
    }

    #[test]
    fn rule_count_sums_all_lists() {
        let mut input = sample_input();
        input.entry_rules = strings(&["a", "b"]);
        input.take_profit_rules = strings(&["c"]);
        let strategy = Strategy::from_input(input, "1".into()).unwrap();
        assert_eq!(strategy.rule_count(), 3);
    }

    #[test]
    fn session_parses_aliases() {
        assert_eq!("new-york".parse::<Session>().unwrap(), Session::NewYork);
        assert_eq!("NEWYORK".parse::<Session>().unwrap(), Session::NewYork);
        assert_eq!("asia".parse::<Session>().unwrap(), Session::Asian);
    }

    #[test]
    fn json_omits_absent_fields() {
        let strategy = Strategy::from_input(sample_input(), "abc".into()).unwrap();
        let json = serde_json::to_value(&strategy).unwrap();

        assert_eq!(json["id"], "abc");
        assert_eq!(json["type"], "Breakout");
        assert_eq!(json["session"], "London");
        assert!(json.get("tags").is_none());
        assert!(json.get("description").is_none());
        assert_eq!(json["entryRules"], serde_json::json!([]));
    }

    #[test]
    fn loads_legacy_record_without_id_or_session() {
        let json = r#"{
            "name": "Range fade",
            "type": "Range",
            "instruments": ["USD/JPY"],
            "entryRules": ["Fade the top"]
        }"#;
        let strategy: Strategy = serde_json::from_str(json).unwrap();

        assert_eq!(strategy.id, None);
        assert_eq!(strategy.session, Session::All);
        assert_eq!(strategy.entry_rules, strings(&["Fade the top"]));
        assert!(strategy.exit_rules.is_empty());
    }
}
