//! Record identifier generation.

use chrono::Utc;
use std::cell::Cell;

/// Hands out millisecond-timestamp tokens that strictly increase within one
/// running instance, even when several records are created in the same
/// millisecond or the clock steps backwards.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Cell<i64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the floor so future ids sort after `id` when it is numeric.
    /// Non-numeric ids (e.g. random tokens from older data) are ignored.
    pub fn observe(&self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            if value > self.last.get() {
                self.last.set(value);
            }
        }
    }

    pub fn next_id(&self) -> String {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&self, now_millis: i64) -> String {
        let next = now_millis.max(self.last.get().saturating_add(1));
        self.last.set(next);
        next.to_string()
    }
}

/// Serde helpers accepting ids stored either as JSON strings or as bare
/// numbers (older journals wrote `Date.now()` without quoting it).
pub(crate) mod serde_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    impl RawId {
        fn into_string(self) -> String {
            match self {
                RawId::Text(s) => s,
                RawId::Number(n) => n.to_string(),
            }
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        RawId::deserialize(deserializer).map(RawId::into_string)
    }

    pub fn optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(RawId::into_string))
    }
}
