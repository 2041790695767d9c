//! Ordered record lists mirrored to a persistence slot.

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::JournalError;
use super::strategy::Strategy;
use super::trade::Trade;
use crate::ports::storage_port::StoragePort;

/// A record type that lives in its own persistence slot.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Storage key holding the JSON array of every record of this type.
    const SLOT: &'static str;

    fn record_id(&self) -> Option<&str>;
}

impl Record for Trade {
    const SLOT: &'static str = "trades";

    fn record_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Record for Strategy {
    const SLOT: &'static str = "strategies";

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Insertion-ordered records of one type.
///
/// Every successful mutation rewrites the whole slot. When the write fails
/// the in-memory list is rolled back so memory and storage never diverge.
pub struct RecordStore<'a, T: Record> {
    port: &'a dyn StoragePort,
    records: Vec<T>,
}

impl<'a, T: Record> RecordStore<'a, T> {
    /// Reads the slot. Missing, unreadable, or malformed data yields an
    /// empty store instead of an error.
    pub fn load(port: &'a dyn StoragePort) -> Self {
        let records = load_slot(port);
        Self { port, records }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.record_id() == Some(id))
    }

    pub fn append(&mut self, record: T) -> Result<(), JournalError> {
        self.records.push(record);
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Substitutes the first record whose id matches, keeping its position.
    /// Returns `false` and leaves storage untouched when nothing matches.
    pub fn replace(&mut self, id: &str, record: T) -> Result<bool, JournalError> {
        let Some(pos) = self.records.iter().position(|r| r.record_id() == Some(id)) else {
            debug!("replace on '{}': no record with id {}", T::SLOT, id);
            return Ok(false);
        };

        let previous = std::mem::replace(&mut self.records[pos], record);
        if let Err(e) = self.persist() {
            self.records[pos] = previous;
            return Err(e);
        }
        Ok(true)
    }

    /// Filters out every record with a matching id. Returns `false` and
    /// leaves storage untouched when nothing matches.
    pub fn remove(&mut self, id: &str) -> Result<bool, JournalError> {
        if !self.records.iter().any(|r| r.record_id() == Some(id)) {
            debug!("remove on '{}': no record with id {}", T::SLOT, id);
            return Ok(false);
        }

        let previous = self.records.clone();
        self.records.retain(|r| r.record_id() != Some(id));
        if let Err(e) = self.persist() {
            self.records = previous;
            return Err(e);
        }
        Ok(true)
    }

    fn persist(&self) -> Result<(), JournalError> {
        let payload =
            serde_json::to_string(&self.records).map_err(|e| JournalError::Serialization {
                key: T::SLOT.to_string(),
                reason: e.to_string(),
            })?;
        self.port.write(T::SLOT, &payload)?;
        debug!("wrote {} records to '{}'", self.records.len(), T::SLOT);
        Ok(())
    }
}

fn load_slot<T: Record>(port: &dyn StoragePort) -> Vec<T> {
    let payload = match port.read(T::SLOT) {
        Ok(Some(payload)) if !payload.trim().is_empty() => payload,
        Ok(_) => {
            debug!("slot '{}' is empty", T::SLOT);
            return Vec::new();
        }
        Err(e) => {
            error!("failed to read slot '{}', starting empty: {}", T::SLOT, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&payload) {
        Ok(records) => {
            info!("loaded {} records from '{}'", records.len(), T::SLOT);
            records
        }
        Err(e) => {
            error!("error parsing slot '{}', starting empty: {}", T::SLOT, e);
            preserve_corrupt(port, T::SLOT, &payload);
            Vec::new()
        }
    }
}

/// Copies an unparseable payload aside so the next write cannot destroy it.
///
/// The first backup goes to `<slot>.corrupt`. Reloading the same payload
/// leaves it alone; a different payload gets a timestamped key so earlier
/// backups survive.
fn preserve_corrupt(port: &dyn StoragePort, slot: &str, payload: &str) {
    let primary = format!("{slot}.corrupt");
    let backup = match port.read(&primary) {
        Ok(Some(existing)) if existing == payload => {
            debug!("unparseable '{}' data already preserved in '{}'", slot, primary);
            return;
        }
        Ok(None) => primary,
        _ => format!("{primary}.{}", Utc::now().timestamp_millis()),
    };
    match port.write(&backup, payload) {
        Ok(()) => warn!("unparseable '{}' data preserved in '{}'", slot, backup),
        Err(e) => error!("could not preserve unparseable '{}' data: {}", slot, e),
    }
}
