//! Persistence slot port trait.

use crate::domain::error::JournalError;

/// A key to text store where every write replaces the whole slot.
///
/// Implementations must make `write` all-or-nothing: after an `Err` the
/// slot still holds its previous payload.
pub trait StoragePort {
    /// Returns `Ok(None)` when the slot has never been written.
    fn read(&self, key: &str) -> Result<Option<String>, JournalError>;

    fn write(&self, key: &str, payload: &str) -> Result<(), JournalError>;
}
