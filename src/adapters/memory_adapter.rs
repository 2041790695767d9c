//! In-process storage adapter. Nothing outlives the value.

use crate::domain::error::JournalError;
use crate::ports::storage_port::StoragePort;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStorageAdapter {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(self, key: &str, payload: &str) -> Self {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), payload.to_string());
        self
    }
}

impl StoragePort for MemoryStorageAdapter {
    fn read(&self, key: &str) -> Result<Option<String>, JournalError> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), JournalError> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }
}
