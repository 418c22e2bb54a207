//! Account Mapping Store
//!
//! Monobank 계좌 ID → Lunch Money asset ID 매핑.
//! 저장할 때마다 통째로 교체합니다 (부분 병합 없음).

use std::collections::HashMap;

use crate::store::{KvStore, StoreError};

const ACCOUNT_MAPPINGS_KEY: &str = "accountMappings";

/// bank account id → ledger asset id
pub type AccountMappings = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct AccountMappingStore {
    store: KvStore,
}

impl AccountMappingStore {
    pub fn new(store: KvStore) -> Self {
        Self { store }
    }

    pub fn save(&self, mappings: &AccountMappings) -> Result<(), StoreError> {
        self.store.set(ACCOUNT_MAPPINGS_KEY, mappings)?;
        tracing::info!(count = mappings.len(), "account mappings saved");
        Ok(())
    }

    pub fn load(&self) -> Result<AccountMappings, StoreError> {
        self.store.get(ACCOUNT_MAPPINGS_KEY, AccountMappings::new())
    }
}
