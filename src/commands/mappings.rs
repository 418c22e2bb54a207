//! 계좌 매핑 명령어 (UI 프로세스 경계)

use serde::Serialize;

use crate::error::CommandError;
use crate::mappings::{AccountMappingStore, AccountMappings};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMappingsResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 조회 결과 (실패해도 `mappings`는 빈 객체)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadMappingsResult {
    pub success: bool,
    pub mappings: AccountMappings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn save_account_mappings(
    store: &AccountMappingStore,
    mappings: AccountMappings,
) -> SaveMappingsResult {
    match store.save(&mappings) {
        Ok(()) => SaveMappingsResult {
            success: true,
            error: None,
        },
        Err(e) => {
            let e = CommandError::from(e);
            tracing::error!(
                code = %e.code,
                error = %e.message,
                details = ?e.details,
                "error saving account mappings"
            );
            SaveMappingsResult {
                success: false,
                error: Some(e.message),
            }
        }
    }
}

pub fn load_account_mappings(store: &AccountMappingStore) -> LoadMappingsResult {
    match store.load() {
        Ok(mappings) => LoadMappingsResult {
            success: true,
            mappings,
            error: None,
        },
        Err(e) => {
            let e = CommandError::from(e);
            tracing::error!(
                code = %e.code,
                error = %e.message,
                details = ?e.details,
                "error loading account mappings"
            );
            LoadMappingsResult {
                success: false,
                mappings: AccountMappings::new(),
                error: Some(e.message),
            }
        }
    }
}
