//! 토큰 관리 명령어 (UI 프로세스 경계)
//!
//! 모든 결과는 `{success, ...}` 봉투로 반환하며, 에러를 경계 밖으로 던지지 않습니다.

use serde::Serialize;

use crate::error::{CommandError, CommandResult};
use crate::secrets::{SecretVault, TokenPair};

/// 저장 결과
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTokensResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 조회 결과
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTokensResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn try_save(vault: &SecretVault, tokens: &TokenPair) -> CommandResult<()> {
    vault.save_tokens(tokens).map_err(CommandError::from)
}

fn try_load(vault: &SecretVault) -> CommandResult<TokenPair> {
    vault.load_tokens().map_err(CommandError::from)
}

/// 토큰 저장 (암호화 후 저장)
pub fn save_tokens(vault: &SecretVault, tokens: TokenPair) -> SaveTokensResult {
    match try_save(vault, &tokens) {
        Ok(()) => SaveTokensResult {
            success: true,
            error: None,
        },
        Err(e) => {
            tracing::error!(
                code = %e.code,
                error = %e.message,
                details = ?e.details,
                "error saving tokens"
            );
            SaveTokensResult {
                success: false,
                error: Some(e.message),
            }
        }
    }
}

/// 토큰 조회 (복호화). 한쪽만 깨진 경우 해당 토큰만 빈 문자열
pub fn load_tokens(vault: &SecretVault) -> LoadTokensResult {
    match try_load(vault) {
        Ok(tokens) => LoadTokensResult {
            success: true,
            tokens: Some(tokens),
            error: None,
        },
        Err(e) => {
            tracing::error!(
                code = %e.code,
                error = %e.message,
                details = ?e.details,
                "error loading tokens"
            );
            LoadTokensResult {
                success: false,
                tokens: None,
                error: Some(e.message),
            }
        }
    }
}
