//! Secret Vault - 토큰 저장/조회 및 레거시 평문 마이그레이션
//!
//! 토큰은 KV Store의 고정 키에 암호화 blob으로 저장됩니다:
//! - `monobankToken`
//! - `lunchMoneyToken`

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::secrets::crypto::{CryptoError, EncryptionProvider};
use crate::store::{KvStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Vault가 관리하는 토큰 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenName {
    Monobank,
    LunchMoney,
}

impl TokenName {
    pub const ALL: [TokenName; 2] = [TokenName::Monobank, TokenName::LunchMoney];

    /// KV Store 키
    pub fn key(self) -> &'static str {
        match self {
            TokenName::Monobank => "monobankToken",
            TokenName::LunchMoney => "lunchMoneyToken",
        }
    }
}

/// 평문 토큰 쌍 (UI ↔ Vault)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(default)]
    pub monobank_token: String,
    #[serde(default)]
    pub lunch_money_token: String,
}

impl TokenPair {
    fn get(&self, name: TokenName) -> &str {
        match name {
            TokenName::Monobank => &self.monobank_token,
            TokenName::LunchMoney => &self.lunch_money_token,
        }
    }
}

/// 마이그레이션 결과
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub migrated: usize,
    pub failed: usize,
    pub skipped: bool,
}

pub struct SecretVault {
    store: KvStore,
    crypto: EncryptionProvider,
}

impl SecretVault {
    pub fn new(store: KvStore, crypto: EncryptionProvider) -> Self {
        Self { store, crypto }
    }

    pub fn encryption_available(&self) -> bool {
        self.crypto.is_available()
    }

    /// 두 토큰을 암호화해서 한 번의 문서 재기록으로 저장
    pub fn save_tokens(&self, tokens: &TokenPair) -> Result<(), VaultError> {
        let mut blobs = Vec::with_capacity(TokenName::ALL.len());
        for name in TokenName::ALL {
            blobs.push((name.key(), Value::String(self.crypto.encrypt(tokens.get(name))?)));
        }

        self.store.set_many(blobs)?;

        tracing::info!("tokens saved");
        Ok(())
    }

    /// 두 토큰을 복호화해서 반환
    ///
    /// 한쪽 복호화 실패는 해당 토큰만 빈 문자열로 처리합니다.
    pub fn load_tokens(&self) -> Result<TokenPair, VaultError> {
        let monobank = self.read_blob(TokenName::Monobank)?;
        let lunch_money = self.read_blob(TokenName::LunchMoney)?;

        Ok(TokenPair {
            monobank_token: self.crypto.decrypt(&monobank),
            lunch_money_token: self.crypto.decrypt(&lunch_money),
        })
    }

    /// 단일 토큰 복호화 (없거나 읽을 수 없으면 빈 문자열)
    pub fn get_decrypted_token(&self, name: TokenName) -> String {
        match self.read_blob(name) {
            Ok(blob) => self.crypto.decrypt(&blob),
            Err(e) => {
                tracing::error!(token = name.key(), error = %e, "failed to read token");
                String::new()
            }
        }
    }

    /// 레거시 평문 토큰을 암호화 포맷으로 재저장 (앱 시작 시 1회)
    ///
    /// 두 번 실행해도 두 번째는 아무것도 바꾸지 않습니다.
    pub fn migrate_legacy_tokens(&self) -> MigrationReport {
        let mut report = MigrationReport::default();

        if !self.crypto.is_available() {
            tracing::warn!("encryption not available, skipping token migration");
            report.skipped = true;
            return report;
        }

        for name in TokenName::ALL {
            match self.migrate_one(name) {
                Ok(true) => report.migrated += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(token = name.key(), error = %e, "token migration failed");
                    report.failed += 1;
                }
            }
        }

        report
    }

    fn migrate_one(&self, name: TokenName) -> Result<bool, VaultError> {
        let stored = self.read_blob(name)?;
        if stored.is_empty() || is_already_migrated_format(&stored) {
            return Ok(false);
        }

        tracing::info!(token = name.key(), "migrating plain-text token to encrypted storage");
        let blob = self.crypto.encrypt(&stored)?;
        self.store.set(name.key(), &blob)?;
        Ok(true)
    }

    fn read_blob(&self, name: TokenName) -> Result<String, StoreError> {
        self.store.get(name.key(), String::new())
    }
}

/// 암호화 blob의 인코딩(표준 base64)인지 판별
///
/// decode 후 다시 encode했을 때 원문과 정확히 같으면 이미 마이그레이션된 값으로 봅니다.
/// NOTE: 우연히 canonical base64 형태인 평문 토큰도 true가 됩니다.
pub fn is_already_migrated_format(blob: &str) -> bool {
    match BASE64.decode(blob) {
        Ok(bytes) => BASE64.encode(bytes) == blob,
        Err(_) => false,
    }
}
