//! Secret Vault 모듈
//!
//! OS 키체인 기반 암호화로 API 토큰을 보관합니다.
//!
//! - Keychain에는 마스터키 1개만 저장 (`monolunch:master_key_v1`)
//! - 토큰은 KV Store(`config.json`)에 토큰별 암호화 blob으로 저장
//! - Keychain을 쓸 수 없으면 평문 fallback (경고 로그)

pub mod crypto;
pub mod vault;

pub use crypto::{CryptoError, EncryptionProvider};
pub use vault::{
    is_already_migrated_format, MigrationReport, SecretVault, TokenName, TokenPair, VaultError,
};
