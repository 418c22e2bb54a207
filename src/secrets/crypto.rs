//! Encryption Provider - OS 키체인 기반 토큰 암호화
//!
//! - 마스터키는 Keychain에서 1회 로드 (`monolunch:master_key_v1`), 없으면 생성
//! - 토큰은 XChaCha20-Poly1305로 개별 암호화 후 base64로 인코딩
//! - Keychain을 쓸 수 없는 환경에서는 평문 fallback (경고 로그)
//!
//! Blob 포맷 (v1): `base64(version(1) || nonce(24) || ciphertext+tag)`
//! AAD: version 바이트 (포맷 바인딩)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use keyring::Entry;
use rand::Rng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Keychain 서비스 이름
const KEYCHAIN_SERVICE: &str = "com.monolunch.app";
/// 마스터키 Keychain 키
const MASTER_KEY_KEYCHAIN_KEY: &str = "monolunch:master_key_v1";

/// Blob 포맷 버전
pub const BLOB_VERSION: u8 = 1;

/// 마스터키 길이 (256-bit)
pub const MASTER_KEY_LEN: usize = 32;

/// Nonce 길이 (XChaCha20-Poly1305용 24 bytes)
pub const NONCE_LEN: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Invalid master key format")]
    InvalidMasterKey,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Zeroize가 적용된 마스터키 래퍼
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl MasterKey {
    /// 마스터키 생성 (CSPRNG)
    fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        rand::thread_rng().fill(&mut bytes);
        Self { bytes }
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new((&self.bytes).into())
    }
}

/// OS 기반 암호화 capability
///
/// 나머지 코드는 이 enum만 바라보고 작성되며, 어떤 variant인지는
/// 앱 시작 시 [`EncryptionProvider::probe`]가 결정합니다.
pub enum EncryptionProvider {
    /// Keychain 마스터키로 암호화
    OsBacked(MasterKey),
    /// Keychain 사용 불가: 평문 그대로 저장
    PlaintextFallback,
}

impl EncryptionProvider {
    /// Keychain을 확인해 provider 선택
    ///
    /// 1. Keychain에서 마스터키 로드
    /// 2. 엔트리가 없으면 새로 생성하고 저장
    /// 3. Keychain 자체를 쓸 수 없으면 PlaintextFallback
    pub fn probe() -> Self {
        match load_master_key_from_keychain() {
            Ok(key) => {
                tracing::info!("master key loaded from keychain");
                Self::OsBacked(key)
            }
            Err(KeychainLookup::NoEntry) => {
                tracing::info!("no master key found, generating new one");
                let key = MasterKey::generate();
                match save_master_key_to_keychain(&key) {
                    Ok(()) => Self::OsBacked(key),
                    Err(e) => {
                        tracing::warn!(error = %e, "keychain unavailable, tokens will be stored in plain text");
                        Self::PlaintextFallback
                    }
                }
            }
            Err(KeychainLookup::Failed(e)) => {
                tracing::warn!(error = %e, "keychain unavailable, tokens will be stored in plain text");
                Self::PlaintextFallback
            }
        }
    }

    /// 이미 확보한 마스터키로 OsBacked provider 생성
    pub fn from_master_key(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self::OsBacked(MasterKey { bytes })
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::OsBacked(_))
    }

    /// 평문 토큰 암호화
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let key = match self {
            Self::OsBacked(key) => key,
            Self::PlaintextFallback => {
                tracing::warn!("encryption not available, storing token in plain text");
                return Ok(plaintext.to_string());
            }
        };

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce);

        let aad = [BLOB_VERSION];
        let ciphertext = key
            .cipher()
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(blob))
    }

    /// Blob 복호화 (실패 시 에러 반환)
    pub fn try_decrypt(&self, blob: &str) -> Result<String, CryptoError> {
        if blob.is_empty() {
            return Ok(String::new());
        }

        let key = match self {
            Self::OsBacked(key) => key,
            Self::PlaintextFallback => {
                tracing::warn!("encryption not available, returning token as-is");
                return Ok(blob.to_string());
            }
        };

        let raw = BASE64
            .decode(blob)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid encoding: {}", e)))?;

        if raw.len() <= 1 + NONCE_LEN {
            return Err(CryptoError::DecryptionFailed("blob too short".to_string()));
        }
        if raw[0] != BLOB_VERSION {
            return Err(CryptoError::DecryptionFailed(format!(
                "unsupported blob version {}",
                raw[0]
            )));
        }

        let (nonce, ciphertext) = raw[1..].split_at(NONCE_LEN);
        let mut plaintext = key
            .cipher()
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &raw[..1],
                },
            )
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        let result = String::from_utf8(plaintext.clone())
            .map_err(|_| CryptoError::DecryptionFailed("plaintext is not UTF-8".to_string()));

        // 평문 메모리 지우기
        plaintext.zeroize();

        result
    }

    /// Blob 복호화. 실패하면 빈 문자열로 degrade
    pub fn decrypt(&self, blob: &str) -> String {
        match self.try_decrypt(blob) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decrypt token");
                String::new()
            }
        }
    }
}

enum KeychainLookup {
    NoEntry,
    Failed(CryptoError),
}

/// Keychain에서 마스터키 로드
fn load_master_key_from_keychain() -> Result<MasterKey, KeychainLookup> {
    let entry = Entry::new(KEYCHAIN_SERVICE, MASTER_KEY_KEYCHAIN_KEY)
        .map_err(|e| KeychainLookup::Failed(CryptoError::Keychain(e.to_string())))?;

    let mut password = match entry.get_password() {
        Ok(password) => password,
        Err(keyring::Error::NoEntry) => return Err(KeychainLookup::NoEntry),
        Err(e) => return Err(KeychainLookup::Failed(CryptoError::Keychain(e.to_string()))),
    };

    let decoded = BASE64.decode(&password);
    password.zeroize();

    let mut bytes = decoded.map_err(|_| KeychainLookup::Failed(CryptoError::InvalidMasterKey))?;
    if bytes.len() != MASTER_KEY_LEN {
        bytes.zeroize();
        return Err(KeychainLookup::Failed(CryptoError::InvalidMasterKey));
    }

    let mut key = MasterKey {
        bytes: [0u8; MASTER_KEY_LEN],
    };
    key.bytes.copy_from_slice(&bytes);
    bytes.zeroize();

    Ok(key)
}

/// Keychain에 마스터키 저장
fn save_master_key_to_keychain(key: &MasterKey) -> Result<(), CryptoError> {
    let entry = Entry::new(KEYCHAIN_SERVICE, MASTER_KEY_KEYCHAIN_KEY)
        .map_err(|e| CryptoError::Keychain(e.to_string()))?;

    let mut encoded = BASE64.encode(key.bytes);
    let result = entry
        .set_password(&encoded)
        .map_err(|e| CryptoError::Keychain(e.to_string()));
    encoded.zeroize();

    result
}
