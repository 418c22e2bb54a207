//! MonoLunch Error Types
//!
//! 업스트림 호출 / 게이트웨이 / 프로세스 경계 에러 타입 정의

use serde::Serialize;
use thiserror::Error;

use crate::secrets::VaultError;
use crate::store::StoreError;

/// 업스트림 클라이언트 에러
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{service} token not configured. Please add your token in Settings.")]
    TokenMissing { service: &'static str },

    #[error("{service} API error ({status}): {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// 게이트웨이 응답 HTTP status
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::TokenMissing { .. }
            | BridgeError::Upstream { .. }
            | BridgeError::Validation(_) => 400,
            BridgeError::Http(_) | BridgeError::Decode(_) | BridgeError::Internal(_) => 500,
        }
    }
}

/// 프로세스 경계 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<StoreError> for CommandError {
    fn from(error: StoreError) -> Self {
        // details: UI가 분기할 수 있는 기계용 정보 (io 에러 종류, JSON 위치)
        let (code, details) = match &error {
            StoreError::Io(e) => ("IO_ERROR", Some(format!("{:?}", e.kind()))),
            StoreError::Serialization(e) => (
                "SERIALIZATION_ERROR",
                Some(format!("line {}, column {}", e.line(), e.column())),
            ),
            StoreError::Corrupted(_) => ("STORE_CORRUPTED", None),
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<VaultError> for CommandError {
    fn from(error: VaultError) -> Self {
        match error {
            VaultError::Store(e) => e.into(),
            VaultError::Crypto(e) => CommandError {
                code: "CRYPTO_ERROR".to_string(),
                message: format!("Secret vault error: {}", e),
                details: None,
            },
        }
    }
}

/// 프로세스 경계 명령 결과 타입
pub type CommandResult<T> = Result<T, CommandError>;
