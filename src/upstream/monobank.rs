//! Monobank personal API 클라이언트
//!
//! 모든 요청은 Vault에서 복호화한 토큰을 `X-Token` 헤더로 보냅니다.
//! 토큰이 없으면 네트워크 호출 없이 바로 실패합니다.

use std::sync::Arc;

use crate::error::BridgeError;
use crate::secrets::{SecretVault, TokenName};
use crate::upstream::types::{ClientInfo, StatementItem};
use crate::upstream::read_json;

const MONOBANK_API_BASE: &str = "https://api.monobank.ua";
const SERVICE: &str = "Monobank";

pub struct MonobankClient {
    vault: Arc<SecretVault>,
    http: reqwest::Client,
    base_url: String,
}

impl MonobankClient {
    pub fn new(vault: Arc<SecretVault>, http: reqwest::Client) -> Self {
        Self {
            vault,
            http,
            base_url: MONOBANK_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(vault: Arc<SecretVault>, base_url: impl Into<String>) -> Self {
        Self {
            vault,
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn token(&self) -> Result<String, BridgeError> {
        let token = self.vault.get_decrypted_token(TokenName::Monobank);
        if token.is_empty() {
            return Err(BridgeError::TokenMissing { service: SERVICE });
        }
        Ok(token)
    }

    /// 클라이언트 정보 (계좌/저금통 목록)
    pub async fn get_client_info(&self) -> Result<ClientInfo, BridgeError> {
        let token = self.token()?;
        let url = format!("{}/personal/client-info", self.base_url);

        tracing::debug!("fetching monobank client info");

        let response = self.http.get(&url).header("X-Token", token).send().await?;
        read_json(SERVICE, response).await
    }

    /// 계좌 거래 내역 (`from`/`to`는 Unix timestamp, 초)
    pub async fn get_statement(
        &self,
        account: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<StatementItem>, BridgeError> {
        let token = self.token()?;
        // account는 경로 세그먼트 1개로만 들어가야 함 (`/`, `?`, `#` 인코딩)
        let url = format!(
            "{}/personal/statement/{}/{}/{}",
            self.base_url,
            urlencoding::encode(account),
            from,
            to
        );

        tracing::debug!(account, from, to, "fetching monobank statement");

        let response = self.http.get(&url).header("X-Token", token).send().await?;
        read_json(SERVICE, response).await
    }
}
