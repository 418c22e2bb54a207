//! Lunch Money v1 API 클라이언트
//!
//! `Authorization: Bearer <token>`으로 인증합니다.

use std::sync::Arc;

use crate::error::BridgeError;
use crate::secrets::{SecretVault, TokenName};
use crate::upstream::read_json;
use crate::upstream::types::{AssetsResponse, InsertRequest, InsertResult, InsertTransaction};

const LUNCH_MONEY_API_BASE: &str = "https://dev.lunchmoney.app/v1";
const SERVICE: &str = "Lunch Money";

pub struct LunchMoneyClient {
    vault: Arc<SecretVault>,
    http: reqwest::Client,
    base_url: String,
}

impl LunchMoneyClient {
    pub fn new(vault: Arc<SecretVault>, http: reqwest::Client) -> Self {
        Self {
            vault,
            http,
            base_url: LUNCH_MONEY_API_BASE.to_string(),
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
        let token = self.vault.get_decrypted_token(TokenName::LunchMoney);
        if token.is_empty() {
            return Err(BridgeError::TokenMissing { service: SERVICE });
        }
        Ok(token)
    }

    /// 수동 관리 자산 목록
    pub async fn get_assets(&self) -> Result<AssetsResponse, BridgeError> {
        let token = self.token()?;
        let url = format!("{}/assets", self.base_url);

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        read_json(SERVICE, response).await
    }

    /// 거래 일괄 등록 (고정 정책 플래그 포함)
    pub async fn insert_transactions(
        &self,
        transactions: &[InsertTransaction],
    ) -> Result<InsertResult, BridgeError> {
        let token = self.token()?;
        let url = format!("{}/transactions", self.base_url);
        let body = InsertRequest::new(transactions);

        tracing::debug!(
            count = transactions.len(),
            body = %serde_json::to_string(&body)?,
            "inserting transactions"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let result: InsertResult = read_json(SERVICE, response).await?;
        tracing::debug!(ids = ?result.ids, error = ?result.error, "lunch money response");
        Ok(result)
    }
}
