//! 업스트림 REST API 클라이언트
//!
//! - Monobank: 클라이언트 정보, 계좌 거래 내역
//! - Lunch Money: 자산 목록, 거래 등록
//!
//! 두 클라이언트 모두 상태가 없고, 호출마다 Vault에서 토큰을 꺼냅니다.

pub mod lunch_money;
pub mod monobank;
pub mod types;

pub use lunch_money::LunchMoneyClient;
pub use monobank::MonobankClient;

use serde::de::DeserializeOwned;

use crate::error::BridgeError;

/// 응답 status 확인 후 JSON 파싱 (non-2xx는 status/body 그대로 보존)
async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, BridgeError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(service, status = status.as_u16(), "upstream request failed");
        return Err(BridgeError::Upstream {
            service,
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
