//! Gateway Handlers
//!
//! 핸들러마다 업스트림 클라이언트 호출 1회 + 에러를 JSON(`{error, timestamp}`)으로 변환.
//! 업스트림 실패가 리스너까지 전파되는 일은 없습니다.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::BridgeError;
use crate::gateway::AppState;
use crate::upstream::types::InsertTransaction;

/// Gateway 에러 응답
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    timestamp: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 에러 종류에 따른 status (업스트림/검증 400, 그 외 500)
    fn from_bridge(error: BridgeError) -> Self {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.message, "request failed");
        } else {
            tracing::warn!(status = self.status.as_u16(), error = %self.message, "request rejected");
        }

        let body = ErrorBody {
            error: self.message,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

/// `GET /`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Gateway server is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /monobank/client-info`
pub async fn monobank_client_info(State(state): State<AppState>) -> Response {
    match state.monobank.get_client_info().await {
        Ok(info) => Json(info).into_response(),
        Err(e) => ApiError::bad_request(e.to_string()).into_response(),
    }
}

/// `GET /monobank/transactions/:account/:from/:to`
pub async fn monobank_transactions(
    State(state): State<AppState>,
    Path((account, from, to)): Path<(String, String, String)>,
) -> Response {
    let (from, to) = match (parse_epoch("from", &from), parse_epoch("to", &to)) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(e), _) | (_, Err(e)) => return e.into_response(),
    };

    match state.monobank.get_statement(&account, from, to).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => ApiError::bad_request(e.to_string()).into_response(),
    }
}

fn parse_epoch(name: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        ApiError::bad_request(format!(
            "Invalid request: '{}' must be a Unix timestamp, got '{}'",
            name, raw
        ))
    })
}

/// `GET /lunchmoney/assets`
pub async fn lunch_money_assets(State(state): State<AppState>) -> Response {
    match state.lunch_money.get_assets().await {
        Ok(assets) => Json(assets).into_response(),
        Err(e) => ApiError::from_bridge(e).into_response(),
    }
}

/// `POST /lunchmoney/transactions`
///
/// 본문 검증 실패는 400, 클라이언트 호출 실패는 500.
pub async fn lunch_money_insert(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let transactions = match validate_insert_body(body) {
        Ok(transactions) => transactions,
        Err(e) => return e.into_response(),
    };

    match state.lunch_money.insert_transactions(&transactions).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn validate_insert_body(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Vec<InsertTransaction>, ApiError> {
    let Json(mut body) = body.map_err(|e| {
        ApiError::bad_request(format!("Invalid request: {}", e.body_text()))
    })?;

    let transactions = match body.get_mut("transactions").map(Value::take) {
        Some(list @ Value::Array(_)) => list,
        _ => {
            return Err(ApiError::bad_request(
                "Invalid request: transactions array required",
            ))
        }
    };

    serde_json::from_value(transactions)
        .map_err(|e| ApiError::bad_request(format!("Invalid request: malformed transaction: {}", e)))
}

/// 라우트 없음
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}
