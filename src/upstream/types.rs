//! 업스트림 API 요청/응답 타입 정의

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// 응답 타입은 선언하지 않은 필드도 `extra`로 받아서 UI에 그대로 넘깁니다.

// =====================================
// Monobank
// =====================================

/// `GET /personal/client-info` 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_hook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub jars: Vec<Jar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 카드/계좌
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_id: Option<String>,
    /// 최소 화폐 단위 (копійки)
    pub balance: i64,
    #[serde(default)]
    pub credit_limit: i64,
    #[serde(rename = "type", default)]
    pub account_type: String,
    /// ISO 4217 숫자 코드
    pub currency_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback_type: Option<String>,
    #[serde(default)]
    pub masked_pan: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 저금통 (Банка)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jar {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub currency_code: i32,
    pub balance: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /personal/statement/{account}/{from}/{to}` 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementItem {
    pub id: String,
    /// Unix timestamp (초)
    pub time: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mcc: i32,
    #[serde(default)]
    pub original_mcc: i32,
    #[serde(default)]
    pub hold: bool,
    pub amount: i64,
    #[serde(default)]
    pub operation_amount: i64,
    pub currency_code: i32,
    #[serde(default)]
    pub commission_rate: i64,
    #[serde(default)]
    pub cashback_amount: i64,
    #[serde(default)]
    pub balance: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_edrpou: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_iban: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =====================================
// Lunch Money
// =====================================

/// `GET /assets` 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsResponse {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 수동 관리 자산 (manually-managed account)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    #[serde(default)]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype_name: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// 소수 문자열 ("1201.0100")
    #[serde(default)]
    pub balance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_as_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_base: Option<f64>,
    #[serde(default)]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_transactions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 거래 금액: 숫자 또는 소수 문자열 ("-5.00")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

/// Insert 요청의 거래 1건
///
/// 알려진 필드 외의 값은 `extra`로 그대로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertTransaction {
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /transactions` 요청 본문 (고정 정책 포함)
#[derive(Debug, Serialize)]
pub struct InsertRequest<'a> {
    pub transactions: &'a [InsertTransaction],
    pub apply_rules: bool,
    pub skip_duplicates: bool,
    pub check_for_recurring: bool,
    pub debit_as_negative: bool,
    pub skip_balance_update: bool,
}

impl<'a> InsertRequest<'a> {
    /// 제품 정책으로 고정된 플래그. 호출자가 바꿀 수 없음
    pub fn new(transactions: &'a [InsertTransaction]) -> Self {
        Self {
            transactions,
            apply_rules: true,
            skip_duplicates: true,
            check_for_recurring: true,
            debit_as_negative: true,
            skip_balance_update: false,
        }
    }
}

/// `POST /transactions` 응답
///
/// Lunch Money는 검증 실패도 200 + `error` 배열로 돌려줄 수 있습니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsertResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}
