//! 테스트 공용 fixture: 임시 Vault + 로컬 업스트림 stub 서버

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::secrets::crypto::MASTER_KEY_LEN;
use crate::secrets::{EncryptionProvider, SecretVault, TokenPair};
use crate::store::{KvStore, STORE_FILE_NAME};

pub(crate) const TEST_MASTER_KEY: [u8; MASTER_KEY_LEN] = [0x34; MASTER_KEY_LEN];

/// 토큰이 저장된 임시 Vault (TempDir은 테스트가 끝날 때까지 살아 있어야 함)
pub(crate) fn vault_with_tokens(tokens: TokenPair) -> (TempDir, Arc<SecretVault>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = KvStore::open(dir.path().join(STORE_FILE_NAME));
    let vault = SecretVault::new(store, EncryptionProvider::from_master_key(TEST_MASTER_KEY));
    vault.save_tokens(&tokens).expect("save tokens");
    (dir, Arc::new(vault))
}

#[derive(Default)]
struct StubState {
    hits: AtomicUsize,
    last_path: Mutex<Option<String>>,
    last_headers: Mutex<HeaderMap>,
    last_body: Mutex<Option<Value>>,
}

impl StubState {
    fn record(&self, uri: &Uri, headers: &HeaderMap) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self.last_path.lock().unwrap() = Some(uri.path().to_string());
        *self.last_headers.lock().unwrap() = headers.clone();
    }
}

/// Monobank + Lunch Money API를 흉내 내는 로컬 서버
///
/// - `mono-rejected` / `lm-rejected` 토큰은 인증 실패 응답
/// - `mono-stall` 토큰은 응답하지 않음 (멈춘 업스트림)
/// - 그 외 토큰은 고정 fixture 응답
pub(crate) struct StubUpstream {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubUpstream {
    pub(crate) async fn spawn() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/personal/client-info", get(client_info))
            .route("/personal/statement/:account/:from/:to", get(statement))
            .route("/assets", get(assets))
            .route("/transactions", post(insert_transactions))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub upstream");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn last_path(&self) -> Option<String> {
        self.state.last_path.lock().unwrap().clone()
    }

    pub(crate) fn last_header(&self, name: &str) -> Option<String> {
        self.state
            .last_headers
            .lock()
            .unwrap()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub(crate) fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }
}

async fn client_info(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.record(&uri, &headers);
    let token = headers.get("x-token").and_then(|v| v.to_str().ok());
    if token == Some("mono-stall") {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    }
    if token == Some("mono-rejected") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "errorDescription": "Unknown 'X-Token'" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "clientId": "3MSaMMtczs",
            "name": "Тарас Шевченко",
            "webHookUrl": "",
            "permissions": "psfj",
            "accounts": [{
                "id": "kKGVoZuHWzqVoZuH",
                "sendId": "uHWzqVoZuH",
                "balance": 10000000,
                "creditLimit": 10000000,
                "type": "black",
                "currencyCode": 980,
                "cashbackType": "UAH",
                "maskedPan": ["537541******1234"],
                "iban": "UA733220010000026201234567890"
            }],
            "jars": []
        })),
    )
}

async fn statement(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    state.record(&uri, &headers);
    Json(json!([{
        "id": "ZuHWzqkKGVo=",
        "time": 1700000100,
        "description": "Покупка щастя",
        "mcc": 7997,
        "originalMcc": 7997,
        "hold": false,
        "amount": -95000,
        "operationAmount": -95000,
        "currencyCode": 980,
        "commissionRate": 0,
        "cashbackAmount": 19000,
        "balance": 10050000
    }]))
}

async fn assets(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.record(&uri, &headers);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer lm-rejected") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Access token does not exist." })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "assets": [{
                "id": 72,
                "type_name": "cash",
                "subtype_name": "physical cash",
                "name": "Monobank Black",
                "balance": "1201.0100",
                "balance_as_of": "2024-01-31T18:07:44.000Z",
                "currency": "uah",
                "institution_name": "Monobank",
                "exclude_transactions": false,
                "created_at": "2024-01-01T10:37:26.066Z"
            }]
        })),
    )
}

async fn insert_transactions(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record(&uri, &headers);
    *state.last_body.lock().unwrap() = Some(body);
    Json(json!({ "ids": [101] }))
}
