//! MonoLunch - Monobank ↔ Lunch Money 로컬 브리지
//!
//! 토큰 볼트(OS 키체인 기반 암호화), 계좌 매핑 저장소, 그리고 UI가 호출하는
//! 로컬 API 게이트웨이를 담당합니다.

pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mappings;
pub mod secrets;
pub mod store;
pub mod upstream;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use config::{AppConfig, ConfigError};
use gateway::{AppState, Gateway, GatewayError};
use mappings::AccountMappingStore;
use secrets::{EncryptionProvider, SecretVault};
use store::KvStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upstream::{LunchMoneyClient, MonobankClient};

/// 앱 시작 실패
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway startup failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Composition root: 프로세스당 1개
pub struct App {
    pub config: AppConfig,
    pub vault: Arc<SecretVault>,
    pub mappings: AccountMappingStore,
    pub gateway: Gateway,
}

impl App {
    /// 저장소 열기 → 레거시 토큰 마이그레이션 → 클라이언트/게이트웨이 구성
    ///
    /// 게이트웨이는 아직 시작하지 않습니다. 저장소 I/O 문제는 시작을 막지 않고
    /// 이후 명령 결과(`success: false`)로 드러납니다.
    pub fn bootstrap(config: AppConfig, crypto: EncryptionProvider) -> Result<Self, StartupError> {
        let store = KvStore::open(config.store_path());
        if let Some(backup) = store.recovered_backup() {
            tracing::warn!(backup = %backup.display(), "settings were reset after corruption");
        }

        let vault = Arc::new(SecretVault::new(store.clone(), crypto));
        let report = vault.migrate_legacy_tokens();
        tracing::info!(
            migrated = report.migrated,
            failed = report.failed,
            skipped = report.skipped,
            "token migration finished"
        );

        let http = reqwest::Client::new();
        let state = AppState {
            monobank: Arc::new(MonobankClient::new(vault.clone(), http.clone())),
            lunch_money: Arc::new(LunchMoneyClient::new(vault.clone(), http)),
        };

        Ok(Self {
            config,
            vault,
            mappings: AccountMappingStore::new(store),
            gateway: Gateway::new(state),
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "monolunch=info,monolunch_lib=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 앱 실행: 게이트웨이를 띄우고 Ctrl-C까지 대기한 뒤 종료
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(data_dir = %config.data_dir.display(), port = config.port, "starting MonoLunch");

    let app = App::bootstrap(config, EncryptionProvider::probe())?;
    app.gateway.start(app.config.port).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }

    // 리스닝 소켓 해제
    app.gateway.stop().await;
    Ok(())
}
