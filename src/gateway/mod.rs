//! API Gateway - UI용 로컬 HTTP 서버
//!
//! 상태 머신: `Stopped → Starting → Listening → Stopping → Stopped`
//!
//! - `start`는 이미 Listening이면 아무것도 하지 않음 (기존 주소 반환)
//! - `stop`은 이미 Stopped면 아무것도 하지 않음
//! - `stop`은 진행 중인 요청을 유예 시간까지만 기다리고, 넘으면 서버 태스크를 중단
//! - Gateway 1개당 리스너는 최대 1개

pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::upstream::{LunchMoneyClient, MonobankClient};

pub use routes::create_router;

/// graceful shutdown 유예 시간 기본값
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub monobank: Arc<MonobankClient>,
    pub lunch_money: Arc<LunchMoneyClient>,
}

/// Gateway 에러 (시작 실패만 존재)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to bind gateway on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// 리스너 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Stopped,
    Starting,
    Listening,
    Stopping,
}

/// 실행 중인 서버 핸들
struct LiveListener {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct Inner {
    state: GatewayState,
    listener: Option<LiveListener>,
}

pub struct Gateway {
    app_state: AppState,
    shutdown_grace: Duration,
    inner: Mutex<Inner>,
}

impl Gateway {
    pub fn new(app_state: AppState) -> Self {
        Self {
            app_state,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            inner: Mutex::new(Inner {
                state: GatewayState::Stopped,
                listener: None,
            }),
        }
    }

    /// stop 시 진행 중인 요청을 기다리는 최대 시간
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub async fn state(&self) -> GatewayState {
        self.inner.lock().await.state
    }

    /// 실행 중이면 리스닝 주소
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().await.listener.as_ref().map(|l| l.addr)
    }

    /// `127.0.0.1:port`에서 서버 시작 (port 0이면 임의 포트)
    pub async fn start(&self, port: u16) -> Result<SocketAddr, GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(live) = &inner.listener {
            tracing::debug!(addr = %live.addr, "gateway already listening");
            return Ok(live.addr);
        }

        inner.state = GatewayState::Starting;

        let requested = SocketAddr::from(([127, 0, 0, 1], port));
        let bound = match tokio::net::TcpListener::bind(requested).await {
            Ok(listener) => listener
                .local_addr()
                .map(|addr| (listener, addr)),
            Err(e) => Err(e),
        };
        let (listener, addr) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                inner.state = GatewayState::Stopped;
                return Err(GatewayError::Bind {
                    addr: requested,
                    source,
                });
            }
        };

        let router = create_router(self.app_state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "gateway server error");
            }
        });

        inner.listener = Some(LiveListener {
            addr,
            shutdown_tx,
            task,
        });
        inner.state = GatewayState::Listening;

        tracing::info!("gateway is running on http://localhost:{}", addr.port());
        Ok(addr)
    }

    /// 서버 종료 (graceful, 유예 시간 제한) 후 소켓 해제까지 대기
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        let Some(live) = inner.listener.take() else {
            inner.state = GatewayState::Stopped;
            return;
        };

        inner.state = GatewayState::Stopping;
        tracing::info!(addr = %live.addr, "stopping gateway");

        let _ = live.shutdown_tx.send(());
        let mut task = live.task;
        match tokio::time::timeout(self.shutdown_grace, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "gateway task ended abnormally"),
            Err(_) => {
                tracing::warn!(
                    grace_ms = self.shutdown_grace.as_millis() as u64,
                    "in-flight requests did not finish in time, aborting gateway"
                );
                task.abort();
                let _ = task.await;
            }
        }

        inner.state = GatewayState::Stopped;
        tracing::info!("gateway stopped");
    }
}
