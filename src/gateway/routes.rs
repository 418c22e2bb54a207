//! Gateway Routes

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::gateway::handlers;
use crate::gateway::AppState;

pub fn create_router(state: AppState) -> Router {
    // UI는 별도 origin(WebView / dev server)에서 호출
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/", get(handlers::health))
        // Monobank
        .route("/monobank/client-info", get(handlers::monobank_client_info))
        .route(
            "/monobank/transactions/:account/:from/:to",
            get(handlers::monobank_transactions),
        )
        // Lunch Money
        .route("/lunchmoney/assets", get(handlers::lunch_money_assets))
        .route("/lunchmoney/transactions", post(handlers::lunch_money_insert))
        .fallback(handlers::not_found)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
