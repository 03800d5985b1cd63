//! taskboard-web
//!
//! HTTP surface of the task board: HTML page, form posts and the access gate.
//!
//! # ルート
//! - `GET /` 一覧（初回表示で load）
//! - `POST /tasks` 作成、`POST /tasks/{id}/edit` 編集開始、`POST /tasks/edit` 保存、
//!   `POST /tasks/edit/cancel` 取消、`POST /tasks/{id}/delete` 削除
//! - `GET /status` 状態（JSON）
//! - `GET /admin`（配下も）保護ページ、`GET /login` ログイン
//!
//! すべてのリクエストは先に AccessGate を通り、その後 `tb_view` cookie で
//! 訪問者ごとの TaskBoard を引き当てる。

use axum::{
    Router, middleware,
    routing::{get, post},
};
use taskboard_core::config::ServerSettings;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub mod error;
pub mod gate;
pub mod page;
pub mod routes;
pub mod state;
pub mod view;

use routes::{
    admin_handler, cancel_edit_handler, create_handler, delete_handler, index_handler,
    login_handler, not_found_handler, request_edit_handler, save_edit_handler, status_handler,
};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/tasks", post(create_handler))
        .route("/tasks/edit", post(save_edit_handler))
        .route("/tasks/edit/cancel", post(cancel_edit_handler))
        .route("/tasks/{id}/edit", post(request_edit_handler))
        .route("/tasks/{id}/delete", post(delete_handler))
        .route("/status", get(status_handler))
        .route("/admin", get(admin_handler))
        .route("/admin/{*rest}", get(admin_handler))
        .route("/login", get(login_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            view::view_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: &ServerSettings, state: AppState) -> anyhow::Result<()> {
    let address = settings.bind_address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
