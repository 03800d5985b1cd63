//! Per-visitor board lookup.
//!
//! `tb_view` cookie で訪問者のビューを引き当て、TaskBoard を
//! request extension としてハンドラへ渡す。新しいビューなら cookie を発行する。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskboard_core::domain::{CookieMutation, CookieOptions, SameSite, ViewId};
use tracing::debug;

use crate::gate::{append_cookies, request_cookies};
use crate::state::AppState;

pub const VIEW_COOKIE: &str = "tb_view";

pub async fn view_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = request_cookies(request.headers())
        .get(VIEW_COOKIE)
        .and_then(|raw| raw.parse::<ViewId>().ok());

    let opened = state.boards.open(requested).await;
    request.extensions_mut().insert(opened.board);

    let mut response = next.run(request).await;
    if opened.fresh {
        debug!(view = %opened.id, "issuing view cookie");
        let options = CookieOptions::default()
            .with_path("/")
            .with_same_site(SameSite::Lax)
            .http_only();
        append_cookies(
            &mut response,
            &[CookieMutation::set(VIEW_COOKIE, opened.id.to_string(), options)],
        );
    }
    response
}
