//! Access Gate as axum middleware.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use taskboard_core::GateDecision;
use taskboard_core::domain::{CookieMutation, RequestCookies};
use tracing::warn;

use crate::state::AppState;

pub async fn gate_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let cookies = request_cookies(request.headers());
    let path = request.uri().path().to_string();

    let (mut response, staged) = match state.gate.check(&path, &cookies).await {
        GateDecision::Redirect { location, cookies } => {
            (Redirect::temporary(&location).into_response(), cookies)
        }
        GateDecision::PassThrough { cookies } => (next.run(request).await, cookies),
    };

    append_cookies(&mut response, &staged);
    response
}

pub(crate) fn request_cookies(headers: &HeaderMap) -> RequestCookies {
    RequestCookies::from_headers(
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok()),
    )
}

pub(crate) fn append_cookies(response: &mut Response, staged: &[CookieMutation]) {
    for mutation in staged {
        match HeaderValue::from_str(&mutation.to_set_cookie()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(cookie = mutation.name(), error = %e, "dropping unencodable cookie"),
        }
    }
}
