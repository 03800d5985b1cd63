//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::response::Response;
use chrono::{TimeZone, Utc};
use rstest::rstest;
use taskboard_core::BoardRegistry;
use taskboard_core::domain::{
    CookieMutation, CookieOptions, RequestCookies, StoreError, TaskDraft, User,
};
use taskboard_core::impls::{FixedSessionResolver, InMemoryTaskStore, StoreCall};
use taskboard_core::ports::{FixedClock, Identity, Resolution, SessionResolver};
use taskboard_web::view::VIEW_COOKIE;
use taskboard_web::{AppState, router};
use tower::ServiceExt;

fn store() -> InMemoryTaskStore {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    InMemoryTaskStore::new(Arc::new(clock))
}

fn app_with(store: &InMemoryTaskStore, resolver: Arc<dyn SessionResolver>) -> AppState {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let boards = BoardRegistry::new(Arc::new(store.clone()), Arc::new(clock));
    AppState::new(boards, resolver)
}

fn app(store: &InMemoryTaskStore, resolver: FixedSessionResolver) -> AppState {
    app_with(store, Arc::new(resolver))
}

/// A browser tab: replays the view cookie it was given.
struct Visitor {
    state: AppState,
    view_cookie: Option<String>,
}

impl Visitor {
    fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            view_cookie: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.view_cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        let response = router(self.state.clone()).oneshot(request).await.unwrap();
        if let Some(pair) = view_cookie_set(&response) {
            self.view_cookie = Some(pair);
        }
        response
    }

    async fn page(&mut self) -> String {
        body_text(self.send(get("/")).await).await
    }

    async fn status(&mut self) -> serde_json::Value {
        let response = self.send(get("/status")).await;
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_str(&body_text(response).await).unwrap()
    }
}

fn set_cookies(response: &Response) -> Vec<&str> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect()
}

/// `tb_view=<id>` from the response, if one was issued.
fn view_cookie_set(response: &Response) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{VIEW_COOKIE}=")))
        .and_then(|c| c.split(';').next())
        .map(str::to_string)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn first_visit_issues_view_cookie_once() {
    let store = store();
    let state = app(&store, FixedSessionResolver::anonymous());
    let mut tab = Visitor::new(&state);

    let first = tab.send(get("/")).await;
    assert_eq!(first.status(), StatusCode::OK);
    let issued = set_cookies(&first);
    assert_eq!(issued.len(), 1);
    assert!(issued[0].contains("Path=/"));
    assert!(issued[0].contains("HttpOnly"));
    assert!(issued[0].contains("SameSite=Lax"));
    assert!(body_text(first).await.contains("No tasks available yet"));

    let second = tab.send(get("/")).await;
    assert!(view_cookie_set(&second).is_none());
    assert_eq!(state.boards.len().await, 1);
}

#[tokio::test]
async fn unknown_view_cookie_is_replaced() {
    let state = app(&store(), FixedSessionResolver::anonymous());

    let request = Request::get("/")
        .header(header::COOKIE, format!("{VIEW_COOKIE}=forged"))
        .body(Body::empty())
        .unwrap();
    let response = router(state.clone()).oneshot(request).await.unwrap();

    let issued = view_cookie_set(&response).unwrap();
    assert_ne!(issued, format!("{VIEW_COOKIE}=forged"));
}

#[tokio::test]
async fn reload_after_failed_load_fetches_again() {
    let store = store();
    store.seed(TaskDraft::new("survivor", "row")).await;
    store.fail_next(StoreError::Network("down".into())).await;
    let state = app(&store, FixedSessionResolver::anonymous());
    let mut tab = Visitor::new(&state);

    assert!(!tab.page().await.contains("survivor"));
    assert!(tab.page().await.contains("survivor"));
    assert_eq!(store.calls().await, vec![StoreCall::List, StoreCall::List]);
}

#[tokio::test]
async fn reload_picks_up_rows_written_elsewhere() {
    let store = store();
    let state = app(&store, FixedSessionResolver::anonymous());
    let mut tab = Visitor::new(&state);
    tab.page().await;

    store.seed(TaskDraft::new("from another tab", "x")).await;

    assert!(tab.page().await.contains("from another tab"));
}

#[tokio::test]
async fn visitors_do_not_share_view_state() {
    let store = store();
    let state = app(&store, FixedSessionResolver::anonymous());
    let mut a = Visitor::new(&state);
    let mut b = Visitor::new(&state);
    a.page().await;
    b.page().await;

    // description missing: create is refused and the draft stays with A
    a.send(post_form("/tasks", "title=secret+A")).await;

    assert!(a.page().await.contains("value=\"secret A\""));
    assert!(!b.page().await.contains("secret A"));
    assert_eq!(state.boards.len().await, 2);
}

#[tokio::test]
async fn create_edit_delete_through_forms() {
    let store = store();
    let state = app(&store, FixedSessionResolver::anonymous());
    let mut tab = Visitor::new(&state);
    tab.page().await;

    let created = tab
        .send(post_form("/tasks", "title=Buy+milk&description=2+litres"))
        .await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&created), "/");
    let page = tab.page().await;
    assert!(page.contains("Buy milk"));
    assert!(page.contains("/tasks/1/edit"));

    let opened = tab.send(post("/tasks/1/edit")).await;
    assert_eq!(opened.status(), StatusCode::SEE_OTHER);
    assert!(tab.page().await.contains("<dialog open"));

    tab.send(post_form(
        "/tasks/edit",
        "title=Buy+oat+milk&description=1+litre",
    ))
    .await;
    let page = tab.page().await;
    assert!(page.contains("Buy oat milk"));
    assert!(!page.contains("<dialog"));

    let deleted = tab.send(post("/tasks/1/delete")).await;
    assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
    assert!(tab.page().await.contains("No tasks available yet"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn cancel_closes_modal_without_saving() {
    let store = store();
    store.seed(TaskDraft::new("keep", "me")).await;
    let state = app(&store, FixedSessionResolver::anonymous());
    let mut tab = Visitor::new(&state);
    tab.page().await;

    tab.send(post("/tasks/1/edit")).await;
    let cancelled = tab.send(post("/tasks/edit/cancel")).await;
    assert_eq!(cancelled.status(), StatusCode::SEE_OTHER);

    let status = tab.status().await;
    assert_eq!(status["edit_open"], false);
    assert!(status["editing"].is_null());
}

#[tokio::test]
async fn editing_unlisted_task_is_not_found() {
    let state = app(&store(), FixedSessionResolver::anonymous());
    let mut tab = Visitor::new(&state);

    let response = tab.send(post("/tasks/42/edit")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_is_json() {
    let store = store();
    store.seed(TaskDraft::new("a", "b")).await;
    let state = app(&store, FixedSessionResolver::anonymous());
    let mut tab = Visitor::new(&state);
    tab.page().await;

    let json = tab.status().await;
    assert_eq!(json["tasks"], 1);
    assert_eq!(json["mounted"], true);
    assert_eq!(json["loading"], false);
}

#[rstest]
#[case::anonymous_admin(FixedSessionResolver::anonymous(), "/admin", StatusCode::TEMPORARY_REDIRECT)]
#[case::anonymous_admin_dashboard(FixedSessionResolver::anonymous(), "/admin/dashboard", StatusCode::TEMPORARY_REDIRECT)]
#[case::anonymous_public(FixedSessionResolver::anonymous(), "/public", StatusCode::NOT_FOUND)]
#[case::anonymous_login(FixedSessionResolver::anonymous(), "/login", StatusCode::OK)]
#[case::anonymous_status(FixedSessionResolver::anonymous(), "/status", StatusCode::OK)]
#[case::signed_in_admin(FixedSessionResolver::authenticated(User::new("u1")), "/admin", StatusCode::OK)]
#[case::signed_in_admin_dashboard(FixedSessionResolver::authenticated(User::new("u1")), "/admin/dashboard", StatusCode::OK)]
#[tokio::test]
async fn gate_matrix(
    #[case] resolver: FixedSessionResolver,
    #[case] uri: &str,
    #[case] expected: StatusCode,
) {
    let state = app(&store(), resolver);
    let response = router(state).oneshot(get(uri)).await.unwrap();

    assert_eq!(response.status(), expected, "{uri}");
    if expected == StatusCode::TEMPORARY_REDIRECT {
        assert_eq!(location(&response), "/login");
    }
}

#[rstest]
#[case::on_redirect("/admin")]
#[case::on_pass_through("/login")]
#[tokio::test]
async fn staged_cookies_become_set_cookie_headers(#[case] uri: &str) {
    let resolver = FixedSessionResolver::anonymous().with_cookies(vec![CookieMutation::remove(
        "sb-x-auth-token",
        CookieOptions::default().with_path("/"),
    )]);
    let state = app(&store(), resolver);

    let response = router(state).oneshot(get(uri)).await.unwrap();

    assert!(
        set_cookies(&response).contains(&"sb-x-auth-token=; Path=/; Max-Age=0"),
        "{uri}"
    );
}

/// Signs in whoever presents `session=ok`.
struct CookieCheck;

#[async_trait]
impl SessionResolver for CookieCheck {
    async fn resolve(&self, cookies: &RequestCookies) -> Resolution {
        match cookies.get("session") {
            Some("ok") => Resolution::new(Identity::Authenticated(User::new("u1"))),
            _ => Resolution::anonymous(),
        }
    }
}

#[tokio::test]
async fn request_cookies_reach_the_resolver() {
    let state = app_with(&store(), Arc::new(CookieCheck));

    let request = Request::get("/admin")
        .header(header::COOKIE, "theme=dark; session=ok")
        .body(Body::empty())
        .unwrap();
    let response = router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::get("/admin")
        .header(header::COOKIE, "session=nope")
        .body(Body::empty())
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}
