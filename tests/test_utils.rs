#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use board_server::{
    config::{
        AuthConfig, AuthMode, Config, DbConfig, LoggingConfig, OneTimeTokenConfig, TrackingConfig,
    },
    context::AppContext,
    create_router,
    store::{InMemoryPostStore, PostStore},
};
use http_body_util::BodyExt;
use std::{collections::HashMap, sync::Arc};
use tower::ServiceExt;

pub const ADMIN: &str = "admin";
pub const GUEST1: &str = "guest1";
pub const GUEST2: &str = "guest2";

pub struct TestApp {
    pub router: Router,
    pub context: Arc<AppContext>,
    pub posts: Arc<InMemoryPostStore>,
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        bind_address: "127.0.0.1".to_string(),
        rust_log: "info".to_string(),
        display_utc_offset_secs: 9 * 3600,
        db: DbConfig {
            url: None,
            max_connections: 1,
            acquire_timeout_secs: 1,
        },
        tracking: TrackingConfig {
            secret: "test_tracking_secret_that_is_long_enough_0123456789".to_string(),
            cookie_name: "tracking_id".to_string(),
            cookie_ttl_secs: 86400,
        },
        one_time_token: OneTimeTokenConfig {
            ttl_secs: 0,
            purge_interval_secs: 300,
        },
        auth: AuthConfig {
            mode: AuthMode::Basic,
            admin_user: ADMIN.to_string(),
            users: HashMap::from([
                (ADMIN.to_string(), "apple".to_string()),
                (GUEST1.to_string(), "1234".to_string()),
                (GUEST2.to_string(), "5678".to_string()),
            ]),
            realm: "Enter username and password.".to_string(),
            trusted_header: "x-remote-user".to_string(),
        },
        logging: LoggingConfig {
            enable_user_identifiers: true,
            hash_salt: "test_salt".to_string(),
        },
    }
}

pub fn spawn_app() -> TestApp {
    let posts = Arc::new(InMemoryPostStore::new());
    let context = Arc::new(AppContext::new(
        Arc::new(test_config()),
        posts.clone() as Arc<dyn PostStore>,
    ));

    TestApp {
        router: create_router(context.clone()),
        context,
        posts,
    }
}

/// Same app wiring on top of an arbitrary store
pub fn spawn_app_with_store(store: Arc<dyn PostStore>) -> (Router, Arc<AppContext>) {
    let context = Arc::new(AppContext::new(Arc::new(test_config()), store));
    (create_router(context.clone()), context)
}

pub fn password_for(user: &str) -> &'static str {
    match user {
        ADMIN => "apple",
        GUEST1 => "1234",
        GUEST2 => "5678",
        _ => "wrong",
    }
}

pub fn basic_auth(user: &str) -> String {
    format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", user, password_for(user)))
    )
}

pub fn get_request(path: &str, user: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(path)
        .header(header::AUTHORIZATION, basic_auth(user));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(path: &str, user: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, basic_auth(user))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Value of the first `oneTimeToken` hidden input in a rendered page
pub fn extract_token(html: &str) -> String {
    let marker = "name=\"oneTimeToken\" value=\"";
    let start = html.find(marker).expect("token input missing") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

/// `name=value` part of the tracking cookie set on a response, if any
pub fn tracking_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("tracking_id="))
        .map(|v| v.split(';').next().unwrap().to_string())
}

/// Render the listing as `user` and return the token it minted
pub async fn fetch_token(app: &TestApp, user: &str) -> String {
    let response = send(&app.router, get_request("/posts", user, None)).await;
    extract_token(&body_string(response).await)
}

pub async fn create_post(app: &TestApp, user: &str, content: &str) -> Response<Body> {
    let token = fetch_token(app, user).await;
    let body = format!(
        "content={}&oneTimeToken={}",
        urlencode(content),
        token
    );
    send(&app.router, form_request("/posts", user, &body)).await
}

pub fn urlencode(value: &str) -> String {
    serde_urlencoded::to_string(&[("v", value)]).unwrap()[2..].to_string()
}
