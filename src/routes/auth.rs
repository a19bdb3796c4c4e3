// ============================================================================
// Authentication Routes
// ============================================================================
//
// - GET /logout - answers 401 with the Basic challenge so the browser drops
//   its cached credentials
//
// ============================================================================

use axum::{
    extract::State,
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::context::AppContext;

pub const LOGGED_OUT_MESSAGE: &str = "ログアウトしました";

/// GET /logout
pub async fn logout(State(app_context): State<Arc<AppContext>>) -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, LOGGED_OUT_MESSAGE).into_response();

    if let Some(challenge) = app_context.auth_manager.challenge() {
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
    }

    response
}
