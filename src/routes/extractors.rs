// ============================================================================
// Axum Extractors
// ============================================================================
//
// - AuthenticatedUser: the requesting user's name, established by AuthManager
//
// ============================================================================

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::context::AppContext;

/// Name of the user making the request
///
/// Usage:
/// ```ignore
/// async fn handler(user: AuthenticatedUser, ...) -> AppResult<...> {
///     let user_name = user.0;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let user = state
            .auth_manager
            .authenticate(&parts.headers)
            .map_err(IntoResponse::into_response)?;

        tracing::trace!(
            user = %state.config.logging.user_label(&user),
            "AuthenticatedUser extracted"
        );

        Ok(AuthenticatedUser(user))
    }
}
