// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - posts.rs: Listing, create and delete endpoints
// - auth.rs: Logout
// - health.rs: Health check endpoint
// - extractors.rs: Custom Axum extractors (AuthenticatedUser)
// - middleware.rs: Request logging, security headers
//
// ============================================================================

mod auth;
mod extractors;
mod health;
mod middleware;
mod posts;

pub use extractors::AuthenticatedUser;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::config::MAX_REQUEST_BODY_SIZE;
use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(posts::index))
        .route(
            "/posts",
            get(posts::list_posts)
                .post(posts::create_post)
                .fallback(posts::method_not_allowed),
        )
        .route(
            "/posts/delete",
            post(posts::delete_post).fallback(posts::method_not_allowed),
        )
        .route("/logout", get(auth::logout))
        .route("/health", get(health::health_check))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .layer(CookieManagerLayer::new())
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                // Tracing layer (outermost - runs first)
                .layer(TraceLayer::new_for_http())
                // Request logging
                .layer(axum::middleware::from_fn(middleware::request_logging))
                // Security headers
                .layer(axum::middleware::from_fn(middleware::add_security_headers))
                .into_inner(),
        )
        .with_state(app_context)
}
