// ============================================================================
// Post Routes
// ============================================================================
//
// Endpoints:
// - GET  /posts        - listing; mints a fresh one-time token for the viewer
// - POST /posts        - create (content, oneTimeToken)
// - POST /posts/delete - delete (id, oneTimeToken); author or admin only
//
// Any other method on these paths is a Bad Request.
//
// ============================================================================

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::{Html, Redirect},
};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::models::{
    authorize_delete, CreatePostForm, DeleteOutcome, DeletePostForm, NewPost, PostOrder,
    PostView, PostsPage,
};
use crate::one_time_token::TokenClaim;
use crate::routes::extractors::AuthenticatedUser;
use crate::utils::{extract_client_ip, user_agent};

pub const POSTS_PATH: &str = "/posts";

/// GET /posts
pub async fn list_posts(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    cookies: Cookies,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> AppResult<Html<String>> {
    let tracking_id = ctx.tracking.ensure_tracking_id(&cookies, user.name());

    let offset = ctx.config.display_offset();
    let posts = ctx
        .posts
        .find_all(PostOrder::IdDesc)
        .await?
        .into_iter()
        .map(|post| PostView::new(post, user.name(), ctx.admin_user(), &offset))
        .collect();

    let one_time_token = ctx.tokens.issue(user.name());

    let html = ctx.renderer.render_posts(&PostsPage {
        posts,
        user: user.name().to_string(),
        one_time_token,
    })?;

    tracing::info!(
        user = %ctx.config.logging.user_label(user.name()),
        tracking_id = %tracking_id,
        remote_address = %extract_client_ip(&headers, connect_info.map(|c| c.0.ip())),
        user_agent = %user_agent(&headers),
        "Posts viewed"
    );

    Ok(Html(html))
}

/// POST /posts
pub async fn create_post(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    cookies: Cookies,
    body: Bytes,
) -> AppResult<Redirect> {
    let tracking_id = ctx.tracking.ensure_tracking_id(&cookies, user.name());

    let form: CreatePostForm = parse_form(&body)?;
    let mut claim = claim_token(&ctx, &user, &form.one_time_token)?;

    let created = ctx
        .posts
        .create(NewPost {
            content: form.content,
            tracking_cookie: tracking_id,
            posted_by: user.name().to_string(),
        })
        .await;
    let post = claim.restore_on_err(created)?;
    claim.commit();

    tracing::info!(
        user = %ctx.config.logging.user_label(user.name()),
        post_id = post.id,
        tracking_id = %post.tracking_cookie,
        content_length = post.content.chars().count(),
        "Post created"
    );

    Ok(Redirect::to(POSTS_PATH))
}

/// POST /posts/delete
pub async fn delete_post(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Redirect> {
    let form: DeletePostForm = parse_form(&body)?;
    let mut claim = claim_token(&ctx, &user, &form.one_time_token)?;

    let found = ctx.posts.find_by_id(form.id).await;
    let post = claim.restore_on_err(found)?;
    let refusal = match authorize_delete(post.as_ref(), user.name(), ctx.admin_user()) {
        DeleteOutcome::Authorized => None,
        DeleteOutcome::NotFound => Some(AppError::not_found(format!("post {}", form.id))),
        DeleteOutcome::Forbidden => Some(AppError::forbidden(format!(
            "user {} may not delete post {}",
            ctx.config.logging.user_label(user.name()),
            form.id
        ))),
    };
    if let Some(err) = refusal {
        claim.restore();
        return Err(err);
    }

    let destroyed = ctx.posts.destroy(form.id).await;
    // Another request may have deleted it since the lookup
    if !claim.restore_on_err(destroyed)? {
        claim.restore();
        return Err(AppError::not_found(format!("post {}", form.id)));
    }
    claim.commit();

    tracing::info!(
        user = %ctx.config.logging.user_label(user.name()),
        post_id = form.id,
        remote_address = %extract_client_ip(&headers, connect_info.map(|c| c.0.ip())),
        user_agent = %user_agent(&headers),
        "Post deleted"
    );

    Ok(Redirect::to(POSTS_PATH))
}

/// Fallback for unsupported methods on post routes
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// GET / just sends browsers to the listing
pub async fn index() -> Redirect {
    Redirect::to(POSTS_PATH)
}

/// Decode an `application/x-www-form-urlencoded` body; field order is irrelevant
fn parse_form<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_urlencoded::from_bytes(body).map_err(|e| AppError::malformed(e.to_string()))
}

fn claim_token<'a>(
    ctx: &'a AppContext,
    user: &AuthenticatedUser,
    submitted: &str,
) -> AppResult<TokenClaim<'a>> {
    ctx.tokens.claim(user.name(), submitted).ok_or_else(|| {
        tracing::warn!(
            user = %ctx.config.logging.user_label(user.name()),
            "One-time token mismatch"
        );
        AppError::TokenMismatch
    })
}
