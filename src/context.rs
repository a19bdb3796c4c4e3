use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::Config;
use crate::one_time_token::OneTimeTokenStore;
use crate::render::{HtmlRenderer, Renderer};
use crate::store::PostStore;
use crate::tracking::TrackingCookieManager;

/// Application context containing shared dependencies
///
/// Handlers receive it as `State<Arc<AppContext>>`; nothing request-related
/// lives in globals.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub posts: Arc<dyn PostStore>,
    pub tokens: Arc<OneTimeTokenStore>,
    pub tracking: Arc<TrackingCookieManager>,
    pub auth_manager: Arc<AuthManager>,
    pub renderer: Arc<dyn Renderer>,
}

impl AppContext {
    /// Creates a new application context with the default HTML renderer
    pub fn new(config: Arc<Config>, posts: Arc<dyn PostStore>) -> Self {
        let renderer = Arc::new(HtmlRenderer::new(config.auth.admin_user.clone()));
        Self::with_renderer(config, posts, renderer)
    }

    pub fn with_renderer(
        config: Arc<Config>,
        posts: Arc<dyn PostStore>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            tokens: Arc::new(OneTimeTokenStore::new(&config.one_time_token)),
            tracking: Arc::new(TrackingCookieManager::new(&config.tracking)),
            auth_manager: Arc::new(AuthManager::new(&config.auth)),
            config,
            posts,
            renderer,
        }
    }

    pub fn admin_user(&self) -> &str {
        &self.config.auth.admin_user
    }
}
