// ============================================================================
// Post Storage
// ============================================================================
//
// Handlers only talk to `PostStore`. Two backends:
// - db::PgPostStore: Postgres through sqlx (production)
// - InMemoryPostStore: process-local, used without DATABASE_URL and in tests
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::{NewPost, Post, PostOrder};

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_all(&self, order: PostOrder) -> AppResult<Vec<Post>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Post>>;

    async fn create(&self, post: NewPost) -> AppResult<Post>;

    /// Returns false when no post had this id
    async fn destroy(&self, id: i64) -> AppResult<bool>;

    /// Cheap liveness check for /health
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    posts: Vec<Post>,
    next_id: i64,
}

/// Post store kept in process memory; ids start at 1 and are never reused
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    state: RwLock<MemoryState>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.posts.len()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn find_all(&self, order: PostOrder) -> AppResult<Vec<Post>> {
        let mut posts = self.state.read().await.posts.clone();
        match order {
            PostOrder::IdDesc => posts.sort_by(|a, b| b.id.cmp(&a.id)),
        }
        Ok(posts)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Post>> {
        Ok(self
            .state
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create(&self, post: NewPost) -> AppResult<Post> {
        let mut state = self.state.write().await;
        state.next_id += 1;

        let now = Utc::now();
        let post = Post {
            id: state.next_id,
            content: post.content,
            posted_by: post.posted_by,
            tracking_cookie: post.tracking_cookie,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());

        Ok(post)
    }

    async fn destroy(&self, id: i64) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        Ok(state.posts.len() != before)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
