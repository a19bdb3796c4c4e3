use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::DbConfig;
use crate::error::AppResult;
use crate::models::{NewPost, Post, PostOrder};
use crate::store::PostStore;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str, config: &DbConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

/// Postgres-backed post storage
#[derive(Clone)]
pub struct PgPostStore {
    pool: DbPool,
}

impl PgPostStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_all(&self, order: PostOrder) -> AppResult<Vec<Post>> {
        let query = match order {
            PostOrder::IdDesc => {
                r#"
                SELECT id, content, posted_by, tracking_cookie, created_at, updated_at
                FROM posts
                ORDER BY id DESC
                "#
            }
        };

        let posts = sqlx::query_as::<_, Post>(query)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, content, posted_by, tracking_cookie, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn create(&self, post: NewPost) -> AppResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (content, posted_by, tracking_cookie)
            VALUES ($1, $2, $3)
            RETURNING id, content, posted_by, tracking_cookie, created_at, updated_at
            "#,
        )
        .bind(post.content)
        .bind(post.posted_by)
        .bind(post.tracking_cookie)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn destroy(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
