use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

/// Display format for post timestamps, e.g. 2024年01月02日 03時04分05秒
pub const CREATED_AT_FORMAT: &str = "%Y年%m月%d日 %H時%M分%S秒";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub posted_by: String,
    /// Tracking id of the browser that created the post
    pub tracking_cookie: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub content: String,
    pub tracking_cookie: String,
    pub posted_by: String,
}

/// Ordering for `PostStore::find_all`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// Newest first
    #[default]
    IdDesc,
}

/// A post prepared for the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub id: i64,
    pub content: String,
    pub posted_by: String,
    pub tracking_cookie: String,
    pub formatted_created_at: String,
    /// Whether the viewer may delete this post
    pub deletable: bool,
}

impl PostView {
    pub fn new(post: Post, viewer: &str, admin_user: &str, offset: &FixedOffset) -> Self {
        let deletable = authorize_delete(Some(&post), viewer, admin_user) == DeleteOutcome::Authorized;
        Self {
            formatted_created_at: format_created_at(&post.created_at, offset),
            id: post.id,
            content: post.content,
            posted_by: post.posted_by,
            tracking_cookie: post.tracking_cookie,
            deletable,
        }
    }
}

/// Everything the listing template needs
#[derive(Debug, Clone)]
pub struct PostsPage {
    pub posts: Vec<PostView>,
    pub user: String,
    pub one_time_token: String,
}

/// Outcome of a delete request once the token check has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Authorized,
    Forbidden,
    NotFound,
}

/// Only the author or the admin identity may delete a post
pub fn authorize_delete(post: Option<&Post>, user: &str, admin_user: &str) -> DeleteOutcome {
    match post {
        None => DeleteOutcome::NotFound,
        Some(post) if post.posted_by == user || user == admin_user => DeleteOutcome::Authorized,
        Some(_) => DeleteOutcome::Forbidden,
    }
}

pub fn format_created_at(created_at: &DateTime<Utc>, offset: &FixedOffset) -> String {
    created_at
        .with_timezone(offset)
        .format(CREATED_AT_FORMAT)
        .to_string()
}

// ============================================================================
// Request bodies (application/x-www-form-urlencoded)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostForm {
    pub content: String,
    #[serde(rename = "oneTimeToken")]
    pub one_time_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletePostForm {
    pub id: i64,
    #[serde(rename = "oneTimeToken")]
    pub one_time_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(posted_by: &str) -> Post {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 15, 4, 5).unwrap();
        Post {
            id: 1,
            content: "hello".to_string(),
            posted_by: posted_by.to_string(),
            tracking_cookie: "1_abc".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    fn tokyo() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_format_created_at_in_tokyo() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 15, 4, 5).unwrap();
        assert_eq!(
            format_created_at(&created_at, &tokyo()),
            "2024年01月02日 00時04分05秒"
        );
    }

    #[test]
    fn test_authorize_delete() {
        let post = post("guest1");
        assert_eq!(
            authorize_delete(Some(&post), "guest1", "admin"),
            DeleteOutcome::Authorized
        );
        assert_eq!(
            authorize_delete(Some(&post), "admin", "admin"),
            DeleteOutcome::Authorized
        );
        assert_eq!(
            authorize_delete(Some(&post), "guest2", "admin"),
            DeleteOutcome::Forbidden
        );
        assert_eq!(
            authorize_delete(None, "admin", "admin"),
            DeleteOutcome::NotFound
        );
    }

    #[test]
    fn test_post_view_deletable() {
        let offset = tokyo();
        assert!(PostView::new(post("guest1"), "guest1", "admin", &offset).deletable);
        assert!(PostView::new(post("guest1"), "admin", "admin", &offset).deletable);
        assert!(!PostView::new(post("guest1"), "guest2", "admin", &offset).deletable);
    }

    #[test]
    fn test_forms_ignore_field_order() {
        let form: DeletePostForm =
            serde_urlencoded::from_str("oneTimeToken=abc&id=12").unwrap();
        assert_eq!(form.id, 12);
        assert_eq!(form.one_time_token, "abc");

        let form: CreatePostForm =
            serde_urlencoded::from_str("oneTimeToken=abc&content=a+b%26c%3D").unwrap();
        assert_eq!(form.content, "a b&c=");
    }

    #[test]
    fn test_forms_reject_missing_fields() {
        assert!(serde_urlencoded::from_str::<CreatePostForm>("content=hi").is_err());
        assert!(serde_urlencoded::from_str::<DeletePostForm>("oneTimeToken=abc").is_err());
        assert!(serde_urlencoded::from_str::<DeletePostForm>("id=x&oneTimeToken=abc").is_err());
    }
}
