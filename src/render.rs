// ============================================================================
// Listing Page Rendering
// ============================================================================
//
// Handlers hand a `PostsPage` to a `Renderer`. `HtmlRenderer` writes the page
// directly; every interpolated value goes through `escape_html`.
//
// ============================================================================

use std::fmt::Write;

use crate::error::{AppError, AppResult};
use crate::models::{PostView, PostsPage};
use crate::utils::escape_html;

pub trait Renderer: Send + Sync {
    fn render_posts(&self, page: &PostsPage) -> AppResult<String>;
}

#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    admin_user: String,
}

impl HtmlRenderer {
    pub fn new(admin_user: impl Into<String>) -> Self {
        Self {
            admin_user: admin_user.into(),
        }
    }

    fn write_page(&self, out: &mut String, page: &PostsPage) -> std::fmt::Result {
        let user = escape_html(&page.user);
        let token = escape_html(&page.one_time_token);

        out.push_str("<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str("<title>秘密の匿名掲示板</title>\n");
        out.push_str("</head>\n<body>\n");
        out.push_str("<h1>秘密の匿名掲示板</h1>\n");
        writeln!(
            out,
            "<p>ユーザー: {} <a href=\"/logout\">ログアウト</a></p>",
            user
        )?;

        out.push_str("<form method=\"post\" action=\"/posts\">\n");
        out.push_str("<textarea name=\"content\" cols=\"40\" rows=\"4\"></textarea>\n");
        writeln!(
            out,
            "<input type=\"hidden\" name=\"oneTimeToken\" value=\"{}\">",
            token
        )?;
        out.push_str("<button type=\"submit\">投稿</button>\n</form>\n");

        for post in &page.posts {
            self.write_post(out, post, &page.user, &token)?;
        }

        out.push_str("</body>\n</html>\n");
        Ok(())
    }

    fn write_post(
        &self,
        out: &mut String,
        post: &PostView,
        viewer: &str,
        escaped_token: &str,
    ) -> std::fmt::Result {
        let is_admin = viewer == self.admin_user;
        let author = if is_admin || post.posted_by == viewer {
            escape_html(&post.posted_by)
        } else {
            "匿名".to_string()
        };

        writeln!(out, "<div class=\"post\" id=\"post-{}\">", post.id)?;
        writeln!(out, "<h3>{}</h3>", post.id)?;
        writeln!(
            out,
            "<p style=\"white-space: pre-wrap;\">{}</p>",
            escape_html(&post.content)
        )?;
        writeln!(
            out,
            "<p>投稿日時: {} 投稿者: {}</p>",
            escape_html(&post.formatted_created_at),
            author
        )?;
        if is_admin {
            writeln!(
                out,
                "<p>トラッキングID: {}</p>",
                escape_html(&post.tracking_cookie)
            )?;
        }
        if post.deletable {
            out.push_str("<form method=\"post\" action=\"/posts/delete\">\n");
            writeln!(
                out,
                "<input type=\"hidden\" name=\"id\" value=\"{}\">",
                post.id
            )?;
            writeln!(
                out,
                "<input type=\"hidden\" name=\"oneTimeToken\" value=\"{}\">",
                escaped_token
            )?;
            out.push_str("<button type=\"submit\">削除</button>\n</form>\n");
        }
        out.push_str("</div>\n");
        Ok(())
    }
}

impl Renderer for HtmlRenderer {
    fn render_posts(&self, page: &PostsPage) -> AppResult<String> {
        let mut out = String::with_capacity(1024 + page.posts.len() * 512);
        self.write_page(&mut out, page)
            .map_err(|e| AppError::Render(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: i64, content: &str, posted_by: &str, deletable: bool) -> PostView {
        PostView {
            id,
            content: content.to_string(),
            posted_by: posted_by.to_string(),
            tracking_cookie: "1415006921459705_273013fc".to_string(),
            formatted_created_at: "2024年01月02日 00時04分05秒".to_string(),
            deletable,
        }
    }

    fn page(user: &str, posts: Vec<PostView>) -> PostsPage {
        PostsPage {
            posts,
            user: user.to_string(),
            one_time_token: "0123456789abcdef".to_string(),
        }
    }

    #[test]
    fn test_script_content_is_escaped() {
        let renderer = HtmlRenderer::new("admin");
        let html = renderer
            .render_posts(&page(
                "guest1",
                vec![view(1, "<script>alert('test');</script>", "guest1", true)],
            ))
            .unwrap();

        assert!(html.contains("&lt;script&gt;alert('test');&lt;/script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn test_token_embedded_in_forms() {
        let renderer = HtmlRenderer::new("admin");
        let html = renderer
            .render_posts(&page("guest1", vec![view(1, "hi", "guest1", true)]))
            .unwrap();

        assert_eq!(
            html.matches("name=\"oneTimeToken\" value=\"0123456789abcdef\"")
                .count(),
            2
        );
        assert!(html.contains("action=\"/posts/delete\""));
        assert!(html.contains("name=\"id\" value=\"1\""));
    }

    #[test]
    fn test_delete_form_only_when_deletable() {
        let renderer = HtmlRenderer::new("admin");
        let html = renderer
            .render_posts(&page("guest2", vec![view(1, "hi", "guest1", false)]))
            .unwrap();

        assert!(!html.contains("/posts/delete"));
        // Other users' names are hidden from non-admins
        assert!(!html.contains("guest1"));
        assert!(html.contains("匿名"));
    }

    #[test]
    fn test_admin_sees_author_and_tracking_id() {
        let renderer = HtmlRenderer::new("admin");
        let html = renderer
            .render_posts(&page("admin", vec![view(1, "hi", "guest1", true)]))
            .unwrap();

        assert!(html.contains("投稿者: guest1"));
        assert!(html.contains("トラッキングID: 1415006921459705_273013fc"));
    }

    #[test]
    fn test_user_name_is_escaped() {
        let renderer = HtmlRenderer::new("admin");
        let html = renderer.render_posts(&page("<b>x</b>", vec![])).unwrap();

        assert!(html.contains("ユーザー: &lt;b&gt;x&lt;/b&gt;"));
    }
}
