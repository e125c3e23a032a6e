use anyhow::Result;
use sqlx::{PgConnection, Row};

use crate::app::engagement::fetch_comments;
use crate::domain::post::{Post, PostDetail, PostSummary};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Every post, newest first. Posts sharing a `created_at` come back in
    /// whatever order the planner produces.
    pub async fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let rows = sqlx::query(
            "SELECT id, title, author, created_at, view_count, like_count \
             FROM board.posts \
             ORDER BY created_at DESC",
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(PostSummary {
                id: row.get("id"),
                title: row.get("title"),
                author: row.get("author"),
                created_at: row.get("created_at"),
                view_count: row.get("view_count"),
                like_count: row.get("like_count"),
            });
        }

        Ok(posts)
    }

    pub async fn create_post(&self, title: &str, author: &str, content: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO board.posts (title, author, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(title)
        .bind(author)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        Ok(id)
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let mut conn = self.db.pool().acquire().await?;
        fetch_post(&mut *conn, post_id).await
    }

    /// Counts a view and gathers the detail page on a single connection.
    ///
    /// The view is counted before the post is looked up, so a missing post
    /// costs one UPDATE that matches nothing.
    pub async fn view_post(&self, post_id: i64, user_ip: &str) -> Result<Option<PostDetail>> {
        let mut conn = self.db.pool().acquire().await?;

        sqlx::query("UPDATE board.posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *conn)
            .await?;

        let Some(post) = fetch_post(&mut *conn, post_id).await? else {
            return Ok(None);
        };

        let comments = fetch_comments(&mut *conn, post_id).await?;

        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM board.likes WHERE post_id = $1 AND user_ip = $2)",
        )
        .bind(post_id)
        .bind(user_ip)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(PostDetail {
            post,
            comments,
            liked,
        }))
    }

    /// Returns whether a row matched; callers treat a miss as success.
    pub async fn update_post(&self, post_id: i64, title: &str, content: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE board.posts SET title = $2, content = $3, updated_at = now() WHERE id = $1",
        )
        .bind(post_id)
        .bind(title)
        .bind(content)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM board.posts WHERE id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every listed post in one transaction. Nothing is removed if
    /// any step fails; the uncommitted transaction rolls back on drop.
    pub async fn delete_posts(&self, post_ids: &[i64]) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query("DELETE FROM board.posts WHERE id = ANY($1)")
            .bind(post_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}

async fn fetch_post(conn: &mut PgConnection, post_id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(
        "SELECT id, title, author, content, created_at, updated_at, view_count, like_count \
         FROM board.posts \
         WHERE id = $1",
    )
    .bind(post_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|row| Post {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        view_count: row.get("view_count"),
        like_count: row.get("like_count"),
    }))
}
