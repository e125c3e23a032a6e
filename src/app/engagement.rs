use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use crate::domain::engagement::{Comment, LikeToggle};
use crate::infra::db::Db;

/// SQLSTATE raised when an insert references a missing row.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct EngagementService {
    db: Db,
}

impl EngagementService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Returns `None` when the post does not exist.
    pub async fn comment_post(
        &self,
        post_id: i64,
        author: &str,
        content: &str,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "INSERT INTO board.comments (post_id, author, content) VALUES ($1, $2, $3) \
             RETURNING id, post_id, author, content, created_at",
        )
        .bind(post_id)
        .bind(author)
        .bind(content)
        .fetch_one(self.db.pool())
        .await;

        match row {
            Ok(row) => Ok(Some(comment_from_row(&row))),
            Err(err) if is_foreign_key_violation(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Flips the like held by `user_ip` on a post.
    ///
    /// The post row is locked for the duration, so concurrent toggles on the
    /// same post apply one after another and `like_count` tracks the rows in
    /// `board.likes`. Returns `None` when the post does not exist.
    pub async fn toggle_like(&self, post_id: i64, user_ip: &str) -> Result<Option<LikeToggle>> {
        let mut tx = self.db.pool().begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM board.posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM board.likes WHERE post_id = $1 AND user_ip = $2")
            .bind(post_id)
            .bind(user_ip)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let outcome = if removed > 0 {
            sqlx::query("UPDATE board.posts SET like_count = like_count - $2 WHERE id = $1")
                .bind(post_id)
                .bind(removed as i64)
                .execute(&mut *tx)
                .await?;
            LikeToggle::Removed
        } else {
            let inserted = sqlx::query(
                "INSERT INTO board.likes (post_id, user_ip) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(user_ip)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                sqlx::query("UPDATE board.posts SET like_count = like_count + 1 WHERE id = $1")
                    .bind(post_id)
                    .execute(&mut *tx)
                    .await?;
            }
            LikeToggle::Added
        };

        tx.commit().await?;
        Ok(Some(outcome))
    }
}

/// Comments on a post, oldest first.
pub(crate) async fn fetch_comments(
    conn: &mut PgConnection,
    post_id: i64,
) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        "SELECT id, post_id, author, content, created_at \
         FROM board.comments \
         WHERE post_id = $1 \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(post_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.iter().map(comment_from_row).collect())
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author: row.get("author"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == FOREIGN_KEY_VIOLATION)
}
