use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub view_count: i64,
    pub like_count: i64,
}

/// Row shape of the board listing; the body is not loaded.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub created_at: OffsetDateTime,
    pub view_count: i64,
    pub like_count: i64,
}

/// A post together with everything its detail page shows.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<crate::domain::engagement::Comment>,
    pub liked: bool,
}
