//! Page templates and the display rows they iterate over.

use askama::Template;
use axum::response::Html;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::domain::engagement::Comment;
use crate::domain::fms::{BreedCount, ChickInfo, Dashboard};
use crate::domain::post::{Post, PostSummary};
use crate::http::AppError;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn render<T: Template>(page: T) -> Result<Html<String>, AppError> {
    page.render().map(Html).map_err(|err| {
        tracing::error!(error = ?err, "failed to render template");
        AppError::internal("failed to render page")
    })
}

fn timestamp(value: OffsetDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).unwrap_or_default()
}

fn date(value: Date) -> String {
    value.format(DATE_FORMAT).unwrap_or_default()
}

pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub created_at: String,
    pub view_count: i64,
    pub like_count: i64,
}

impl From<PostSummary> for PostRow {
    fn from(post: PostSummary) -> Self {
        Self {
            id: post.id,
            title: post.title,
            author: post.author,
            created_at: timestamp(post.created_at),
            view_count: post.view_count,
            like_count: post.like_count,
        }
    }
}

pub struct PostView {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            author: post.author,
            content: post.content,
            created_at: timestamp(post.created_at),
            updated_at: post.updated_at.map(timestamp),
            view_count: post.view_count,
            like_count: post.like_count,
        }
    }
}

pub struct CommentView {
    pub author: String,
    pub content: String,
    pub created_at: String,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            author: comment.author,
            content: comment.content,
            created_at: timestamp(comment.created_at),
        }
    }
}

pub struct ChickRow {
    pub chick_no: String,
    pub breeds: String,
    pub gender: String,
    pub hatchday: String,
    pub egg_weight: String,
    pub farm: String,
}

impl From<ChickInfo> for ChickRow {
    fn from(chick: ChickInfo) -> Self {
        Self {
            chick_no: chick.chick_no,
            breeds: chick.breeds,
            gender: chick.gender.unwrap_or_default(),
            hatchday: date(chick.hatchday),
            egg_weight: weight(chick.egg_weight),
            farm: chick.farm.unwrap_or_default(),
        }
    }
}

fn weight(value: Option<f64>) -> String {
    value.map(|grams| format!("{:.1}", grams)).unwrap_or_default()
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub flashes: Vec<String>,
    pub posts: Vec<PostRow>,
}

#[derive(Template)]
#[template(path = "create.html")]
pub struct CreateTemplate {
    pub flashes: Vec<String>,
}

#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewTemplate {
    pub flashes: Vec<String>,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub liked: bool,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub flashes: Vec<String>,
    pub post: PostView,
}

#[derive(Template)]
#[template(path = "fms_dashboard.html")]
pub struct FmsDashboardTemplate {
    pub flashes: Vec<String>,
    pub total: i64,
    pub avg_weight: String,
    pub breed_stats: Vec<BreedCount>,
    pub recent_chicks: Vec<ChickRow>,
}

impl FmsDashboardTemplate {
    pub fn new(flashes: Vec<String>, dashboard: Dashboard) -> Self {
        Self {
            flashes,
            total: dashboard.summary.total,
            avg_weight: weight(dashboard.summary.avg_weight),
            breed_stats: dashboard.breed_stats,
            recent_chicks: dashboard.recent_chicks.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub flashes: Vec<String>,
    pub status: u16,
    pub message: &'a str,
}
