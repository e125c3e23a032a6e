use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Form, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::SignedCookieJar;
use serde::{Deserialize, Serialize};

use crate::app::engagement::EngagementService;
use crate::app::fms::FmsService;
use crate::app::posts::PostService;
use crate::domain::engagement::LikeToggle;
use crate::http::extract::PostId;
use crate::http::flash;
use crate::http::views::{
    render, CreateTemplate, EditTemplate, FmsDashboardTemplate, IndexTemplate, ViewTemplate,
};
use crate::http::AppError;
use crate::AppState;

const MSG_POST_NOT_FOUND: &str = "Post not found.";

type Page = Result<(SignedCookieJar, Html<String>), AppError>;
type Redirected = Result<(SignedCookieJar, Redirect), AppError>;

/// Present and non-empty. Whitespace-only input counts as present.
fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn post_url(post_id: i64) -> String {
    format!("/post/{}", post_id)
}

fn redirect_with(jar: SignedCookieJar, to: &str, message: impl Into<String>) -> Redirected {
    Ok((flash::push(jar, message), Redirect::to(to)))
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

pub async fn not_found() -> AppError {
    AppError::not_found("page not found")
}

pub async fn list_posts(State(state): State<AppState>, jar: SignedCookieJar) -> Page {
    let service = PostService::new(state.db.clone());
    let posts = service.list_posts().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list posts");
        AppError::internal("failed to list posts")
    })?;

    let (jar, flashes) = flash::take(jar);
    let page = render(IndexTemplate {
        flashes,
        posts: posts.into_iter().map(Into::into).collect(),
    })?;
    Ok((jar, page))
}

pub async fn create_form(jar: SignedCookieJar) -> Page {
    let (jar, flashes) = flash::take(jar);
    Ok((jar, render(CreateTemplate { flashes })?))
}

#[derive(Deserialize)]
pub struct CreatePostForm {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
}

pub async fn create_post(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CreatePostForm>,
) -> Redirected {
    let (Some(title), Some(author), Some(content)) =
        (filled(&form.title), filled(&form.author), filled(&form.content))
    else {
        return redirect_with(jar, "/create/", "Please fill in every field.");
    };

    let service = PostService::new(state.db.clone());
    let post_id = service
        .create_post(title, author, content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    tracing::info!(post_id, "post created");
    redirect_with(jar, &post_url(post_id), "Post created.")
}

pub async fn view_post(
    PostId(id): PostId,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let user_ip = addr.ip().to_string();
    let service = PostService::new(state.db.clone());
    let detail = service.view_post(id, &user_ip).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    let Some(detail) = detail else {
        return redirect_with(jar, "/", MSG_POST_NOT_FOUND).map(IntoResponse::into_response);
    };

    let (jar, flashes) = flash::take(jar);
    let page = render(ViewTemplate {
        flashes,
        post: detail.post.into(),
        comments: detail.comments.into_iter().map(Into::into).collect(),
        liked: detail.liked,
    })?;
    Ok((jar, page).into_response())
}

pub async fn edit_form(
    PostId(id): PostId,
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    let Some(post) = post else {
        return redirect_with(jar, "/", MSG_POST_NOT_FOUND).map(IntoResponse::into_response);
    };

    let (jar, flashes) = flash::take(jar);
    let page = render(EditTemplate {
        flashes,
        post: post.into(),
    })?;
    Ok((jar, page).into_response())
}

#[derive(Deserialize)]
pub struct EditPostForm {
    pub title: Option<String>,
    pub content: Option<String>,
}

pub async fn edit_post(
    PostId(id): PostId,
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<EditPostForm>,
) -> Redirected {
    let (Some(title), Some(content)) = (filled(&form.title), filled(&form.content)) else {
        return redirect_with(
            jar,
            &format!("/edit/{}", id),
            "Title and content are both required.",
        );
    };

    let service = PostService::new(state.db.clone());
    let updated = service
        .update_post(id, title, content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to update post");
            AppError::internal("failed to update post")
        })?;
    if !updated {
        tracing::debug!(post_id = id, "edit matched no post");
    }

    redirect_with(jar, &post_url(id), "Post updated.")
}

pub async fn delete_post(
    PostId(id): PostId,
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Redirected {
    let service = PostService::new(state.db.clone());
    let deleted = service.delete_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to delete post");
        AppError::internal("failed to delete post")
    })?;
    tracing::info!(post_id = id, deleted, "delete requested");

    redirect_with(jar, "/", "Post deleted.")
}

#[derive(Deserialize)]
pub struct CommentForm {
    pub author: Option<String>,
    pub content: Option<String>,
}

pub async fn comment_post(
    PostId(id): PostId,
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CommentForm>,
) -> Redirected {
    let (Some(author), Some(content)) = (filled(&form.author), filled(&form.content)) else {
        return redirect_with(jar, &post_url(id), "Author and content are both required.");
    };

    let service = EngagementService::new(state.db.clone());
    let comment = service
        .comment_post(id, author, content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = id, "failed to comment");
            AppError::internal("failed to comment")
        })?;

    match comment {
        Some(_) => redirect_with(jar, &post_url(id), "Comment added."),
        None => redirect_with(jar, "/", MSG_POST_NOT_FOUND),
    }
}

pub async fn like_post(
    PostId(id): PostId,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Redirected {
    let user_ip = addr.ip().to_string();
    let service = EngagementService::new(state.db.clone());
    let outcome = service.toggle_like(id, &user_ip).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, user_ip = %user_ip, "failed to toggle like");
        AppError::internal("failed to toggle like")
    })?;

    match outcome {
        Some(LikeToggle::Added) => redirect_with(jar, &post_url(id), "Like added."),
        Some(LikeToggle::Removed) => redirect_with(jar, &post_url(id), "Like removed."),
        None => redirect_with(jar, "/", MSG_POST_NOT_FOUND),
    }
}

#[derive(Deserialize)]
pub struct BatchDeleteForm {
    #[serde(default)]
    pub post_ids: Vec<String>,
}

/// Store and parse failures are reported to the user instead of failing the
/// request; nothing is deleted unless every id parses and the DELETE commits.
pub async fn delete_batch(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    axum_extra::extract::Form(form): axum_extra::extract::Form<BatchDeleteForm>,
) -> Redirected {
    if form.post_ids.is_empty() {
        return redirect_with(jar, "/", "Select at least one post to delete.");
    }

    let service = PostService::new(state.db.clone());
    let result = async {
        let ids = parse_post_ids(&form.post_ids)?;
        service.delete_posts(&ids).await?;
        anyhow::Ok(ids.len())
    }
    .await;

    match result {
        Ok(count) => {
            tracing::info!(count, "batch delete committed");
            redirect_with(jar, "/", format!("{} posts deleted.", count))
        }
        Err(err) => {
            tracing::error!(error = ?err, "batch delete failed");
            redirect_with(jar, "/", format!("Failed to delete posts: {}", err))
        }
    }
}

fn parse_post_ids(raw: &[String]) -> anyhow::Result<Vec<i64>> {
    raw.iter()
        .map(|value| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|err| anyhow::anyhow!("invalid post id {:?}: {}", value, err))
        })
        .collect()
}

pub async fn fms_dashboard(State(state): State<AppState>, jar: SignedCookieJar) -> Page {
    let service = FmsService::new(state.db.clone());
    let dashboard = service.dashboard().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to load fms dashboard");
        AppError::internal("failed to load dashboard")
    })?;

    let (jar, flashes) = flash::take(jar);
    Ok((jar, render(FmsDashboardTemplate::new(flashes, dashboard))?))
}
