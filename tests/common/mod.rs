#![allow(dead_code)]

use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tower::ServiceExt;

use corkboard::app::posts::PostService;
use corkboard::config::AppConfig;
use corkboard::domain::engagement::Comment;
use corkboard::domain::post::Post;
use corkboard::infra::db::Db;
use corkboard::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));

// ---------------------------------------------------------------------------
// TestApp: database prepared once per test binary, state built per test
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// A row of `board.likes`.
#[derive(Debug)]
pub struct Like {
    pub post_id: i64,
    pub user_ip: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    location: Option<String>,
    flash_cookie: Option<String>,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body_bytes).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(serde_json::Value::Null)
    }

    /// Target of a `303 See Other`.
    pub fn location(&self) -> &str {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "expected a redirect");
        self.location.as_deref().expect("redirect without Location")
    }

    /// `name=value` pair of the flash cookie set by this response, if any.
    pub fn flash_cookie(&self) -> Option<&str> {
        self.flash_cookie.as_deref()
    }
}

static DATABASE: OnceCell<()> = OnceCell::const_new();

/// Builds a TestApp for the calling test.
///
/// Each `#[tokio::test]` runs on its own runtime and a pool cannot outlive the
/// runtime that opened its connections, so only the database preparation is
/// shared. The pool, state and router are created fresh here.
pub async fn app() -> TestApp {
    DATABASE.get_or_init(prepare_database).await;

    let config = AppConfig::from_env().expect("failed to build AppConfig");
    let db = Db::connect(&config).await.expect("Db::connect failed");
    let state = AppState::new(db, &config);
    let router = corkboard::http::router(state.clone());

    TestApp { router, state }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

// ---------------------------------------------------------------------------
// Setup, runs once per test binary
// ---------------------------------------------------------------------------

async fn prepare_database() {
    let host = env_or("TEST_DB_HOST", "localhost");
    let port = env_or("TEST_DB_PORT", "5432");
    let user = env_or("TEST_DB_USER", "corkboard");
    let password = env_or("TEST_DB_PASSWORD", "corkboard");
    let test_db = env_or("TEST_DB_NAME", "corkboard_test");

    let options = PgConnectOptions::new()
        .host(&host)
        .port(port.parse().expect("TEST_DB_PORT must be a port number"))
        .username(&user)
        .password(&password);

    // ---- Create test database if needed ----
    let admin_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone().database("postgres"))
        .await
        .expect("cannot connect to postgres admin database");

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&test_db)
            .fetch_one(&admin_pool)
            .await
            .expect("failed to check test db existence");

    if !exists {
        // CREATE DATABASE cannot run inside a transaction
        sqlx::query(&format!("CREATE DATABASE \"{}\"", test_db))
            .execute(&admin_pool)
            .await
            .expect("failed to create test database");
    }
    admin_pool.close().await;

    // ---- Connect to test database ----
    let db_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options.database(&test_db))
        .await
        .expect("cannot connect to test database");

    // ---- Run migrations ----
    let mut migration_files: Vec<_> = std::fs::read_dir("migrations")
        .expect("cannot read migrations/")
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "sql"))
        .collect();
    migration_files.sort_by_key(|e| e.file_name());

    for entry in &migration_files {
        let sql = std::fs::read_to_string(entry.path())
            .unwrap_or_else(|_| panic!("cannot read {:?}", entry.path()));
        sqlx::raw_sql(&sql)
            .execute(&db_pool)
            .await
            .unwrap_or_else(|e| panic!("migration {:?} failed: {}", entry.file_name(), e));
    }

    // ---- Truncate all tables for clean test state ----
    sqlx::raw_sql(
        "TRUNCATE board.likes, board.comments, board.posts, fms.chick_info \
         RESTART IDENTITY CASCADE",
    )
    .execute(&db_pool)
    .await
    .expect("failed to truncate tables");

    db_pool.close().await;

    // ---- Point AppConfig at the test database ----
    std::env::set_var("DB_HOST", &host);
    std::env::set_var("DB_PORT", &port);
    std::env::set_var("DB_NAME", &test_db);
    std::env::set_var("DB_USER", &user);
    std::env::set_var("DB_PASSWORD", &password);
    std::env::set_var("SESSION_SECRET", STANDARD.encode([0x5a_u8; 64]));
    std::env::set_var("DB_MAX_CONNECTIONS", "4");
    std::env::set_var("DB_CONNECT_TIMEOUT_SECONDS", "30");
}

impl TestApp {
    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        form: Option<&str>,
        cookie: Option<&str>,
        ip: IpAddr,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = if let Some(form) = form {
            builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        // Handlers attribute likes to the peer address.
        let mut request = request;
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(ip, 40000)));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let flash_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter(|value| value.starts_with("flash="))
            .map(|value| value.split(';').next().unwrap_or_default().to_string())
            .last();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            location,
            flash_cookie,
            body_bytes,
        }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None, None, DEFAULT_IP).await
    }

    pub async fn post_form(&self, path: &str, form: &str) -> TestResponse {
        self.request(Method::POST, path, Some(form), None, DEFAULT_IP)
            .await
    }

    pub async fn post_form_from(&self, path: &str, form: &str, ip: IpAddr) -> TestResponse {
        self.request(Method::POST, path, Some(form), None, ip).await
    }

    /// Follows a redirect the way a browser would, sending back the flash
    /// cookie it set. Returns the rendered page.
    pub async fn follow(&self, resp: &TestResponse) -> TestResponse {
        self.request(
            Method::GET,
            resp.location(),
            None,
            resp.flash_cookie(),
            DEFAULT_IP,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Return the pool for direct DB assertions.
    pub fn pool(&self) -> &PgPool {
        self.state.db.pool()
    }

    /// Insert a post directly in DB. Returns its id.
    pub async fn create_post(&self, title: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO board.posts (title, author, content) VALUES ($1, 'tester', 'body') \
             RETURNING id",
        )
        .bind(title)
        .fetch_one(self.pool())
        .await
        .expect("insert test post failed")
    }

    pub async fn post(&self, post_id: i64) -> Option<Post> {
        PostService::new(self.state.db.clone())
            .get_post(post_id)
            .await
            .expect("get_post failed")
    }

    pub async fn likes(&self, post_id: i64) -> Vec<Like> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT post_id, user_ip FROM board.likes WHERE post_id = $1 ORDER BY user_ip",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .expect("list likes failed");

        rows.into_iter()
            .map(|(post_id, user_ip)| Like { post_id, user_ip })
            .collect()
    }

    pub async fn comments(&self, post_id: i64) -> Vec<Comment> {
        let rows: Vec<(i64, i64, String, String, OffsetDateTime)> = sqlx::query_as(
            "SELECT id, post_id, author, content, created_at FROM board.comments \
             WHERE post_id = $1 ORDER BY created_at, id",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .expect("list comments failed");

        rows.into_iter()
            .map(|(id, post_id, author, content, created_at)| Comment {
                id,
                post_id,
                author,
                content,
                created_at,
            })
            .collect()
    }

    pub async fn count_posts_titled(&self, title: &str) -> i64 {
        sqlx::query_scalar("SELECT count(*) FROM board.posts WHERE title = $1")
            .bind(title)
            .fetch_one(self.pool())
            .await
            .expect("count posts failed")
    }
}
