#![allow(dead_code)]

use std::io::{Cursor, Write};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use h5p_hub::h5p_hub_auth::Role;
use h5p_hub::h5p_hub_cache::CacheConfig;
use h5p_hub::h5p_hub_config::{JwtConfig, UploadConfig};
use h5p_hub::h5p_hub_core::hash_password;
use h5p_hub::router::init_router;
use h5p_hub::state::AppState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use zip::ZipWriter;
use zip::write::FileOptions;

pub const MULTIPART_BOUNDARY: &str = "h5p-hub-test-boundary";

/// Router plus the temporary upload directory backing it. The directory is
/// removed when this value is dropped.
pub struct TestApp {
    pub router: Router,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

pub fn setup_test_app(pool: PgPool) -> TestApp {
    setup_test_app_with(pool, |_| {})
}

/// Like [`setup_test_app`], letting the test adjust upload limits first.
pub fn setup_test_app_with(pool: PgPool, configure: impl FnOnce(&mut UploadConfig)) -> TestApp {
    dotenvy::dotenv().ok();
    let upload_dir = TempDir::new().unwrap();
    let mut upload_config = UploadConfig::new(upload_dir.path());
    configure(&mut upload_config);
    upload_config.ensure_directories().unwrap();

    let state = AppState::new(
        pool,
        JwtConfig::from_env(),
        upload_config,
        CacheConfig::default(),
        None,
    );

    TestApp {
        router: init_router(state),
        upload_dir,
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub password: String,
}

pub async fn create_test_user(pool: &PgPool, email: &str, password: &str, roles: &[Role]) -> TestUser {
    let hashed = hash_password(password).unwrap();
    let mut tx = pool.begin().await.unwrap();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password, first_name, last_name)
        VALUES ($1, $2, 'Test', 'User')
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(hashed)
    .fetch_one(&mut *tx)
    .await
    .unwrap();

    for role in roles {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await
            .unwrap();
    }

    tx.commit().await.unwrap();

    TestUser {
        id,
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub async fn get_auth_token(app: Router, email: &str, password: &str) -> String {
    let request = json_request(
        "POST",
        "/api/auth/login",
        None,
        json!({ "email": email, "password": password }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

/// Creates a user with the given roles and logs them in.
pub async fn token_for(test_app: &TestApp, pool: &PgPool, roles: &[Role]) -> String {
    let user = create_test_user(pool, &generate_unique_email(), "testpass123", roles).await;
    get_auth_token(test_app.app(), &user.email, &user.password).await
}

pub async fn admin_token(test_app: &TestApp, pool: &PgPool) -> String {
    token_for(test_app, pool, &[Role::User, Role::Admin]).await
}

pub async fn user_token(test_app: &TestApp, pool: &PgPool) -> String {
    token_for(test_app, pool, &[Role::User]).await
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder.body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn create_category(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_faculty(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO faculties (name, description) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(format!("{} description", name))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Number of entries directly inside `dir`.
pub fn dir_entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Builds an in-memory zip archive from `(name, contents)` entries.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, contents) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(contents).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

pub fn h5p_package() -> Vec<u8> {
    build_zip(&[
        ("h5p.json", br#"{"title":"Quiz","mainLibrary":"H5P.QuestionSet"}"#),
        ("content/content.json", br#"{"questions":[]}"#),
        ("content/images/cover.png", b"png"),
    ])
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        field: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                field,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        field, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
    );

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// A complete upload form for the given archive and id lists.
pub fn upload_parts<'a>(
    archive: &'a [u8],
    archive_name: &'a str,
    category_ids: &'a str,
    faculty_ids: &'a str,
) -> Vec<Part<'a>> {
    vec![
        Part::File {
            field: "h5pFile",
            file_name: archive_name,
            content_type: "application/zip",
            data: archive,
        },
        Part::File {
            field: "imageFile",
            file_name: "cover image.png",
            content_type: "image/png",
            data: b"\x89PNG\r\n\x1a\nfake",
        },
        Part::Text("info", "An interactive quiz"),
        Part::Text("categoryIds", category_ids),
        Part::Text("facultyIds", faculty_ids),
    ]
}
