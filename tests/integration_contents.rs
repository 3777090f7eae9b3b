mod common;

use axum::http::StatusCode;
use common::{
    admin_token, count_rows, create_category, create_faculty, empty_request, json_request,
    read_json, setup_test_app, user_token,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_content_with_links(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;
    let science = create_faculty(&pool, "Faculty of Science").await;

    let request = json_request(
        "POST",
        "/api/h5p-contents",
        Some(&token),
        json!({
            "name": "Cell Biology Quiz",
            "info": "Ten questions",
            "categoryIds": [quiz],
            "facultyIds": [science]
        }),
    );

    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["name"], "Cell Biology Quiz");
    assert_eq!(body["info"], "Ten questions");
    assert_eq!(body["previewImage"], Value::Null);
    assert_eq!(ids(&body["categories"]), vec![quiz]);
    assert_eq!(ids(&body["faculties"]), vec![science]);

    let id = body["id"].as_i64().unwrap();
    let response = test_app
        .app()
        .oneshot(empty_request("GET", &format!("/api/h5p-contents/{}", id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, body);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_content_requires_name(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;

    let request = json_request("POST", "/api/h5p-contents", Some(&token), json!({ "name": "  " }));

    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Content name is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_content_with_unknown_faculty_keeps_row(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;

    let request = json_request(
        "POST",
        "/api/h5p-contents",
        Some(&token),
        json!({ "name": "Partial", "categoryIds": [quiz], "facultyIds": [404] }),
    );

    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json(response).await["error"],
        "Faculty not found with id: 404"
    );
    assert_eq!(count_rows(&pool, "h5p_contents").await, 1);
    assert_eq!(count_rows(&pool, "h5p_content_categories").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_content_mutations_forbidden_for_user(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = user_token(&test_app, &pool).await;

    let request = json_request("POST", "/api/h5p-contents", Some(&token), json!({ "name": "Nope" }));
    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = json_request("POST", "/api/h5p-contents", None, json!({ "name": "Nope" }));
    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_missing_content(pool: PgPool) {
    let test_app = setup_test_app(pool);

    let response = test_app
        .app()
        .oneshot(empty_request("GET", "/api/h5p-contents/42", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json(response).await["error"],
        "H5P content not found with id: 42"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_content_merges_fields_and_replaces_links(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;
    let video = create_category(&pool, "Interactive Video").await;

    let request = json_request(
        "POST",
        "/api/h5p-contents",
        Some(&token),
        json!({ "name": "Original", "info": "keep me", "categoryIds": [quiz] }),
    );
    let created = read_json(test_app.app().oneshot(request).await.unwrap()).await;
    let id = created["id"].as_i64().unwrap();

    let request = json_request(
        "PUT",
        &format!("/api/h5p-contents/{}", id),
        Some(&token),
        json!({ "name": "Renamed", "categoryIds": [video] }),
    );
    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["info"], "keep me");
    assert_eq!(ids(&body["categories"]), vec![video]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_content(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;

    let request = json_request(
        "POST",
        "/api/h5p-contents",
        Some(&token),
        json!({ "name": "Short lived", "categoryIds": [quiz] }),
    );
    let created = read_json(test_app.app().oneshot(request).await.unwrap()).await;
    let uri = format!("/api/h5p-contents/{}", created["id"]);

    let response = test_app
        .app()
        .oneshot(empty_request("DELETE", &uri, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(count_rows(&pool, "h5p_content_categories").await, 0);

    let response = test_app
        .app()
        .oneshot(empty_request("DELETE", &uri, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_add_and_remove_links(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;
    let arts = create_faculty(&pool, "Faculty of Arts").await;

    let request = json_request("POST", "/api/h5p-contents", Some(&token), json!({ "name": "Bare" }));
    let created = read_json(test_app.app().oneshot(request).await.unwrap()).await;
    let id = created["id"].as_i64().unwrap();

    let response = test_app
        .app()
        .oneshot(empty_request(
            "POST",
            &format!("/api/h5p-contents/{}/categories/{}", id, quiz),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ids(&read_json(response).await["categories"]), vec![quiz]);

    // linking twice is a no-op
    let response = test_app
        .app()
        .oneshot(empty_request(
            "POST",
            &format!("/api/h5p-contents/{}/categories/{}", id, quiz),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(count_rows(&pool, "h5p_content_categories").await, 1);

    let response = test_app
        .app()
        .oneshot(empty_request(
            "POST",
            &format!("/api/h5p-contents/{}/faculties/{}", id, arts),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(ids(&read_json(response).await["faculties"]), vec![arts]);

    let response = test_app
        .app()
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/h5p-contents/{}/categories/{}", id, quiz),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(ids(&body["categories"]).is_empty());
    assert_eq!(ids(&body["faculties"]), vec![arts]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_add_unknown_category_is_not_found(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;

    let request = json_request("POST", "/api/h5p-contents", Some(&token), json!({ "name": "Bare" }));
    let created = read_json(test_app.app().oneshot(request).await.unwrap()).await;

    let response = test_app
        .app()
        .oneshot(empty_request(
            "POST",
            &format!("/api/h5p-contents/{}/categories/999", created["id"]),
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_replace_categories_with_missing_id_keeps_old_links(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;
    let video = create_category(&pool, "Interactive Video").await;

    let request = json_request(
        "POST",
        "/api/h5p-contents",
        Some(&token),
        json!({ "name": "Linked", "categoryIds": [quiz] }),
    );
    let created = read_json(test_app.app().oneshot(request).await.unwrap()).await;
    let uri = format!("/api/h5p-contents/{}/categories", created["id"]);

    let request = json_request("PUT", &uri, Some(&token), json!({ "categoryIds": [video, 999] }));
    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let linked: Vec<i64> =
        sqlx::query_scalar("SELECT category_id FROM h5p_content_categories ORDER BY category_id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(linked, vec![quiz]);

    let request = json_request("PUT", &uri, Some(&token), json!({ "categoryIds": [video] }));
    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ids(&read_json(response).await["categories"]), vec![video]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_replace_faculties_with_empty_list_unlinks(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let arts = create_faculty(&pool, "Faculty of Arts").await;

    let request = json_request(
        "POST",
        "/api/h5p-contents",
        Some(&token),
        json!({ "name": "Linked", "facultyIds": [arts] }),
    );
    let created = read_json(test_app.app().oneshot(request).await.unwrap()).await;

    let request = json_request(
        "PUT",
        &format!("/api/h5p-contents/{}/faculties", created["id"]),
        Some(&token),
        json!({ "facultyIds": [] }),
    );
    let response = test_app.app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(ids(&read_json(response).await["faculties"]).is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_search_and_filter_contents(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;
    let video = create_category(&pool, "Interactive Video").await;
    let science = create_faculty(&pool, "Faculty of Science").await;

    for (name, category) in [("Algebra Quiz", quiz), ("Geometry Video", video)] {
        let request = json_request(
            "POST",
            "/api/h5p-contents",
            Some(&token),
            json!({ "name": name, "categoryIds": [category], "facultyIds": [science] }),
        );
        let response = test_app.app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let names = |body: Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect()
    };

    let get = |uri: String| {
        let app = test_app.app();
        async move { read_json(app.oneshot(empty_request("GET", &uri, None)).await.unwrap()).await }
    };

    assert_eq!(names(get("/api/h5p-contents/search?name=quiz".into()).await), vec!["Algebra Quiz"]);
    assert_eq!(
        names(get(format!("/api/h5p-contents/by-category/{}", video)).await),
        vec!["Geometry Video"]
    );
    assert_eq!(
        names(get("/api/h5p-contents/by-category-name?name=interactive%20video".into()).await),
        vec!["Geometry Video"]
    );
    assert_eq!(
        names(get(format!("/api/h5p-contents/by-faculty/{}", science)).await).len(),
        2
    );
    assert_eq!(
        names(get("/api/h5p-contents/by-faculty-name?name=Faculty%20of%20Science".into()).await)
            .len(),
        2
    );
    assert_eq!(names(get("/api/h5p-contents".into()).await).len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_content_reports_first_missing_id_in_request_order(pool: PgPool) {
    let test_app = setup_test_app(pool.clone());
    let token = admin_token(&test_app, &pool).await;
    let quiz = create_category(&pool, "Quiz").await;

    let request = json_request(
        "POST",
        "/api/h5p-contents",
        Some(&token),
        json!({ "name": "Ordered", "categoryIds": [quiz, 902, 901], "facultyIds": [903] }),
    );

    let response = test_app.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json(response).await["error"],
        "Category not found with id: 902"
    );
    assert_eq!(count_rows(&pool, "h5p_content_categories").await, 0);
}
