//! Contest subscription endpoint integration tests.
//!
//! Run with: `cargo test -p atelier-api --test subscriptions_test`

mod helpers;

use atelier_core::models::Role;
use atelier_core::NOT_AUTHORIZED_MESSAGE;
use axum_test::multipart::MultipartForm;
use helpers::fixtures::png_part;
use helpers::{api_path, setup_test_app, TestApp, TestUser, BASE_URL};
use serde_json::json;
use uuid::Uuid;

async fn create(app: &TestApp, user: &TestUser, content_type: &str, form: MultipartForm) -> Uuid {
    let action = format!("submit_{}", content_type);
    let token = app.form_token(user, &action, None).await;
    let response = app
        .client()
        .post(&api_path(&format!("/submissions/{}", content_type)))
        .add_header("Authorization", format!("Bearer {}", user.token))
        .multipart(form.add_text("token", token))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    Uuid::parse_str(body["success"]["id"].as_str().unwrap()).unwrap()
}

async fn create_contest(app: &TestApp, user: &TestUser, status: &str) -> Uuid {
    let form = MultipartForm::new()
        .add_text("title", "Winter robotics")
        .add_text("body", "Robots in the snow")
        .add_text("status", status.to_string())
        .add_text("terms", "<p>Terms</p>")
        .add_text("rules", "<p>Rules</p>")
        .add_text("start_date", "2026-12-01")
        .add_text("end_date", "2027-01-15")
        .add_part("primary_image", png_part("banner.png"));
    create(app, user, "contest", form).await
}

async fn create_project(app: &TestApp, user: &TestUser) -> Uuid {
    let form = MultipartForm::new()
        .add_text("title", "Snow plough bot")
        .add_text("body", "Clears the driveway")
        .add_text("status", "published")
        .add_text("creation_type", "individual");
    create(app, user, "project", form).await
}

async fn subscribe(
    app: &TestApp,
    user: &TestUser,
    project_id: Uuid,
    contest_id: Uuid,
) -> serde_json::Value {
    let token = app
        .form_token(user, "subscribe_project", Some(contest_id))
        .await;
    let response = app
        .client()
        .post(&api_path("/subscriptions"))
        .add_header("Authorization", format!("Bearer {}", user.token))
        .json(&json!({
            "project_id": project_id,
            "parent_id": contest_id,
            "token": token,
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

#[tokio::test]
async fn test_enter_project_into_contest() {
    let app = setup_test_app().await;
    let organizer = app.user(Role::Regular).await;
    let maker = app.user(Role::Regular).await;
    let contest_id = create_contest(&app, &organizer, "published").await;
    let project_id = create_project(&app, &maker).await;

    let body = subscribe(&app, &maker, project_id, contest_id).await;

    assert_eq!(body["result"], "success");
    assert_eq!(body["href"], format!("{}/contests/{}", BASE_URL, contest_id));
}

#[tokio::test]
async fn test_second_entry_is_rejected() {
    let app = setup_test_app().await;
    let maker = app.user(Role::Regular).await;
    let contest_id = create_contest(&app, &maker, "published").await;
    let project_id = create_project(&app, &maker).await;

    let first = subscribe(&app, &maker, project_id, contest_id).await;
    assert_eq!(first["result"], "success");

    let second = subscribe(&app, &maker, project_id, contest_id).await;
    assert_eq!(second["result"], "error");
    assert_eq!(
        second["message"],
        "This project is already entered in this contest."
    );
}

#[tokio::test]
async fn test_cannot_enter_someone_elses_project() {
    let app = setup_test_app().await;
    let maker = app.user(Role::Regular).await;
    let stranger = app.user(Role::Regular).await;
    let contest_id = create_contest(&app, &maker, "published").await;
    let project_id = create_project(&app, &maker).await;

    let body = subscribe(&app, &stranger, project_id, contest_id).await;

    assert_eq!(body["result"], "error");
    assert_eq!(body["message"], NOT_AUTHORIZED_MESSAGE);
}

#[tokio::test]
async fn test_draft_contest_is_not_open() {
    let app = setup_test_app().await;
    let maker = app.user(Role::Regular).await;
    let contest_id = create_contest(&app, &maker, "draft").await;
    let project_id = create_project(&app, &maker).await;

    let body = subscribe(&app, &maker, project_id, contest_id).await;

    assert_eq!(body["result"], "error");
}

#[tokio::test]
async fn test_token_scoped_to_another_contest() {
    let app = setup_test_app().await;
    let maker = app.user(Role::Regular).await;
    let contest_id = create_contest(&app, &maker, "published").await;
    let project_id = create_project(&app, &maker).await;
    let token = app
        .form_token(&maker, "subscribe_project", Some(Uuid::new_v4()))
        .await;

    let response = app
        .client()
        .post(&api_path("/subscriptions"))
        .add_header("Authorization", format!("Bearer {}", maker.token))
        .json(&json!({
            "project_id": project_id,
            "parent_id": contest_id,
            "token": token,
        }))
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["result"], "error");
    assert_eq!(body["message"], NOT_AUTHORIZED_MESSAGE);
}

#[tokio::test]
async fn test_malformed_body() {
    let app = setup_test_app().await;
    let maker = app.user(Role::Regular).await;

    let response = app
        .client()
        .post(&api_path("/subscriptions"))
        .add_header("Authorization", format!("Bearer {}", maker.token))
        .json(&json!({ "project_id": "nope" }))
        .await;

    assert_eq!(response.status_code(), 400);
}
