//! `/users` CRUD behind a bearer token.

mod common;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
};
use common::TestApp;
use serde_json::json;

async fn authed_app() -> (TestApp, String) {
    let app = TestApp::new();
    app.seed_user("admin@b.com").await;
    let bearer = app.bearer_for("admin@b.com").await;
    (app, bearer)
}

fn new_user() -> serde_json::Value {
    json!({
        "name": " Bob ",
        "lastName": "Smith",
        "email": "bob@example.com",
        "birthDay": "1985-07-14",
        "maritalStatus": "MARRIED"
    })
}

#[tokio::test]
async fn create_returns_201_with_location() {
    let (app, bearer) = authed_app().await;

    let response = app
        .request(Method::POST, "/users", Some(&bearer), Some(new_user()))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let id = response.body["id"].as_str().unwrap();
    assert_eq!(response.headers[header::LOCATION], format!("/users/{}", id));
    assert_eq!(response.body["name"], "Bob");
    assert_eq!(response.body["birthDay"], "1985-07-14");
    assert_eq!(response.body["maritalStatus"], "MARRIED");

    let fetched = app
        .request(Method::GET, &format!("/users/{}", id), Some(&bearer), None)
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["email"], "bob@example.com");
}

#[tokio::test]
async fn invalid_create_lists_every_violation() {
    let (app, bearer) = authed_app().await;

    let response = app
        .request(
            Method::POST,
            "/users",
            Some(&bearer),
            Some(json!({
                "name": "n".repeat(76),
                "lastName": "Smith",
                "email": "nope",
                "birthDay": "2999-01-01",
                "maritalStatus": "SINGLE"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["error"],
        "Bad request for create User. Please check your request for consistent of documentation."
    );
    assert_eq!(response.body["fields"]["name"][0], "Field Name is too long.");
    assert_eq!(response.body["fields"]["birthDay"][0], "BirthDay date is in future");
    assert_eq!(response.body["fields"]["email"][0], "It's not like an email");

    let list = app.request(Method::GET, "/users", Some(&bearer), None).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let (app, bearer) = authed_app().await;

    let mut body = new_user();
    body["email"] = json!("ADMIN@b.com");
    let response = app.request(Method::POST, "/users", Some(&bearer), Some(body)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let (app, bearer) = authed_app().await;
    let created = app
        .request(Method::POST, "/users", Some(&bearer), Some(new_user()))
        .await;
    let uri = format!("/users/{}", created.body["id"].as_str().unwrap());

    let response = app
        .request(Method::PUT, &uri, Some(&bearer), Some(json!({ "lastName": "Jones" })))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["lastName"], "Jones");
    assert_eq!(response.body["name"], "Bob");
    assert_eq!(response.body["birthDay"], "1985-07-14");
    assert_eq!(response.body["maritalStatus"], "MARRIED");
}

#[tokio::test]
async fn invalid_update_reports_update_message() {
    let (app, bearer) = authed_app().await;
    let created = app
        .request(Method::POST, "/users", Some(&bearer), Some(new_user()))
        .await;
    let uri = format!("/users/{}", created.body["id"].as_str().unwrap());

    let response = app
        .request(Method::PUT, &uri, Some(&bearer), Some(json!({ "maritalStatus": "married" })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Bad request for update User."));
    assert_eq!(response.body["fields"]["maritalStatus"][0], "This status is wrong.");
}

#[tokio::test]
async fn missing_user_is_404_but_delete_is_204() {
    let (app, bearer) = authed_app().await;
    let uri = format!("/users/{}", uuid::Uuid::new_v4());

    assert_eq!(
        app.request(Method::GET, &uri, Some(&bearer), None).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.request(Method::PUT, &uri, Some(&bearer), Some(json!({ "name": "X" })))
            .await
            .status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.request(Method::DELETE, &uri, Some(&bearer), None).await.status,
        StatusCode::NO_CONTENT
    );
}

#[tokio::test]
async fn empty_listing_is_204() {
    // Every authenticated caller is itself a user, so drive the handler directly.
    let app = TestApp::new();

    let response = otp_auth_service::handlers::list_users(State(app.state.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
