use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use agora_api::middleware::USER_HEADER;
use agora_api::{AppStateInner, router};
use agora_db::Database;
use agora_types::Id;

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    router(Arc::new(AppStateInner::new(db)))
}

async fn call(app: &Router, method: Method, uri: &str, user: Option<Id>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/friends", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Caller identity required");
}

#[tokio::test]
async fn friend_request_flow() {
    let app = app();
    let (alice, bob) = (Id::new(), Id::new());

    let (status, request) =
        call(&app, Method::POST, &format!("/friend/requests/{}", bob), Some(alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");

    let (status, _) =
        call(&app, Method::POST, &format!("/friend/requests/{}", bob), Some(alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        call(&app, Method::PUT, &format!("/friend/accept/{}", alice), Some(bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, friends) = call(&app, Method::GET, "/friends", Some(bob), None).await;
    assert_eq!(friends, json!([alice.to_string()]));
}

#[tokio::test]
async fn group_lifecycle() {
    let app = app();
    let (owner, guest) = (Id::new(), Id::new());

    let (status, group) =
        call(&app, Method::POST, "/groups", Some(owner), Some(json!({ "private": true }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = group["id"].as_str().unwrap().to_string();
    let list = group["censored_word_list"].as_str().unwrap().to_string();

    let (status, _) = call(&app, Method::GET, &format!("/wordlists/{}", list), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let invite = format!("/groups/{}/residents/{}", id, guest);
    let (_, added) = call(&app, Method::PATCH, &invite, Some(owner), None).await;
    assert_eq!(added, json!({ "added": true }));
    let (_, again) = call(&app, Method::PATCH, &invite, Some(owner), None).await;
    assert_eq!(again, json!({ "added": false }));

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/groups/{}/residents/{}", id, owner),
        Some(guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::DELETE, &format!("/groups/{}", id), Some(owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &format!("/wordlists/{}", list), Some(owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn points_transfer_is_all_or_nothing() {
    let app = app();
    let (alice, bob) = (Id::new(), Id::new());

    call(&app, Method::POST, "/points", Some(alice), Some(json!({}))).await;
    call(&app, Method::POST, "/points", Some(bob), Some(json!({ "balance": 50 }))).await;

    let transfer = format!("/points/transfer/{}", bob);
    let (status, moved) =
        call(&app, Method::PATCH, &transfer, Some(alice), Some(json!({ "amount": 30 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["sender"]["balance"], 70);
    assert_eq!(moved["receiver"]["balance"], 80);

    let (status, _) =
        call(&app, Method::PATCH, &transfer, Some(alice), Some(json!({ "amount": 1000 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, account) = call(&app, Method::GET, "/points", Some(bob), None).await;
    assert_eq!(account["balance"], 80);

    let (_, account) = call(&app, Method::PATCH, "/points/-20", Some(alice), None).await;
    assert_eq!(account["balance"], 50);
}

#[tokio::test]
async fn vote_resolves_on_check() {
    let app = app();
    let (alice, bob) = (Id::new(), Id::new());
    let scope = Id::new();
    let end = chrono::Utc::now() + chrono::Duration::hours(1);

    let (status, vote) = call(
        &app,
        Method::POST,
        "/votes",
        Some(alice),
        Some(json!({
            "scope": scope,
            "title": "Censor spoilers",
            "electorate": [alice, bob],
            "vote_type": "CENSOR",
            "end_time": end,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = vote["id"].as_str().unwrap().to_string();

    let (status, _) = call(&app, Method::PATCH, &format!("/votes/{}/yes", id), Some(Id::new()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    call(&app, Method::PATCH, &format!("/votes/{}/yes", id), Some(bob), None).await;
    let (_, outcome) = call(&app, Method::GET, &format!("/votes/{}/check", id), Some(alice), None).await;
    assert_eq!(outcome["status"], "Pending");

    call(&app, Method::PATCH, &format!("/votes/{}/yes", id), Some(alice), None).await;
    let (_, outcome) = call(&app, Method::GET, &format!("/votes/{}/check", id), Some(alice), None).await;
    assert_eq!(outcome["status"], "Approved");

    let (_, open) = call(&app, Method::GET, &format!("/votes?scope={}", scope), Some(alice), None).await;
    assert_eq!(open, json!([]));
}
