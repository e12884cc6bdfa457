mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;

async fn create_group(
    server: &TestServer,
    token: &str,
    name: &str,
    member_ids: &[i64],
) -> i64 {
    let resp = server
        .post("/groups")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&serde_json::json!({ "name": name, "member_ids": member_ids }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    body["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// POST /groups and GET /groups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_group_includes_creator_and_listed_members() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (bob, _) = common::register_and_login(&server, "bob").await;

    let resp = server
        .post("/groups")
        .add_header(AUTHORIZATION, format!("Bearer {alice_token}"))
        .json(&serde_json::json!({ "name": "dev", "member_ids": [bob] }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["name"], "dev");
    assert_eq!(body["members"].as_array().unwrap().len(), 2);
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn create_group_requires_a_name() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;

    let resp = server
        .post("/groups")
        .add_header(AUTHORIZATION, format!("Bearer {alice_token}"))
        .json(&serde_json::json!({ "name": "   " }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_groups_only_shows_memberships() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (_bob, bob_token) = common::register_and_login(&server, "bob").await;

    create_group(&server, &alice_token, "alice-only", &[]).await;

    let resp = common::get_authed(&server, "/groups", &bob_token).await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert!(body.as_array().unwrap().is_empty());

    let resp = common::get_authed(&server, "/groups", &alice_token).await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// GET /groups/{group_id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_group_is_members_only() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (_bob, bob_token) = common::register_and_login(&server, "bob").await;

    let group_id = create_group(&server, &alice_token, "dev", &[]).await;

    common::get_authed(&server, &format!("/groups/{group_id}"), &alice_token)
        .await
        .assert_status(StatusCode::OK);
    common::get_authed(&server, &format!("/groups/{group_id}"), &bob_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    common::get_authed(&server, "/groups/9999", &alice_token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Membership changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_member_notifies_the_target() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (bob, _) = common::register_and_login(&server, "bob").await;

    let group_id = create_group(&server, &alice_token, "dev", &[]).await;

    let resp = server
        .post(&format!("/groups/{group_id}/members/{bob}"))
        .add_header(AUTHORIZATION, format!("Bearer {alice_token}"))
        .await;
    resp.assert_status(StatusCode::OK);

    let notifications = state.store.notifications_for(bob).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].content, "You were added to group dev");

    // Adding again conflicts.
    let resp = server
        .post(&format!("/groups/{group_id}/members/{bob}"))
        .add_header(AUTHORIZATION, format!("Bearer {alice_token}"))
        .await;
    resp.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn remove_member_notifies_the_target() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (bob, _) = common::register_and_login(&server, "bob").await;

    let group_id = create_group(&server, &alice_token, "dev", &[bob]).await;

    let resp = server
        .delete(&format!("/groups/{group_id}/members/{bob}"))
        .add_header(AUTHORIZATION, format!("Bearer {alice_token}"))
        .await;
    resp.assert_status(StatusCode::OK);

    let notifications = state.store.notifications_for(bob).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].content, "You were removed from group dev");

    // Removing again is a bad request (not a member any more).
    let resp = server
        .delete(&format!("/groups/{group_id}/members/{bob}"))
        .add_header(AUTHORIZATION, format!("Bearer {alice_token}"))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn membership_changes_require_membership() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (bob, bob_token) = common::register_and_login(&server, "bob").await;

    let group_id = create_group(&server, &alice_token, "dev", &[]).await;

    // Bob is not a member, so he cannot add himself.
    let resp = server
        .post(&format!("/groups/{group_id}/members/{bob}"))
        .add_header(AUTHORIZATION, format!("Bearer {bob_token}"))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Group messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn group_send_persists_one_message_visible_in_history() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (bob, bob_token) = common::register_and_login(&server, "bob").await;

    let group_id = create_group(&server, &alice_token, "dev", &[bob]).await;

    let resp = server
        .post(&format!("/groups/{group_id}/messages"))
        .add_header(AUTHORIZATION, format!("Bearer {alice_token}"))
        .json(&serde_json::json!({ "content": "hello" }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["group_id"].as_i64().unwrap(), group_id);
    assert_eq!(body["sender_id"].as_i64().unwrap(), alice);

    let resp = common::get_authed(
        &server,
        &format!("/groups/{group_id}/messages"),
        &bob_token,
    )
    .await;
    resp.assert_status(StatusCode::OK);
    let history: serde_json::Value = resp.json();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["content"], "hello");

    // Nobody was connected, so the group path produced no notifications.
    assert!(state.store.notifications_for(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn group_send_requires_membership() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (_alice, alice_token) = common::register_and_login(&server, "alice").await;
    let (_bob, bob_token) = common::register_and_login(&server, "bob").await;

    let group_id = create_group(&server, &alice_token, "dev", &[]).await;

    let resp = server
        .post(&format!("/groups/{group_id}/messages"))
        .add_header(AUTHORIZATION, format!("Bearer {bob_token}"))
        .json(&serde_json::json!({ "content": "let me in" }))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
}
