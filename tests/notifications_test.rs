mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;

#[tokio::test]
async fn notifications_list_newest_first() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (bob, bob_token) = common::register_and_login(&server, "bob").await;

    state.store.persist_notification(bob, "first").await.unwrap();
    state.store.persist_notification(bob, "second").await.unwrap();

    let resp = common::get_authed(&server, "/notifications", &bob_token).await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["content"], "second");
    assert_eq!(list[1]["content"], "first");
    assert_eq!(list[0]["is_read"], false);
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (bob, bob_token) = common::register_and_login(&server, "bob").await;
    let notification = state.store.persist_notification(bob, "hello").await.unwrap();

    for _ in 0..2 {
        let resp = server
            .put(&format!("/notifications/{}/read", notification.id))
            .add_header(AUTHORIZATION, format!("Bearer {bob_token}"))
            .await;
        resp.assert_status(StatusCode::OK);
    }

    let resp = common::get_authed(&server, "/notifications", &bob_token).await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body[0]["is_read"], true);
    assert_eq!(state.store.count_unread(bob).await.unwrap(), 0);
}

#[tokio::test]
async fn mark_read_is_owner_scoped() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (bob, _bob_token) = common::register_and_login(&server, "bob").await;
    let (_carol, carol_token) = common::register_and_login(&server, "carol").await;

    let notification = state.store.persist_notification(bob, "for bob").await.unwrap();

    // Carol cannot flip Bob's notification.
    let resp = server
        .put(&format!("/notifications/{}/read", notification.id))
        .add_header(AUTHORIZATION, format!("Bearer {carol_token}"))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(state.store.count_unread(bob).await.unwrap(), 1);
}
