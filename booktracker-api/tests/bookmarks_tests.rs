/// Integration tests for per-user bookmarks

mod common;

use axum::http::{Method, StatusCode};
use common::{TestContext, TestUser};
use serde_json::{json, Value};

async fn shared_book(ctx: &TestContext, admin: &TestUser) -> String {
    let (status, book) = ctx.upload(&admin.token, "dune.pdf", b"%PDF", "Dune").await;
    assert_eq!(status, StatusCode::CREATED);
    book["id"].as_str().unwrap().to_string()
}

async fn add_bookmark(ctx: &TestContext, user: &TestUser, book_id: &str, body: Value) -> (StatusCode, Value) {
    ctx.json(
        Method::POST,
        &format!("/api/books/{book_id}/bookmarks"),
        Some(&user.token),
        Some(body),
    )
    .await
}

#[tokio::test]
async fn test_create_list_and_delete() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", true).await;
    let reader = ctx.create_user("reader", false).await;
    let book_id = shared_book(&ctx, &admin).await;

    let (status, first) = add_bookmark(&ctx, &reader, &book_id, json!({ "page": 12 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["page"], 12);
    assert_eq!(first["note"], Value::Null);
    assert_eq!(first["userId"], reader.user.id.to_string());

    let (_, second) = add_bookmark(
        &ctx,
        &reader,
        &book_id,
        json!({ "page": 40, "note": "Arrakis" }),
    )
    .await;
    assert_eq!(second["note"], "Arrakis");

    let uri = format!("/api/books/{book_id}/bookmarks");
    let (status, list) = ctx.get(&uri, &reader.token).await;
    assert_eq!(status, StatusCode::OK);
    let pages: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["page"].as_i64().unwrap())
        .collect();
    assert_eq!(pages, vec![40, 12]);

    let delete_uri = format!("/api/books/bookmarks/{}", first["id"].as_str().unwrap());
    let (status, body) = ctx.delete(&delete_uri, &reader.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Bookmark deleted");

    let (status, body) = ctx.delete(&delete_uri, &reader.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Bookmark not found");

    let (_, list) = ctx.get(&uri, &reader.token).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bookmarks_are_private() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", true).await;
    let reader = ctx.create_user("reader", false).await;
    let other = ctx.create_user("other", false).await;
    let book_id = shared_book(&ctx, &admin).await;

    let (_, mark) = add_bookmark(&ctx, &reader, &book_id, json!({ "page": 3 })).await;

    let (status, list) = ctx
        .get(&format!("/api/books/{book_id}/bookmarks"), &other.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    let delete_uri = format!("/api/books/bookmarks/{}", mark["id"].as_str().unwrap());
    let (status, _) = ctx.delete(&delete_uri, &other.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&delete_uri, &reader.token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_page_must_be_positive() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", true).await;
    let book_id = shared_book(&ctx, &admin).await;

    let (status, body) = add_bookmark(&ctx, &admin, &book_id, json!({ "page": 0 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "page");
}

#[tokio::test]
async fn test_unshared_book_cannot_be_bookmarked() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user("owner", false).await;
    let other = ctx.create_user("other", false).await;
    let (_, book) = ctx.upload(&owner.token, "draft.pdf", b"%PDF", "Draft").await;
    let book_id = book["id"].as_str().unwrap();

    let (status, _) = add_bookmark(&ctx, &other, book_id, json!({ "page": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = add_bookmark(&ctx, &owner, book_id, json!({ "page": 1 })).await;
    assert_eq!(status, StatusCode::CREATED);

    let missing = uuid::Uuid::new_v4().to_string();
    let (status, _) = add_bookmark(&ctx, &owner, &missing, json!({ "page": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
