use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use bokhylla::books::{BookRepository, InMemoryBookRepository, LibsqlBookRepository};
use bokhylla::db::Database;
use bokhylla::error::StoreError;
use bokhylla::handler::{AppState, router};
use bokhylla::model::{Book, BookId};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let db = Arc::new(Database::in_memory().await.unwrap());
    router(AppState::new(Arc::new(LibsqlBookRepository::new(db))))
}

struct Reply {
    status: StatusCode,
    text: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or_else(|e| panic!("not json ({e}): {}", self.text))
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Reply {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        text: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

async fn create(app: &Router, title: &str) -> String {
    let reply = send(app, "POST", "/api/books", Some(json!({ "title": title }))).await;
    reply.json()["_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_healthcheck() {
    let app = app().await;
    let reply = send(&app, "GET", "/", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_create_returns_id_and_title_only() {
    let app = app().await;
    let reply = send(&app, "POST", "/api/books", Some(json!({ "title": "bookTitle1" }))).await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["title"], "bookTitle1");
    assert!(body["_id"].is_string());
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_round_trip() {
    let app = app().await;
    let id = create(&app, "bookTitle1").await;

    let list = send(&app, "GET", "/api/books", None).await.json();
    assert_eq!(list, json!([{ "_id": id, "title": "bookTitle1", "commentcount": 0 }]));

    let detail = send(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.json(), json!({ "_id": id, "title": "bookTitle1", "comments": [] }));
}

#[tokio::test]
async fn test_create_without_title() {
    let app = app().await;
    create(&app, "existing").await;

    for body in [Some(json!({ "title": "" })), Some(json!({})), None] {
        let reply = send(&app, "POST", "/api/books", body).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.text, "missing required field title");
    }

    let list = send(&app, "GET", "/api/books", None).await.json();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_numeric_fields_are_stored_as_text() {
    let app = app().await;

    let reply = send(&app, "POST", "/api/books", Some(json!({ "title": 42 }))).await;
    assert_eq!(reply.status, StatusCode::OK);
    let created = reply.json();
    assert_eq!(created["title"], "42");
    let id = created["_id"].as_str().unwrap().to_string();

    let reply = send(&app, "POST", &format!("/api/books/{id}"), Some(json!({ "comment": 7 }))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "_id": id, "title": "42", "comments": ["7"] }));

    let reply = send(&app, "POST", "/api/books", Some(json!({ "title": null }))).await;
    assert_eq!(reply.text, "missing required field title");
}

#[tokio::test]
async fn test_create_accepts_form_body() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/books")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("title=Moby+Dick"))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["title"], "Moby Dick");
}

#[tokio::test]
async fn test_list_empty_collection() {
    let app = app().await;
    let reply = send(&app, "GET", "/api/books", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!([]));
}

#[tokio::test]
async fn test_get_unknown_or_malformed_id() {
    let app = app().await;
    let absent = BookId::generate().to_string();

    for uri in ["/api/books/random".to_string(), format!("/api/books/{absent}")] {
        let reply = send(&app, "GET", &uri, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.text, "no book exists");
    }
}

#[tokio::test]
async fn test_comments_append_in_order() {
    let app = app().await;
    let id = create(&app, "T").await;
    let uri = format!("/api/books/{id}");

    let first = send(&app, "POST", &uri, Some(json!({ "comment": "hello" }))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json(), json!({ "_id": id, "title": "T", "comments": ["hello"] }));

    let second = send(&app, "POST", &uri, Some(json!({ "comment": "world" }))).await;
    assert_eq!(second.json()["comments"], json!(["hello", "world"]));

    let list = send(&app, "GET", "/api/books", None).await.json();
    assert_eq!(list[0]["commentcount"], 2);
}

#[tokio::test]
async fn test_comment_validation_happens_before_lookup() {
    let app = app().await;

    let reply = send(&app, "POST", "/api/books/noComment", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.text, "missing required field comment");

    let reply = send(&app, "POST", "/api/books/noComment", Some(json!({ "comment": "" }))).await;
    assert_eq!(reply.text, "missing required field comment");
}

#[tokio::test]
async fn test_comment_on_unknown_book() {
    let app = app().await;
    let absent = BookId::generate().to_string();

    for uri in ["/api/books/invalidid".to_string(), format!("/api/books/{absent}")] {
        let reply = send(&app, "POST", &uri, Some(json!({ "comment": "testComment" }))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.text, "no book exists");
    }
}

#[tokio::test]
async fn test_delete_by_id() {
    let app = app().await;
    let id = create(&app, "A").await;
    let uri = format!("/api/books/{id}");

    let reply = send(&app, "DELETE", &uri, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.text, "delete successful");

    assert_eq!(send(&app, "GET", &uri, None).await.text, "no book exists");
    assert_eq!(send(&app, "DELETE", &uri, None).await.text, "no book exists");
    assert_eq!(send(&app, "DELETE", "/api/books/invalidid", None).await.text, "no book exists");
}

#[tokio::test]
async fn test_delete_all_is_idempotent() {
    let app = app().await;
    create(&app, "a").await;
    create(&app, "b").await;

    for _ in 0..2 {
        let reply = send(&app, "DELETE", "/api/books", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.text, "complete delete successful");
    }

    assert_eq!(send(&app, "GET", "/api/books", None).await.json(), json!([]));
}

#[tokio::test]
async fn test_in_memory_repository_serves_same_contract() {
    let app = router(AppState::new(Arc::new(InMemoryBookRepository::new())));
    let id = create(&app, "T").await;

    let reply = send(&app, "POST", &format!("/api/books/{id}"), Some(json!({ "comment": "hello" }))).await;
    assert_eq!(reply.json()["comments"], json!(["hello"]));
    assert_eq!(send(&app, "DELETE", &format!("/api/books/{id}"), None).await.text, "delete successful");
}

/// Store whose every call fails.
struct BrokenStore;

fn broken() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl BookRepository for BrokenStore {
    async fn insert(&self, _title: &str) -> Result<BookId, StoreError> {
        Err(broken())
    }
    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        Err(broken())
    }
    async fn find_by_id(&self, _id: BookId) -> Result<Option<Book>, StoreError> {
        Err(broken())
    }
    async fn delete_by_id(&self, _id: BookId) -> Result<Option<Book>, StoreError> {
        Err(broken())
    }
    async fn delete_all(&self) -> Result<u64, StoreError> {
        Err(broken())
    }
    async fn save(&self, _book: &Book) -> Result<bool, StoreError> {
        Err(broken())
    }
}

#[tokio::test]
async fn test_store_failures_are_recovered() {
    let app = router(AppState::new(Arc::new(BrokenStore)));
    let id = BookId::generate().to_string();
    let uri = format!("/api/books/{id}");

    let reply = send(&app, "POST", "/api/books", Some(json!({ "title": "T" }))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "error": "could not post" }));

    let reply = send(&app, "GET", "/api/books", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "error": "could not get books" }));

    assert_eq!(send(&app, "DELETE", "/api/books", None).await.text, "complete delete successful");
    assert_eq!(send(&app, "GET", &uri, None).await.text, "no book exists");
    assert_eq!(
        send(&app, "POST", &uri, Some(json!({ "comment": "c" }))).await.text,
        "no book exists"
    );
    assert_eq!(send(&app, "DELETE", &uri, None).await.text, "no book exists");

    // validation still wins over the store
    assert_eq!(
        send(&app, "POST", "/api/books", Some(json!({ "title": "" }))).await.text,
        "missing required field title"
    );
}

/// Book saved between another request's read and write is lost.
struct StaleReadStore {
    inner: InMemoryBookRepository,
    snapshot: Book,
}

#[async_trait]
impl BookRepository for StaleReadStore {
    async fn insert(&self, title: &str) -> Result<BookId, StoreError> {
        self.inner.insert(title).await
    }
    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        self.inner.find_all().await
    }
    async fn find_by_id(&self, _id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(Some(self.snapshot.clone()))
    }
    async fn delete_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        self.inner.delete_by_id(id).await
    }
    async fn delete_all(&self) -> Result<u64, StoreError> {
        self.inner.delete_all().await
    }
    async fn save(&self, book: &Book) -> Result<bool, StoreError> {
        self.inner.save(book).await
    }
}

#[tokio::test]
async fn test_append_is_last_write_wins() {
    let inner = InMemoryBookRepository::new();
    let id = inner.insert("T").await.unwrap();
    let snapshot = inner.find_by_id(id).await.unwrap().unwrap();

    let mut concurrent = snapshot.clone();
    concurrent.add_comment("from another request");
    inner.save(&concurrent).await.unwrap();

    let app = router(AppState::new(Arc::new(StaleReadStore { inner, snapshot })));
    let reply = send(&app, "POST", &format!("/api/books/{id}"), Some(json!({ "comment": "mine" }))).await;
    assert_eq!(reply.json()["comments"], json!(["mine"]));

    let list = send(&app, "GET", "/api/books", None).await.json();
    assert_eq!(list[0]["commentcount"], 1);
}
