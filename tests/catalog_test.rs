use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use readmate::config::Config;
use readmate::db;
use readmate::infrastructure::AppState;
use readmate::models::book;
use readmate::server::build_router;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// "데미안", percent-encoded for the request line
const DEMIAN_QUERY: &str = "%EB%8D%B0%EB%AF%B8%EC%95%88";

fn test_config(base_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        cors_allowed_origins: Vec::new(),
        jwt_secret: "test-secret".to_string(),
        aladin_ttb_key: Some("test-ttb-key".to_string()),
        aladin_base_url: base_url.to_string(),
        catalog_max_results: 20,
    }
}

// Helper to create the app around an in-memory database
async fn setup_app(base_url: &str) -> (Router, DatabaseConnection) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let state = AppState::new(db.clone(), test_config(base_url));
    (build_router(state), db)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// Helper to create a local book row
async fn create_test_book(db: &DatabaseConnection, title: &str, isbn: Option<&str>) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let book = book::ActiveModel {
        title: Set(title.to_string()),
        author: Set(Some("헤르만 헤세".to_string())),
        isbn: Set(isbn.map(str::to_string)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    book::Entity::insert(book)
        .exec(db)
        .await
        .expect("Failed to create book")
        .last_insert_id
}

fn aladin_item(title: &str, isbn13: &str, category: &str) -> Value {
    json!({
        "title": title,
        "author": "헤르만 헤세 (지은이), 전영애 (옮긴이)",
        "publisher": "민음사",
        "categoryName": category,
        "isbn": "",
        "isbn13": isbn13,
        "cover": format!("https://image.aladin.co.kr/product/{}_1.jpg", isbn13),
        "description": "",
        "pubDate": "2000-12-20"
    })
}

fn demian_items() -> Value {
    json!({
        "version": "20131101",
        "totalResults": 3,
        "item": [
            aladin_item("데미안", "9788937460449", "국내도서>소설/시/희곡>독일소설"),
            aladin_item("데미안 (양장)", "9791190299770", "국내도서>소설/시/희곡>독일소설"),
            aladin_item("데미안 - 청소년 문학", "9788932917245", "국내도서>청소년>청소년 문학"),
        ]
    })
}

async fn mount_search(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/ItemSearch.aspx"))
        .and(query_param("QueryType", "Keyword"))
        .and(query_param("ttbkey", "test-ttb-key"))
        .and(query_param("Version", "20131101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_reconciles_with_existing_isbn() {
    let server = MockServer::start().await;
    mount_search(&server, demian_items()).await;
    let (app, db) = setup_app(&server.uri()).await;

    let existing_id = create_test_book(&db, "데미안", Some("9788937460449")).await;

    let (status, body) = get_json(&app, &format!("/api/books/search?q={}", DEMIAN_QUERY)).await;
    assert_eq!(status, StatusCode::OK);

    let books = body["books"].as_array().expect("books array");
    assert_eq!(books.len(), 3);
    assert!(books.iter().all(|b| b["id"].is_i64()), "every result has a local id");
    assert_eq!(
        books.iter().filter(|b| b["id"] == json!(existing_id)).count(),
        1
    );
    assert_eq!(books[0]["category"], "소설/시/희곡");

    assert_eq!(book::Entity::find().count(&db).await.unwrap(), 3);

    // Catalog values win over the local row on merge
    let merged = book::Entity::find_by_id(existing_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(merged.publisher.as_deref(), Some("민음사"));
    assert_eq!(merged.category.as_deref(), Some("소설/시/희곡"));
}

#[tokio::test]
async fn test_search_twice_is_idempotent() {
    let server = MockServer::start().await;
    mount_search(&server, demian_items()).await;
    let (app, db) = setup_app(&server.uri()).await;

    let uri = format!("/api/books/search?q={}", DEMIAN_QUERY);
    let (_, first) = get_json(&app, &uri).await;
    let (_, second) = get_json(&app, &uri).await;

    let ids = |body: &Value| -> Vec<Value> {
        body["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].clone())
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(book::Entity::find().count(&db).await.unwrap(), 3);
}

#[tokio::test]
async fn test_search_adopts_isbn_on_title_match() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        json!({ "item": [aladin_item("DEMIAN ", "9780143106784", "Foreign>Fiction")] }),
    )
    .await;
    let (app, db) = setup_app(&server.uri()).await;

    let local_id = create_test_book(&db, "Demian", None).await;

    let (status, body) = get_json(&app, "/api/books/search?q=Demian").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"][0]["id"], json!(local_id));

    let rows = book::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].isbn.as_deref(), Some("9780143106784"));
}

#[tokio::test]
async fn test_search_falls_back_to_local_when_catalog_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ItemSearch.aspx"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (app, db) = setup_app(&server.uri()).await;

    let local_id = create_test_book(&db, "데미안", Some("9788937460449")).await;
    create_test_book(&db, "싯다르타", Some("9788937460050")).await;

    let (status, body) = get_json(&app, &format!("/api/books/search?q={}", DEMIAN_QUERY)).await;
    assert_eq!(status, StatusCode::OK);

    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], json!(local_id));
}

#[tokio::test]
async fn test_search_requires_query() {
    let server = MockServer::start().await;
    let (app, _db) = setup_app(&server.uri()).await;

    let (status, body) = get_json(&app, "/api/books/search?q=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_bestsellers_are_ranked_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ItemList.aspx"))
        .and(query_param("QueryType", "Bestseller"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{};", demian_items())))
        .mount(&server)
        .await;
    let (app, db) = setup_app(&server.uri()).await;

    let (status, body) = get_json(&app, "/api/books/bestsellers").await;
    assert_eq!(status, StatusCode::OK);

    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 3);
    assert_eq!(books[0]["rank"], 1);
    assert_eq!(books[2]["rank"], 3);

    let stored = book::Entity::find()
        .filter(book::Column::Isbn.eq("9791190299770"))
        .one(&db)
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_curated_lists_surface_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ItemList.aspx"))
        .and(query_param("QueryType", "Bestseller"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ItemList.aspx"))
        .and(query_param("QueryType", "ItemNewAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": 100,
            "errorMessage": "잘못된 TTBKey 입니다."
        })))
        .mount(&server)
        .await;
    let (app, db) = setup_app(&server.uri()).await;

    let (status, body) = get_json(&app, "/api/books/bestsellers").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());

    let (status, _) = get_json(&app, "/api/books/new").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    assert_eq!(book::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_book_by_id() {
    let server = MockServer::start().await;
    let (app, db) = setup_app(&server.uri()).await;
    let id = create_test_book(&db, "데미안", Some("9788937460449")).await;

    let (status, body) = get_json(&app, &format!("/api/books/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "데미안");
    assert_eq!(body["isbn"], "9788937460449");

    let (status, body) = get_json(&app, "/api/books/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Book not found");
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let (app, _db) = setup_app(&server.uri()).await;

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
