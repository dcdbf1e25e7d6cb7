use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use readmate::auth::{ActorContext, create_jwt};
use readmate::config::Config;
use readmate::db;
use readmate::infrastructure::AppState;
use readmate::models::{book, user_book};
use readmate::server::build_router;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

const SECRET: &str = "test-secret";
const ALICE: &str = "0b6f8d44-5c1e-4a57-9d0e-6a1f3c2b9e01";
const BOB: &str = "7d2c1e90-3b4a-4f6e-8a5d-2c9b0e1f4a77";
const CAROL: &str = "c4a1e2f3-9b8d-4c7e-a6f5-1d2e3f4a5b6c";

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        cors_allowed_origins: Vec::new(),
        jwt_secret: SECRET.to_string(),
        aladin_ttb_key: None,
        aladin_base_url: "http://127.0.0.1:9".to_string(),
        catalog_max_results: 20,
    }
}

async fn setup_app() -> (Router, DatabaseConnection) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let state = AppState::new(db.clone(), test_config());
    (build_router(state), db)
}

fn token_for(user_id: &str, nickname: Option<&str>) -> String {
    let actor = ActorContext {
        nickname: nickname.map(str::to_string),
        ..ActorContext::new(user_id)
    };
    create_jwt(&actor, SECRET).expect("Failed to create JWT")
}

fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create_test_book(db: &DatabaseConnection, title: &str, category: Option<&str>) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let book = book::ActiveModel {
        title: Set(title.to_string()),
        category: Set(category.map(str::to_string)),
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

async fn finish_book(app: &Router, token: &str, book_id: i32) {
    let (status, body) = send(
        app,
        "POST",
        "/api/user-books",
        Some(token),
        Some(json!({ "bookId": book_id, "status": "finished" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
}

#[tokio::test]
async fn test_status_transitions_keep_date_invariants() {
    let (app, db) = setup_app().await;
    let alice = token_for(ALICE, Some("alice"));
    let book_id = create_test_book(&db, "데미안", Some("소설/시/희곡")).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["entry"]["status"], "want");
    assert_eq!(body["entry"]["startedAt"], Value::Null);

    // Adding again returns the existing entry
    let (status, _) = send(
        &app,
        "POST",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": book_id, "status": "reading" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        "PATCH",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": book_id, "status": "reading", "emotionTag": "설렘" })),
    )
    .await;
    assert_eq!(body["entry"]["startedAt"], today());
    assert_eq!(body["entry"]["finishedAt"], Value::Null);
    assert_eq!(body["entry"]["emotionTag"], "설렘");

    let (_, body) = send(
        &app,
        "PATCH",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": book_id, "status": "finished" })),
    )
    .await;
    assert_eq!(body["entry"]["status"], "finished");
    assert_eq!(body["entry"]["startedAt"], today());
    assert_eq!(body["entry"]["finishedAt"], today());
    assert_eq!(body["entry"]["emotionTag"], "설렘");

    let (_, body) = send(
        &app,
        "PATCH",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": book_id, "status": "want", "emotionTag": "" })),
    )
    .await;
    assert_eq!(body["entry"]["startedAt"], Value::Null);
    assert_eq!(body["entry"]["finishedAt"], Value::Null);
    assert_eq!(body["entry"]["emotionTag"], Value::Null);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": book_id, "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_library_listing_and_removal() {
    let (app, db) = setup_app().await;
    let alice = token_for(ALICE, Some("alice"));
    let bob = token_for(BOB, Some("bob"));
    let demian = create_test_book(&db, "데미안", None).await;
    let siddhartha = create_test_book(&db, "싯다르타", None).await;

    finish_book(&app, &alice, demian).await;
    send(
        &app,
        "POST",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": siddhartha, "status": "reading" })),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/user-books", Some(&alice), None).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/user-books?status=finished", Some(&alice), None).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["book"]["title"], "데미안");

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/user-books?bookId={}", siddhartha),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(body["entry"], Value::Null, "other users' entries are invisible");

    // Bob cannot touch Alice's entry: from his side it does not exist
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/user-books?bookId={}", demian),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/user-books?bookId={}", demian),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let remaining = user_book::Entity::find()
        .filter(user_book::Column::UserId.eq(ALICE))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(remaining, 1);

    let (status, _) = send(
        &app,
        "POST",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/user-books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_monthly_goal_progress() {
    let (app, db) = setup_app().await;
    let alice = token_for(ALICE, Some("alice"));

    let (status, body) = send(&app, "GET", "/api/goals/monthly", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"], Value::Null);
    assert_eq!(body["progress"], 0);

    let (status, _) = send(
        &app,
        "POST",
        "/api/goals/monthly",
        Some(&alice),
        Some(json!({ "target": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        "POST",
        "/api/goals/monthly",
        Some(&alice),
        Some(json!({ "target": 3 })),
    )
    .await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/goals/monthly",
        Some(&alice),
        Some(json!({ "target": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"], 10);

    for i in 0..4 {
        let id = create_test_book(&db, &format!("책 {}", i), None).await;
        finish_book(&app, &alice, id).await;
    }
    // Still reading does not count
    let reading = create_test_book(&db, "읽는 중", None).await;
    send(
        &app,
        "POST",
        "/api/user-books",
        Some(&alice),
        Some(json!({ "bookId": reading, "status": "reading" })),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/goals/monthly", Some(&alice), None).await;
    assert_eq!(body["target"], 10);
    assert_eq!(body["progress"], 4);
}

#[tokio::test]
async fn test_activity_ranking_and_genres() {
    let (app, db) = setup_app().await;
    let alice = token_for(ALICE, None);
    let bob = token_for(BOB, Some("bob"));
    let carol = token_for(CAROL, Some("carol"));

    let novel_a = create_test_book(&db, "데미안", Some("소설/시/희곡")).await;
    let novel_b = create_test_book(&db, "싯다르타", Some("소설/시/희곡")).await;
    let essay = create_test_book(&db, "월든", None).await;

    // Alice: two finished books, no profile yet
    finish_book(&app, &alice, novel_a).await;
    finish_book(&app, &alice, novel_b).await;

    // Bob: one finished book, one comment, one like
    finish_book(&app, &bob, essay).await;
    let (_, body) = send(
        &app,
        "POST",
        "/api/quotes",
        Some(&bob),
        Some(json!({ "bookId": essay, "content": "나는 숲으로 갔다" })),
    )
    .await;
    let quote_id = body["quote"]["id"].as_i64().unwrap();
    send(
        &app,
        "POST",
        "/api/quote-comments",
        Some(&bob),
        Some(json!({ "quoteId": quote_id, "content": "좋은 문장" })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/quote-likes",
        Some(&bob),
        Some(json!({ "quoteId": quote_id })),
    )
    .await;

    // Carol only reads her profile: zero score
    send(&app, "GET", "/api/profile", Some(&carol), None).await;

    let (status, body) = send(&app, "GET", "/api/stats/activity-ranking", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ranking = body["ranking"].as_array().unwrap();
    assert_eq!(ranking.len(), 2, "zero-score users are left out");

    // Bob: 0.5 + 0.3 + 0.2 = 1.0 ties Alice's 2 x 0.5; Alice has more finished books
    assert_eq!(ranking[0]["userId"], ALICE);
    assert_eq!(ranking[0]["nickname"], "anonymous");
    assert_eq!(ranking[0]["rank"], 1);
    assert_eq!(ranking[1]["userId"], BOB);
    assert_eq!(ranking[1]["nickname"], "bob");
    assert_eq!(ranking[1]["likeCount"], 1);
    assert_eq!(ranking[1]["commentCount"], 1);
    assert!((ranking[0]["score"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert!((ranking[1]["score"].as_f64().unwrap() - 1.0).abs() < 1e-9);

    let (_, body) = send(&app, "GET", "/api/stats/genres", None, None).await;
    assert_eq!(
        body["genres"],
        json!([
            { "category": "소설/시/희곡", "count": 2 },
            { "category": "uncategorized", "count": 1 }
        ])
    );
}

#[tokio::test]
async fn test_reading_trend_covers_twelve_months() {
    let (app, db) = setup_app().await;
    let alice = token_for(ALICE, Some("alice"));

    for title in ["데미안", "싯다르타", "월든"] {
        let id = create_test_book(&db, title, None).await;
        finish_book(&app, &alice, id).await;
    }

    let (status, body) = send(&app, "GET", "/api/stats/reading-trend", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let trend = body["trend"].as_array().unwrap();
    assert_eq!(trend.len(), 12);
    assert_eq!(trend[11]["month"], &today()[..7]);
    assert_eq!(trend[11]["count"], 3);
    assert_eq!(trend[11]["cumulative"], 3);
    assert!(trend[..11].iter().all(|p| p["count"] == 0));

    let (status, _) = send(&app, "GET", "/api/stats/reading-trend", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
