use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::build_router;
use crate::config::Config;
use crate::db::{with_pool, Db};
use crate::llm_client::testing::{Reply, ScriptedGenerator};
use crate::state::AppState;

fn test_config() -> Config {
    Config::from_lookup(|key: &str| match key {
        "JWT_SECRET" => Some("router-test-secret".to_string()),
        "LLM_API_KEY" => Some("unused".to_string()),
        _ => None,
    })
    .unwrap()
}

async fn app_with_db(replies: Vec<Reply>) -> (Router, Db) {
    let db = Db::in_memory().await.unwrap();
    let state = AppState {
        db: db.clone(),
        generator: Arc::new(ScriptedGenerator::new(replies)),
        config: test_config(),
    };
    (build_router(state), db)
}

async fn app(replies: Vec<Reply>) -> Router {
    app_with_db(replies).await.0
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Ada Lovelace",
            "email": email,
            "password": "analytical",
            "background": "Mathematician",
            "current_role": "Analyst",
            "skills": ["Excel"]
        })),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

async fn token_for(app: &Router, email: &str) -> String {
    register(app, email).await;
    let (_, body) = login(app, email, "analytical").await;
    body["access_token"].as_str().unwrap().to_string()
}

fn roadmap_reply(count: usize) -> Reply {
    let modules: Vec<Value> = (0..count)
        .map(|i| json!({ "title": format!("Step {i}"), "difficulty": "intermediate", "estimated_hours": 3 }))
        .collect();
    Reply::Text(format!("```json\n{}\n```", json!({ "modules": modules })))
}

#[tokio::test]
async fn test_health() {
    let app = app(vec![]).await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_returns_profile_without_hash() {
    let app = app(vec![]).await;
    let (status, body) = register(&app, "Ada@Example.com ").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["current_role"], "Analyst");
    assert_eq!(body["learning_intensity"], "moderate");
    assert!(body.get("password_hash").is_none());
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = app(vec![]).await;
    register(&app, "ada@example.com").await;
    let (status, body) = register(&app, "ADA@example.com").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = app(vec![]).await;
    let (status, _) = register(&app, "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "12345" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_success_and_failures() {
    let app = app(vec![]).await;
    register(&app, "ada@example.com").await;

    let (status, body) = login(&app, "ada@example.com", "analytical").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 1800);
    assert!(body["access_token"].as_str().unwrap().len() > 20);

    let (wrong_password, wrong_body) = login(&app, "ada@example.com", "difference").await;
    let (unknown_email, unknown_body) = login(&app, "bob@example.com", "analytical").await;
    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_inactive_account_login_looks_like_bad_credentials() {
    let (app, db) = app_with_db(vec![]).await;
    register(&app, "ada@example.com").await;
    let (_, wrong_body) = login(&app, "ada@example.com", "difference").await;

    with_pool!(&db, |pool| {
        sqlx::query("UPDATE users SET is_active = FALSE WHERE email = $1")
            .bind("ada@example.com")
            .execute(pool)
            .await
            .map(|_| ())
    })
    .unwrap();

    let (status, body) = login(&app, "ada@example.com", "analytical").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, wrong_body);
}

#[tokio::test]
async fn test_protected_routes_need_a_valid_token() {
    let app = app(vec![]).await;
    let (status, _) = send(&app, Method::GET, "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = token_for(&app, "ada@example.com").await;
    let (status, body) = send(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_profile_update_and_account_deletion() {
    let app = app(vec![]).await;
    let token = token_for(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/users/me",
        Some(&token),
        Some(json!({ "target_role": "Backend Engineer", "learning_intensity": "high" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target_role"], "Backend Engineer");
    assert_eq!(body["learning_intensity"], "high");
    assert_eq!(body["background"], "Mathematician");

    let (status, _) = send(&app, Method::DELETE, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token is still unexpired, but its user is gone.
    let (status, _) = send(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_generation_timeout_maps_to_504() {
    let app = app(vec![Reply::Timeout]).await;
    let token = token_for(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/roadmap/generate",
        Some(&token),
        Some(json!({ "goal": "Backend Engineer", "tech_stack": ["Python", "SQL"] })),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "PROVIDER_TIMEOUT");

    let (status, _) = send(&app, Method::GET, "/api/roadmap/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_learning_flow_end_to_end() {
    let app = app(vec![
        roadmap_reply(15),
        Reply::Text("What happens to rows without a match?".into()),
    ])
    .await;
    let token = token_for(&app, "ada@example.com").await;
    let auth = Some(token.as_str());

    // Generate
    let (status, generated) = send(
        &app,
        Method::POST,
        "/api/roadmap/generate",
        auth,
        Some(json!({ "goal": "Backend Engineer", "tech_stack": ["Python", "SQL"], "timeline_weeks": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(generated["roadmap"]["total_modules"], 15);
    assert_eq!(generated["roadmap"]["estimated_weeks"], 10);
    let modules = generated["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 15);
    assert_eq!(modules[14]["position"], 14);
    let module_id = modules[0]["id"].as_str().unwrap().to_string();

    let (status, active) = send(&app, Method::GET, "/api/roadmap/me", auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["roadmap"]["id"], generated["roadmap"]["id"]);

    let (status, module) = send(&app, Method::GET, &format!("/api/modules/{module_id}"), auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(module["title"], "Step 0");

    // Progress
    let update = json!({ "module_id": module_id, "status": "in_progress", "time_spent": 1.5 });
    send(&app, Method::POST, "/api/progress/update", auth, Some(update.clone())).await;
    let (status, progress) = send(&app, Method::POST, "/api/progress/update", auth, Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["progress"]["attempts"], 2);
    assert_eq!(progress["total_modules"], 15);

    let (_, rows) = send(&app, Method::GET, "/api/progress/me", auth, None).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);

    // Assessment
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/assessments",
        auth,
        Some(json!({
            "module_id": module_id,
            "title": "Joins",
            "questions": [
                { "question": "Keeps unmatched left rows?", "options": ["INNER", "LEFT"], "correct_answer": "LEFT" },
                { "question": "Keyword to filter groups?", "correct_answer": "HAVING" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let assessment_id = created["id"].as_str().unwrap().to_string();

    let (_, view) = send(&app, Method::GET, &format!("/api/assessments/{assessment_id}"), auth, None).await;
    assert!(!view.to_string().contains("HAVING"));
    assert_eq!(view["questions"][0]["options"], json!(["INNER", "LEFT"]));

    let (status, result) = send(
        &app,
        Method::POST,
        &format!("/api/assessments/{assessment_id}/submit"),
        auth,
        Some(json!({ "answers": ["left", "having"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["score"], 100.0);
    assert_eq!(result["passed"], true);
    assert_eq!(result["correct_answers"], 2);

    let (_, badges) = send(&app, Method::GET, "/api/badges", auth, None).await;
    assert_eq!(badges.as_array().unwrap().len(), 2);

    // Mentor
    let (status, reply) = send(
        &app,
        Method::POST,
        "/api/chat",
        auth,
        Some(json!({ "message": "Why does my LEFT JOIN return NULLs?", "context": { "module_id": module_id } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["response"], "What happens to rows without a match?");
    assert_eq!(reply["context"]["current_module"], "Step 0");

    let (_, history) = send(&app, Method::GET, "/api/chat/history?limit=5", auth, None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    // Analytics
    let (status, analytics) = send(&app, Method::GET, "/api/analytics/me", auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["completed_modules"], 1);
    assert_eq!(analytics["modules_by_difficulty"]["intermediate"], 15);

    let (_, roadmaps) = send(&app, Method::GET, "/api/roadmaps", auth, None).await;
    assert_eq!(roadmaps.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_users_cannot_see_each_others_modules() {
    let app = app(vec![roadmap_reply(15)]).await;
    let ada = token_for(&app, "ada@example.com").await;
    let bob = token_for(&app, "bob@example.com").await;

    let (_, generated) = send(
        &app,
        Method::POST,
        "/api/roadmap/generate",
        Some(&ada),
        Some(json!({ "goal": "Backend Engineer" })),
    )
    .await;
    let module_id = generated["modules"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, &format!("/api/modules/{module_id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/progress/update",
        Some(&bob),
        Some(json!({ "module_id": module_id, "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
