use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use server::{routes, ServerState};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "Adm1nPass";
const BOUNDARY: &str = "XTESTBOUNDARY";

struct TestApp {
    router: Router,
    _uploads: tempfile::TempDir,
}

async fn start_app() -> anyhow::Result<TestApp> {
    let uploads = tempfile::tempdir()?;
    let mut cfg = configs::AppConfig::default();
    cfg.database.url = "sqlite::memory:".into();
    cfg.admin.email = ADMIN_EMAIL.into();
    cfg.admin.password = ADMIN_PASSWORD.into();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.uploads.root = uploads.path().to_string_lossy().into_owned();

    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    let state = ServerState::new(db, &cfg);
    Ok(TestApp { router: routes::build_router(state, CorsLayer::very_permissive()), _uploads: uploads })
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
        let resp = self.router.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        Ok((status, body))
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.send(req).await
    }

    async fn login(&self, email: &str, password: &str) -> anyhow::Result<String> {
        let (status, body) = self.call(Method::POST, "/api/auth/login", None, Some(json!({"email": email, "password": password}))).await?;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        Ok(body["access_token"].as_str().unwrap_or_default().to_string())
    }
}

fn multipart_pdf(file_name: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"documents\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4 test\r\n--{BOUNDARY}--\r\n"
    )
}

#[tokio::test]
async fn health_and_auth_guard() -> anyhow::Result<()> {
    let app = start_app().await?;
    let (status, body) = app.call(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.call(Method::GET, "/api/services", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert!(body["error"].is_string());

    let (status, _) = app.call(Method::GET, "/api/services", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() -> anyhow::Result<()> {
    let app = start_app().await?;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}).to_string()))?;
    let resp = app.router.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .unwrap_or_default();
    assert!(cookie.starts_with("auth_token="));

    let req = Request::builder().uri("/api/admin/dashboard").header(header::COOKIE, cookie).body(Body::empty())?;
    let (status, body) = app.send(req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_users"], 0);

    let (status, _) = app.call(Method::POST, "/api/auth/login", None, Some(json!({"email": ADMIN_EMAIL, "password": "wrong"}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn full_request_lifecycle_over_http() -> anyhow::Result<()> {
    let app = start_app().await?;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let (status, svc) = app
        .call(Method::POST, "/api/admin/services", Some(&admin), Some(json!({"name": "Plumbing", "base_price": 50.0, "estimated_time": 60})))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{svc}");
    let service_id = svc["id"].as_i64().unwrap_or_default();

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/register/customer",
            None,
            Some(json!({"email": "cust@example.com", "password": "Secret123", "name": "Casey", "location": "1 Elm St", "pincode": "10001"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, reg) = app
        .call(
            Method::POST,
            "/api/auth/register/professional",
            None,
            Some(json!({"email": "pro@example.com", "password": "Secret123", "name": "Pat", "service_id": service_id, "experience_years": 5, "location": "2 Oak St"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let professional_id = reg["professional_id"].as_i64().unwrap_or_default();

    let customer = app.login("cust@example.com", "Secret123").await?;
    let pro = app.login("pro@example.com", "Secret123").await?;

    let (status, req) = app
        .call(Method::POST, "/api/service-requests", Some(&customer), Some(json!({"service_id": service_id, "location": "1 Elm St", "pin_code": "10001"})))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{req}");
    assert_eq!(req["status"], "REQUESTED");
    let request_id = req["id"].as_i64().unwrap_or_default();

    // 未认证的专业人员不能接单
    let accept_uri = format!("/api/service-requests/{request_id}/accept");
    let (status, _) = app.call(Method::POST, &accept_uri, Some(&pro), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let upload = Request::builder()
        .method(Method::POST)
        .uri("/api/professionals/documents")
        .header(header::AUTHORIZATION, format!("Bearer {pro}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_pdf("licence.pdf")))?;
    let (status, docs) = app.send(upload).await?;
    assert_eq!(status, StatusCode::CREATED, "{docs}");
    assert_eq!(docs[0]["status"], "pending_verification");

    let (status, _) = app.call(Method::POST, &format!("/api/admin/professionals/verify/{professional_id}"), Some(&customer), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, msg) = app.call(Method::POST, &format!("/api/admin/professionals/verify/{professional_id}"), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(msg["message"].is_string());

    // 同一个 token：认证状态在解析时从数据库读取
    let (status, avail) = app.call(Method::GET, "/api/service-requests/available", Some(&pro), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(avail.as_array().map(Vec::len), Some(1));
    let (status, accepted) = app.call(Method::POST, &accept_uri, Some(&pro), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "ASSIGNED");

    let (status, body) = app.call(Method::POST, &accept_uri, Some(&pro), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request is not available for acceptance");

    let (status, _) = app.call(Method::POST, &format!("/api/service-requests/{request_id}/start"), Some(&pro), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, done) = app
        .call(Method::POST, &format!("/api/service-requests/{request_id}/complete"), Some(&customer), Some(json!({"rating": 5, "remarks": "great"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "COMPLETED");

    let (status, view) = app.call(Method::GET, &format!("/api/professionals/{professional_id}"), Some(&customer), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total_reviews"], 1);

    let (status, _) = app.call(Method::POST, &format!("/api/service-requests/{request_id}/cancel"), Some(&customer), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.call(Method::GET, "/api/service-requests/999", Some(&customer), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::GET, "/api/admin/dashboard", Some(&customer), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = app.call(Method::GET, "/api/admin/dashboard", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["requests_by_status"]["COMPLETED"], 1);
    Ok(())
}

#[tokio::test]
async fn unreadable_completion_body_keeps_request_in_progress() -> anyhow::Result<()> {
    let app = start_app().await?;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let (_, svc) = app
        .call(Method::POST, "/api/admin/services", Some(&admin), Some(json!({"name": "Cleaning", "base_price": 30.0, "estimated_time": 90})))
        .await?;
    let service_id = svc["id"].as_i64().unwrap_or_default();
    app.call(
        Method::POST,
        "/api/auth/register/customer",
        None,
        Some(json!({"email": "cust@example.com", "password": "Secret123", "name": "Casey", "location": "1 Elm St", "pincode": "10001"})),
    )
    .await?;
    let (_, reg) = app
        .call(
            Method::POST,
            "/api/auth/register/professional",
            None,
            Some(json!({"email": "pro@example.com", "password": "Secret123", "name": "Pat", "service_id": service_id, "experience_years": 2, "location": "2 Oak St"})),
        )
        .await?;
    let professional_id = reg["professional_id"].as_i64().unwrap_or_default();
    let customer = app.login("cust@example.com", "Secret123").await?;
    let pro = app.login("pro@example.com", "Secret123").await?;

    let (_, req) = app
        .call(Method::POST, "/api/service-requests", Some(&customer), Some(json!({"service_id": service_id, "location": "1 Elm St", "pin_code": "10001"})))
        .await?;
    let request_id = req["id"].as_i64().unwrap_or_default();
    let (status, _) = app
        .call(Method::POST, &format!("/api/service-requests/{request_id}/assign"), Some(&admin), Some(json!({"professional_id": professional_id})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::POST, &format!("/api/service-requests/{request_id}/start"), Some(&pro), None).await?;
    assert_eq!(status, StatusCode::OK);

    let complete_uri = format!("/api/service-requests/{request_id}/complete");
    for bad in [json!({"rating": 4.5, "remarks": "great"}), json!({"rating": "5"})] {
        let (status, body) = app.call(Method::POST, &complete_uri, Some(&customer), Some(bad)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].is_string());
    }
    // 有请求体但缺少 JSON Content-Type
    let untyped = Request::builder()
        .method(Method::POST)
        .uri(&complete_uri)
        .header(header::AUTHORIZATION, format!("Bearer {customer}"))
        .body(Body::from(json!({"rating": 5}).to_string()))?;
    let (status, _) = app.send(untyped).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, current) = app.call(Method::GET, &format!("/api/service-requests/{request_id}"), Some(&customer), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["status"], "IN_PROGRESS");

    let (status, done) = app.call(Method::POST, &complete_uri, Some(&customer), Some(json!({"rating": 4}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "COMPLETED");
    let (_, view) = app.call(Method::GET, &format!("/api/professionals/{professional_id}"), Some(&customer), None).await?;
    assert_eq!(view["total_reviews"], 1);
    Ok(())
}

#[tokio::test]
async fn malformed_input_returns_error_payload() -> anyhow::Result<()> {
    let app = start_app().await?;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    app.call(
        Method::POST,
        "/api/auth/register/customer",
        None,
        Some(json!({"email": "cust@example.com", "password": "Secret123", "name": "Casey", "location": "1 Elm St", "pincode": "10001"})),
    )
    .await?;
    let customer = app.login("cust@example.com", "Secret123").await?;

    let (status, body) = app.call(Method::POST, "/api/service-requests", Some(&customer), Some(json!({"service_id": 1}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Validation Error");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("location")), "{body}");

    let (status, body) = app.call(Method::GET, "/api/service-requests/abc", Some(&customer), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.call(Method::GET, "/api/admin/users?page=first", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.call(Method::POST, "/api/auth/login", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn export_job_lifecycle() -> anyhow::Result<()> {
    let app = start_app().await?;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let (status, started) = app.call(Method::POST, "/api/admin/export/service-requests", Some(&admin), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = started["job_id"].as_str().unwrap_or_default().to_string();

    let mut body = Value::Null;
    for _ in 0..100 {
        let (_, b) = app.call(Method::GET, &format!("/api/admin/export/status/{job_id}"), Some(&admin), None).await?;
        body = b;
        if body["status"] == "failed" || body["status"] == "completed" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    // 没有已完成的请求：任务以失败结束
    assert_eq!(body["status"], "failed");

    let (status, _) = app.call(Method::GET, "/api/admin/export/status/nope", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::GET, "/api/admin/export/download/..%2Fsecret.csv", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn refresh_accepts_only_refresh_tokens() -> anyhow::Result<()> {
    let app = start_app().await?;
    let (_, session) = app.call(Method::POST, "/api/auth/login", None, Some(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}))).await?;
    let refresh = session["refresh_token"].as_str().unwrap_or_default();
    let access = session["access_token"].as_str().unwrap_or_default();

    let (status, body) = app.call(Method::POST, "/api/auth/refresh", None, Some(json!({"refresh_token": refresh}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    let (status, _) = app.call(Method::POST, "/api/auth/refresh", None, Some(json!({"refresh_token": access}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
