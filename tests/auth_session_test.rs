mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, session_cookie, set_cookies, TestApp};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

async fn mount_successful_login(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/api/method/login"))
        .and(body_json(json!({ "usr": "ada@example.com", "pwd": "correct-horse" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Logged In",
            "full_name": "Ada Lovelace"
        })))
        .mount(&app.erp)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/resource/User/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "name": "ada@example.com",
                "full_name": "Ada Lovelace",
                "roles": [{ "role": "Employee" }, { "role": "HR Manager" }]
            }
        })))
        .mount(&app.erp)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/resource/Employee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "name": "HR-EMP-0001" }]
        })))
        .mount(&app.erp)
        .await;
}

#[tokio::test]
async fn login_sets_session_cookies() {
    let app = TestApp::new().await;
    mount_successful_login(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "correct-horse" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 3);
    for name in ["user_id=", "user_role=", "full_name="] {
        let cookie = cookies
            .iter()
            .find(|c| c.starts_with(name))
            .unwrap_or_else(|| panic!("missing cookie {}", name));
        assert!(cookie.contains("HttpOnly"), "{} is not HttpOnly", cookie);
        assert!(cookie.contains("Path=/"));
    }
    assert!(cookies.iter().any(|c| c.starts_with("user_role=hr_manager")));

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user_id"], "ada@example.com");
    assert_eq!(body["data"]["role"], "hr_manager");
    assert_eq!(body["data"]["full_name"], "Ada Lovelace");
    assert_eq!(body["data"]["employee"], "HR-EMP-0001");
}

#[tokio::test]
async fn rejected_credentials_set_no_cookies() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/api/method/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid login credentials"
        })))
        .mount(&app.erp)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "wrong" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    let body = json_body(response).await;
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/auth/login", Some(json!({ "email": "" })))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn me_reads_the_session_cookies() {
    let app = TestApp::new().await;

    let anonymous = app.request(Method::GET, "/api/auth/me", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let cookie = session_cookie("ada@example.com", "accountant", "Ada Lovelace");
    let response = app
        .request_with_headers(Method::GET, "/api/auth/me", None, &[("cookie", &cookie)])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["user_id"], "ada@example.com");
    assert_eq!(body["data"]["role"], "accountant");
    assert_eq!(body["data"]["full_name"], "Ada Lovelace");
}

#[tokio::test]
async fn logout_expires_session_cookies() {
    let app = TestApp::new().await;
    let cookie = session_cookie("ada@example.com", "employee", "Ada");

    let response = app
        .request_with_headers(Method::POST, "/api/auth/logout", None, &[("cookie", &cookie)])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 3);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    let body = json_body(response).await;
    assert_eq!(body["message"], "Logged out");
}

#[tokio::test]
async fn change_password_requires_a_session() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/change-password",
            Some(json!({ "current_password": "old-password", "new_password": "new-password" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_rejects_short_passwords() {
    let app = TestApp::new().await;
    let cookie = session_cookie("ada@example.com", "employee", "Ada");

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/auth/change-password",
            Some(json!({ "current_password": "old-password", "new_password": "short" })),
            &[("cookie", &cookie)],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.erp.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn change_password_verifies_the_current_password() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/api/method/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Logged In" })))
        .expect(1)
        .mount(&app.erp)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/resource/User/"))
        .and(body_json(json!({ "new_password": "new-password" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "name": "ada@example.com" }
        })))
        .expect(1)
        .mount(&app.erp)
        .await;

    let cookie = session_cookie("ada@example.com", "employee", "Ada");
    let response = app
        .request_with_headers(
            Method::POST,
            "/api/auth/change-password",
            Some(json!({ "current_password": "old-password", "new_password": "new-password" })),
            &[("cookie", &cookie)],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}
