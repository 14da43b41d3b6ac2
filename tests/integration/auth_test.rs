//! Integration tests for authentication flows.

mod helpers;

use axum::body::Body;
use http::StatusCode;
use serde_json::json;

use helpers::{TestApp, basic, challenge_param};

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

#[tokio::test]
async fn test_login_wrong_password_then_cookie_session() {
    let app = TestApp::new().await;

    let response = app
        .api(
            "POST",
            "/api/login",
            Some(json!({ "username": "alice", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json(), json!({ "error": "Invalid username or password" }));
    assert!(response.challenges().is_empty());

    let response = app
        .api(
            "POST",
            "/api/login",
            Some(json!({ "username": "alice", "password": "s3cret" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "username": "alice", "is_admin": false }));
    let set_cookie = response
        .set_cookies()
        .into_iter()
        .find(|c| c.starts_with("filehub_session="))
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = response.session_cookie().unwrap();

    let response = app.api("GET", "/api/me", None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["username"], "alice");
    assert!(!response.json()["last_login_at"].is_null());

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .header("Depth", "0")
        .header("Cookie", &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let app = TestApp::new().await;
    let cookie = app.login("alice", "s3cret").await;

    let response = app.api("POST", "/api/logout", None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let cleared = response
        .set_cookies()
        .into_iter()
        .find(|c| c.starts_with("filehub_session="))
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let response = app.api("GET", "/api/me", None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Logging out twice is harmless.
    let response = app.api("POST", "/api/logout", None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.api("GET", "/api/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.json()["error"].is_string());
    assert!(response.challenges().is_empty());

    let response = app
        .api("GET", "/api/me", None, Some("filehub_session=not-a-session"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_basic_with_wrong_password_is_rejected() {
    let app = TestApp::new().await;

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .header("Authorization", basic("alice", "nope"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.text().contains(r#"<error xmlns="DAV:">"#));

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .header("Authorization", "Bearer abc")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_digest_against_fresh_nonce() {
    let app = TestApp::new().await;

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let challenge = response
        .challenges()
        .into_iter()
        .find(|c| c.starts_with("Digest "))
        .unwrap();
    let realm = challenge_param(&challenge, "realm").unwrap();
    let nonce = challenge_param(&challenge, "nonce").unwrap();
    let opaque = challenge_param(&challenge, "opaque").unwrap();
    assert_eq!(realm, "FileHub");

    let digest_header = |password: &str| {
        let ha1 = md5_hex(&format!("alice:{realm}:{password}"));
        let ha2 = md5_hex("PROPFIND:/dav/");
        let response = md5_hex(&format!("{ha1}:{nonce}:00000001:0a4f113b:auth:{ha2}"));
        format!(
            r#"Digest username="alice", realm="{realm}", nonce="{nonce}", uri="/dav/", qop=auth, nc=00000001, cnonce="0a4f113b", response="{response}", opaque="{opaque}", algorithm=MD5"#
        )
    };

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .header("Depth", "0")
        .header("Authorization", digest_header("s3cret"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    // Digest never creates a session.
    assert!(response.session_cookie().is_none());

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .header("Authorization", digest_header("wrong"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(
        response
            .challenges()
            .iter()
            .any(|c| c.starts_with("Digest "))
    );
}

#[tokio::test]
async fn test_digest_signed_for_another_uri_is_rejected() {
    let app = TestApp::new().await;
    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .body(Body::empty())
        .unwrap();
    let challenge = app
        .send(request)
        .await
        .challenges()
        .into_iter()
        .find(|c| c.starts_with("Digest "))
        .unwrap();
    let nonce = challenge_param(&challenge, "nonce").unwrap();
    let opaque = challenge_param(&challenge, "opaque").unwrap();

    let ha1 = md5_hex("alice:FileHub:s3cret");
    let ha2 = md5_hex("PROPFIND:/dav/");
    let response = md5_hex(&format!("{ha1}:{nonce}:00000001:0a4f113b:auth:{ha2}"));
    let header = format!(
        r#"Digest username="alice", realm="FileHub", nonce="{nonce}", uri="/dav/", qop=auth, nc=00000001, cnonce="0a4f113b", response="{response}", opaque="{opaque}""#
    );

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/other")
        .header("Depth", "0")
        .header("Authorization", header.as_str())
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(
        response
            .challenges()
            .iter()
            .any(|c| c.starts_with("Digest "))
    );

    let request = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .header("Depth", "0")
        .header("Authorization", header.as_str())
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn test_digest_with_unknown_nonce_is_rejected() {
    let app = TestApp::new().await;
    let ha1 = md5_hex("alice:FileHub:s3cret");
    let ha2 = md5_hex("GET:/dav/");
    let response = md5_hex(&format!("{ha1}:deadbeef:{ha2}"));
    let header = format!(
        r#"Digest username="alice", realm="FileHub", nonce="deadbeef", uri="/dav/", response="{response}""#
    );

    let request = http::Request::builder()
        .method("GET")
        .uri("/dav/")
        .header("Authorization", header)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let cookie = app.login("alice", "s3cret").await;

    let response = app
        .api(
            "POST",
            "/api/me/password",
            Some(json!({ "current_password": "wrong", "new_password": "n3w" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .api(
            "POST",
            "/api/me/password",
            Some(json!({ "current_password": "s3cret", "new_password": "n3w" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let propfind = |password: &str| {
        http::Request::builder()
            .method("PROPFIND")
            .uri("/dav/")
            .header("Depth", "0")
            .header("Authorization", basic("alice", password))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(app.send(propfind("s3cret")).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.send(propfind("n3w")).await.status, StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn test_setup_flow() {
    let app = TestApp::empty().await;

    let response = app.api("GET", "/api/setup", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "needs_setup": true }));

    let response = app
        .api(
            "POST",
            "/api/setup",
            Some(json!({ "username": "Root", "password": "t0psecret" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["username"], "root");
    assert_eq!(response.json()["is_admin"], true);

    let response = app.api("GET", "/api/setup", None, None).await;
    assert_eq!(response.json(), json!({ "needs_setup": false }));

    let response = app
        .api(
            "POST",
            "/api/setup",
            Some(json!({ "username": "other", "password": "x" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    // The administrator can use their home repository right away.
    let request = http::Request::builder()
        .method("PUT")
        .uri("/dav/first.txt")
        .header("Authorization", basic("root", "t0psecret"))
        .body(Body::from("hi"))
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_setup_rejects_username_unusable_as_repository_name() {
    let app = TestApp::empty().await;

    for username in ["a/b", "..", "back\\slash"] {
        let response = app
            .api(
                "POST",
                "/api/setup",
                Some(json!({ "username": username, "password": "t0psecret" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{username}");
    }

    // Nothing was half-written: setup is still open.
    let response = app.api("GET", "/api/setup", None, None).await;
    assert_eq!(response.json(), json!({ "needs_setup": true }));

    let response = app
        .api(
            "POST",
            "/api/setup",
            Some(json!({ "username": "root", "password": "t0psecret" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let response = app.api("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}
