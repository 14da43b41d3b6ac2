//! Integration tests for the WebDAV surface.

mod helpers;

use axum::body::Body;
use http::StatusCode;

use helpers::{TestApp, dav};

#[tokio::test]
async fn test_propfind_challenges_then_lists_root() {
    let app = TestApp::new().await;

    let anonymous = http::Request::builder()
        .method("PROPFIND")
        .uri("/dav/")
        .header("Depth", "1")
        .body(Body::empty())
        .unwrap();
    let response = app.send(anonymous).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let challenges = response.challenges();
    assert!(challenges.iter().any(|c| c.starts_with("Basic ")));
    assert!(challenges.iter().any(|c| c.starts_with("Digest ")));
    assert_eq!(response.header("dav"), Some("1"));

    let response = app
        .send(
            dav("PROPFIND", "/dav/")
                .header("Depth", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    assert_eq!(response.header("dav"), Some("1"));
    assert!(
        response
            .header("content-type")
            .unwrap()
            .starts_with("application/xml")
    );
    let xml = response.text();
    assert!(xml.contains(r#"<multistatus xmlns="DAV:">"#));
    assert!(xml.contains("<href>/dav/</href>"));
}

#[tokio::test]
async fn test_put_then_get() {
    let app = TestApp::new().await;

    let response = app
        .send(dav("PUT", "/dav/hello.txt").body(Body::from("hello")).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .send(dav("GET", "/dav/hello.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "hello");
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.header("content-length"), Some("5"));
}

#[tokio::test]
async fn test_mkcol_copy_and_list() {
    let app = TestApp::new().await;
    app.send(dav("PUT", "/dav/hello.txt").body(Body::from("hello")).unwrap())
        .await;

    let response = app
        .send(dav("MKCOL", "/dav/d").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .send(
            dav("COPY", "/dav/hello.txt")
                .header("Destination", "/dav/d/hi.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .send(
            dav("PROPFIND", "/dav/d")
                .header("Depth", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    let xml = response.text();
    assert!(xml.contains("<href>/dav/d/</href>"));
    assert!(xml.contains("<href>/dav/d/hi.txt</href>"));
    assert!(xml.contains("<getcontentlength>5</getcontentlength>"));

    // The source survives a copy.
    let response = app
        .send(dav("GET", "/dav/hello.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_move_then_delete_directory() {
    let app = TestApp::new().await;
    app.send(dav("MKCOL", "/dav/d").body(Body::empty()).unwrap())
        .await;
    app.send(dav("PUT", "/dav/d/hi.txt").body(Body::from("hello")).unwrap())
        .await;

    let response = app
        .send(
            dav("MOVE", "/dav/d/hi.txt")
                .header("Destination", "http://localhost/dav/d/bye.txt")
                .header("Host", "localhost")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .send(dav("GET", "/dav/d/hi.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.text().contains(r#"<error xmlns="DAV:">"#));

    let response = app
        .send(dav("GET", "/dav/d/bye.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "hello");

    let response = app
        .send(dav("DELETE", "/dav/d").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .send(dav("PROPFIND", "/dav/d").header("Depth", "0").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dot_dot_stays_inside_repository() {
    let app = TestApp::new().await;

    let response = app
        .send(dav("PUT", "/dav/../etc/passwd").body(Body::from("x")).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    assert!(app.data_dir.join("alice/etc/passwd").is_file());

    let response = app
        .send(dav("GET", "/dav/etc/passwd").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "x");
}

#[tokio::test]
async fn test_destination_dot_dot_resolves_like_request_path() {
    let app = TestApp::new().await;
    app.send(dav("MKCOL", "/dav/d").body(Body::empty()).unwrap())
        .await;
    app.send(dav("PUT", "/dav/d/a.txt").body(Body::from("a")).unwrap())
        .await;

    let response = app
        .send(
            dav("MOVE", "/dav/d/a.txt")
                .header("Destination", "/dav/../moved.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(app.data_dir.join("alice/moved.txt").is_file());

    let response = app
        .send(dav("GET", "/dav/../moved.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "a");
}

#[tokio::test]
async fn test_destination_outside_mount_is_forbidden() {
    let app = TestApp::new().await;
    app.send(dav("PUT", "/dav/a.txt").body(Body::from("a")).unwrap())
        .await;

    let response = app
        .send(
            dav("COPY", "/dav/a.txt")
                .header("Destination", "/elsewhere/a.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .send(dav("COPY", "/dav/a.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_options_and_unsupported_verbs() {
    let app = TestApp::new().await;

    let response = app
        .send(dav("OPTIONS", "/dav/").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("dav"), Some("1"));
    assert!(response.header("allow").unwrap().contains("PROPFIND"));

    let response = app
        .send(dav("LOCK", "/dav/a.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.text().contains(r#"<error xmlns="DAV:">"#));
}

#[tokio::test]
async fn test_quota_tracks_put_and_delete() {
    let app = TestApp::new().await;
    let alice = app.state.credentials.find_by_username("alice").await.unwrap().unwrap();

    app.send(dav("PUT", "/dav/q.bin").body(Body::from("12345678")).unwrap())
        .await;
    let used = |app: &TestApp| {
        let users = app.users.clone();
        let id = alice.id;
        async move {
            use filehub_database::UserDirectory;
            users.find_by_id(id).await.unwrap().unwrap().used_bytes
        }
    };
    assert_eq!(used(&app).await, 8);

    app.send(dav("PUT", "/dav/q.bin").body(Body::from("123")).unwrap())
        .await;
    assert_eq!(used(&app).await, 3);

    let response = app
        .send(dav("DELETE", "/dav/q.bin").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(used(&app).await, 0);
}
