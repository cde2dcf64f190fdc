use anyhow::Result;
use authgate::navigation::Navigator;
use authgate::{
    cli::{actions::app::App, globals::GlobalArgs},
    navigation::Destination,
};
use secrecy::SecretString;
use serde_json::json;
use std::net::TcpListener;
use std::path::Path;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, path_regex, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn globals(server: &MockServer, cache_path: &Path) -> GlobalArgs {
    let mut globals = GlobalArgs::new(
        SecretString::from("api-key".to_string()),
        "demo".to_string(),
        cache_path.to_path_buf(),
    );
    globals.auth_url = server.uri();
    globals.token_url = server.uri();
    globals.firestore_url = server.uri();
    globals
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "api-key"))
        .and(body_partial_json(json!({"email": "ada@x.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "u1",
            "email": "ada@x.com",
            "displayName": "Ada",
            "idToken": "id-1",
            "refreshToken": "refresh-1",
            "registered": true
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{
                "localId": "u1",
                "email": "ada@x.com",
                "displayName": "Ada",
                "emailVerified": true
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_persists_across_invocations_until_logout() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("storage.json");
    let globals = globals(&server, &cache_path);

    mount_sign_in(&server).await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/v1/projects/demo/databases/.+/documents/users/u1$"))
        .and(header("authorization", "Bearer id-1"))
        .and(query_param("updateMask.fieldPaths", "displayName"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "users/u1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "id-2",
            "refresh_token": "refresh-2",
            "user_id": "u1",
            "expires_in": "3600"
        })))
        .mount(&server)
        .await;

    // First invocation: sign in from the login view.
    let app = App::boot(&globals, "/login").await?;
    assert!(!app.session.is_logged_in());
    let outcome = app
        .auth
        .login("ada@x.com", &SecretString::from("secret".to_string()))
        .await;
    assert!(outcome.is_completed());
    assert_eq!(app.router.current(), Some(Destination::Dashboard));
    app.shutdown().await;

    // Second invocation: the cached session admits the dashboard.
    let app = App::boot(&globals, "/dashboard").await?;
    assert!(app.session.is_logged_in());
    assert_eq!(app.router.current(), Some(Destination::Dashboard));
    assert_eq!(
        app.auth.current_user().and_then(|p| p.display_name),
        Some("Ada".to_string())
    );
    assert!(app.auth.logout().await.is_completed());
    app.shutdown().await;

    // Third invocation: nobody is signed in, the dashboard is denied.
    let app = App::boot(&globals, "/dashboard").await?;
    assert!(!app.session.is_logged_in());
    assert_eq!(app.router.current(), Some(Destination::Login));
    app.shutdown().await;

    Ok(())
}

#[tokio::test]
async fn rejected_login_leaves_cache_logged_out() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let globals = globals(&server, &dir.path().join("storage.json"));

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = App::boot(&globals, "/login").await?;
    let outcome = app
        .auth
        .login("ada@x.com", &SecretString::from("wrong".to_string()))
        .await;
    assert!(!outcome.is_completed());
    assert!(!app.session.is_logged_in());
    assert_eq!(app.router.current(), Some(Destination::Login));
    app.shutdown().await;

    Ok(())
}
