mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::build_app;

#[tokio::test]
async fn signup_confirm_login_and_me() -> anyhow::Result<()> {
    let app = build_app().await?;

    let res = app.signup("alice", "secret123").await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["email"], "alice@example.com");
    assert_eq!(res.body["confirmed"], false);
    assert_eq!(res.body["role"], "user");

    // verification mail goes to the outbox with an absolute link
    let mails = app.outbox(1).await?;
    assert_eq!(mails[0]["to"], "alice@example.com");
    let html = mails[0]["html_body"].as_str().unwrap_or_default();
    assert!(html.contains("http://contacts.test/api/v1/auth/confirmed_email/"));

    let res = app.login("alice", "secret123").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["detail"], "Email is not verified");

    let token = app.state.auth.verification_token("alice@example.com")?;
    let res = app.get(&format!("/api/v1/auth/confirmed_email/{token}"), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Email confirmed");
    let res = app.get(&format!("/api/v1/auth/confirmed_email/{token}"), None).await?;
    assert_eq!(res.body["message"], "Your email is already confirmed");

    // login by e-mail works too, and sets the access cookie
    let res = app.login("alice@example.com", "secret123").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["token_type"], "bearer");
    let cookie = res.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("access_token="));
    let access = res.body["access_token"].as_str().unwrap_or_default().to_string();

    let res = app.get("/api/v1/auth/me", Some(&access)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["username"], "alice");
    assert_eq!(res.body["confirmed"], true);

    // cookie alone is enough
    let pair = cookie.split(';').next().unwrap_or_default().to_string();
    let req = axum::http::Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::COOKIE, pair)
        .body(axum::body::Body::empty())?;
    let res = app.send(req).await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicates_and_bad_input() -> anyhow::Result<()> {
    let app = build_app().await?;
    assert_eq!(app.signup("bobby", "secret123").await?.status, StatusCode::CREATED);

    let res = app.signup("bobby", "secret123").await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["detail"], "Account already exists");

    let res = app.signup("carol", "short").await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let res = app
        .json("POST", "/api/v1/auth/signup", None, json!({"username": "dave", "email": "not-an-email", "password": "secret123"}))
        .await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["error"], "Validation Error");
    Ok(())
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() -> anyhow::Result<()> {
    let app = build_app().await?;
    app.register("erin").await?;

    let res = app.login("erin", "not-the-password").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["detail"], "Invalid password");

    let res = app.login("nobody", "secret123").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["detail"], "Invalid username or email");
    Ok(())
}

#[tokio::test]
async fn missing_or_bad_token_is_rejected() -> anyhow::Result<()> {
    let app = build_app().await?;

    let res = app.get("/api/v1/auth/me", None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers.get(header::WWW_AUTHENTICATE).and_then(|v| v.to_str().ok()), Some("Bearer"));
    assert_eq!(res.body["detail"], "Could not validate credentials");

    let res = app.get("/api/v1/auth/me", Some("garbage")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // a verification token cannot be used as an access token
    app.register("frank").await?;
    let wrong_scope = app.state.auth.verification_token("frank@example.com")?;
    let res = app.get("/api/v1/auth/me", Some(&wrong_scope)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_logout_revokes() -> anyhow::Result<()> {
    let app = build_app().await?;
    app.register("grace").await?;
    let first = app.login("grace", "secret123").await?;
    let refresh = first.body["refresh_token"].as_str().unwrap_or_default().to_string();

    let res = app.json("POST", "/api/v1/auth/refresh_token", None, json!({"refresh_token": refresh})).await?;
    assert_eq!(res.status, StatusCode::OK);
    let rotated = res.body["refresh_token"].as_str().unwrap_or_default().to_string();
    assert_ne!(rotated, refresh);
    let access = res.body["access_token"].as_str().unwrap_or_default().to_string();

    // spent token cannot be replayed
    let res = app.json("POST", "/api/v1/auth/refresh_token", None, json!({"refresh_token": refresh})).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.json("POST", "/api/v1/auth/logout", Some(&access), json!({})).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.json("POST", "/api/v1/auth/refresh_token", None, json!({"refresh_token": rotated})).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn me_is_rate_limited_per_user() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = app.register("heidi").await?;
    let other = app.register("ivan1").await?;

    for _ in 0..10 {
        assert_eq!(app.get("/api/v1/auth/me", Some(&token)).await?.status, StatusCode::OK);
    }
    let res = app.get("/api/v1/auth/me", Some(&token)).await?;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers.contains_key(header::RETRY_AFTER));

    // separate budget for another user
    assert_eq!(app.get("/api/v1/auth/me", Some(&other)).await?.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn request_email_cases() -> anyhow::Result<()> {
    let app = build_app().await?;
    let res = app.json("POST", "/api/v1/auth/request_email", None, json!({"email": "ghost@example.com"})).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    app.signup("judy1", "secret123").await?;
    let res = app.json("POST", "/api/v1/auth/request_email", None, json!({"email": "judy1@example.com"})).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.outbox(2).await?.len(), 2);

    app.register("kevin").await?;
    let res = app.json("POST", "/api/v1/auth/request_email", None, json!({"email": "kevin@example.com"})).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn password_reset_flow() -> anyhow::Result<()> {
    let app = build_app().await?;
    app.register("laura").await?;
    let old = app.login("laura", "secret123").await?;
    let old_refresh = old.body["refresh_token"].as_str().unwrap_or_default().to_string();

    // same answer whether or not the account exists
    let res = app.json("POST", "/api/v1/auth/request_password_reset", None, json!({"email": "ghost@example.com"})).await?;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    let res = app.json("POST", "/api/v1/auth/request_password_reset", None, json!({"email": "laura@example.com"})).await?;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    let mails = app.outbox(2).await?;
    assert!(mails.iter().any(|m| m["subject"] == "Password reset request"));

    let res = app.json("POST", "/api/v1/auth/reset_password/not-a-token", None, json!({"new_password": "brandnew1"})).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let (_, token) = app
        .state
        .auth
        .password_reset_token("laura@example.com")
        .await?
        .ok_or_else(|| anyhow::anyhow!("no reset token"))?;
    let res = app
        .json("POST", &format!("/api/v1/auth/reset_password/{token}"), None, json!({"new_password": "brandnew1"}))
        .await?;
    assert_eq!(res.status, StatusCode::OK);

    assert_eq!(app.login("laura", "secret123").await?.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("laura", "brandnew1").await?.status, StatusCode::OK);
    let res = app.json("POST", "/api/v1/auth/refresh_token", None, json!({"refresh_token": old_refresh})).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}
