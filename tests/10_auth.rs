mod common;

use anyhow::Result;
use reqwest::StatusCode;

// Signup and token issuance against a live server with a throwaway database.

#[tokio::test]
async fn signup_then_login_issues_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let token = common::signup_and_login(server, &client, "auth_alice", "wonderland").await?;
    assert!(!token.is_empty());

    // the token opens the protected API
    let res = client
        .get(format!("{}/persons", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    common::signup_and_login(server, &client, "auth_taken", "pw1").await?;

    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&serde_json::json!({ "username": "auth_taken", "password": "pw2" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["code"], "CONFLICT");

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_recoverable_credentials_error() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    common::signup_and_login(server, &client, "auth_bob", "correct").await?;

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&serde_json::json!({ "username": "auth_bob", "password": "incorrect" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["code"], "INVALID_CREDENTIALS");

    Ok(())
}

#[tokio::test]
async fn protected_routes_challenge_without_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/persons", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );

    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/persons", server.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
