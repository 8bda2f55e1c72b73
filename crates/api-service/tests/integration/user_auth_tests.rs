//! E2E tests for registration, login and the current-user profile.
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use api_test_utils::*;
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_happy_path_returns_safe_user() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let response = server.register(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["id"].as_i64(), Some(1));
    assert_eq!(body["username"].as_str(), Some(TEST_USERNAME_ALICE));
    assert!(body.get("password").is_none(), "Password hash must not leak");
    assert!(body.get("api_key").is_none(), "API key hash must not leak");

    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_username_returns_conflict() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    server.create_user(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;

    let response = server
        .register(TEST_USERNAME_ALICE, "another-password")
        .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("CONSTRAINT_VIOLATION"));

    Ok(())
}

#[tokio::test]
async fn test_register_short_password_returns_bad_request() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let response = server.register(TEST_USERNAME_ALICE, "short").await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("BAD_REQUEST"));

    Ok(())
}

#[tokio::test]
async fn test_register_password_over_72_bytes_returns_bad_request() -> Result<(), anyhow::Error>
{
    let server = TestApiServer::spawn().await?;

    let too_long = format!("{}SECRET", "a".repeat(72));
    let response = server.register(TEST_USERNAME_ALICE, &too_long).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let at_limit = "a".repeat(72);
    let response = server.register(TEST_USERNAME_ALICE, &at_limit).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    // A longer password sharing the first 72 bytes must not log in
    let response = server
        .login(TEST_USERNAME_ALICE, &format!("{at_limit}WRONG"))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_register_invalid_username_returns_bad_request() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    for username in ["ab", "has space", "semi;colon"] {
        let response = server.register(username, TEST_PASSWORD).await?;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "Username {:?} should be rejected",
            username
        );
    }

    Ok(())
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_valid_credentials_returns_bearer_token() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    server.create_user(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;

    let response = server.login(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["token_type"].as_str(), Some("Bearer"));
    assert_eq!(body["expires_in"].as_u64(), Some(3600));
    let token = body["access_token"].as_str().unwrap_or_default();
    assert_eq!(token.split('.').count(), 3, "Token should be a JWT");

    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password_returns_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    server.create_user(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;

    let response = server.login(TEST_USERNAME_ALICE, "wrong-password").await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(
        body["error"]["code"].as_str(),
        Some("USER_CREDENTIALS_NOT_VALID")
    );

    Ok(())
}

#[tokio::test]
async fn test_login_unknown_user_is_indistinguishable_from_wrong_password(
) -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    server.create_user(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;

    let wrong_password = server.login(TEST_USERNAME_ALICE, "wrong-password").await?;
    let unknown_user = server.login("nobody", TEST_PASSWORD).await?;

    assert_eq!(wrong_password.status(), unknown_user.status());
    let wrong_password: serde_json::Value = wrong_password.json().await?;
    let unknown_user: serde_json::Value = unknown_user.json().await?;
    assert_eq!(wrong_password, unknown_user);

    Ok(())
}

// ============================================================================
// Current user
// ============================================================================

#[tokio::test]
async fn test_get_me_with_bearer_returns_profile() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/users/me", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["username"].as_str(), Some(TEST_USERNAME_ALICE));
    assert!(body.get("password").is_none());

    Ok(())
}

#[tokio::test]
async fn test_get_me_without_credentials_returns_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/users/me", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("INVALID_TOKEN"));

    Ok(())
}

#[tokio::test]
async fn test_update_me_changes_username_and_password() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    let response = server
        .client()
        .patch(format!("{}/api/v1/users/me", server.url()))
        .bearer_auth(&token)
        .json(&json!({ "username": "alice2", "password": "a-brand-new-secret" }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["username"].as_str(), Some("alice2"));

    // Old credentials no longer work, new ones do
    let old = server.login(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = server.login("alice2", "a-brand-new-secret").await?;
    assert_eq!(new.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_update_me_to_taken_username_returns_conflict() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    server.create_user(TEST_USERNAME_BOB, TEST_PASSWORD).await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    let response = server
        .client()
        .patch(format!("{}/api/v1/users/me", server.url()))
        .bearer_auth(&token)
        .json(&json!({ "username": TEST_USERNAME_BOB }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);

    Ok(())
}
