//! E2E tests for API-key issuance and API-key authentication.

use api_test_utils::*;
use reqwest::StatusCode;

async fn get_me_with_key(
    server: &TestApiServer,
    api_key: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    let response = server
        .client()
        .get(format!("{}/api/v1/users/me", server.url()))
        .header("X-API-Key", api_key)
        .send()
        .await?;
    Ok(response)
}

#[tokio::test]
async fn test_rotate_api_key_returns_composite_key() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    let api_key = server.rotate_api_key(&token).await?;

    let (user_id, key) = api_key
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Key is not composite: {}", api_key))?;
    assert_eq!(user_id, "1");
    assert!(!key.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_api_key_authenticates_requests() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;
    let api_key = server.rotate_api_key(&token).await?;

    let response = get_me_with_key(&server, &api_key).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["username"].as_str(), Some(TEST_USERNAME_ALICE));

    Ok(())
}

#[tokio::test]
async fn test_rotation_invalidates_previous_key() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    let first = server.rotate_api_key(&token).await?;
    let second = server.rotate_api_key(&token).await?;
    assert_ne!(first, second);

    let old = get_me_with_key(&server, &first).await?;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let current = get_me_with_key(&server, &second).await?;
    assert_eq!(current.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_api_key_of_other_user_id_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    server.create_user(TEST_USERNAME_BOB, TEST_PASSWORD).await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;
    let api_key = server.rotate_api_key(&token).await?;

    // Alice's key presented under Bob's id (1)
    let (_, key) = api_key
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Key is not composite"))?;
    let response = get_me_with_key(&server, &format!("1:{}", key)).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("USER_API_TOKEN_NOT_VALID"));

    Ok(())
}

#[tokio::test]
async fn test_api_key_for_user_without_key_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    server.create_user(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;

    let response = get_me_with_key(&server, "1:made-up-key").await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_unknown_user_and_malformed_key_look_the_same() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let unknown = get_me_with_key(&server, "999:whatever").await?;
    let malformed = get_me_with_key(&server, "not-a-composite-key").await?;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);
    let unknown: serde_json::Value = unknown.json().await?;
    let malformed: serde_json::Value = malformed.json().await?;
    assert_eq!(unknown, malformed);

    Ok(())
}
