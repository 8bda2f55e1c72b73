//! E2E tests for project CRUD and its access control.

use api_test_utils::*;
use reqwest::StatusCode;
use serde_json::json;

async fn create_project(
    server: &TestApiServer,
    token: &str,
    name: &str,
) -> Result<serde_json::Value, anyhow::Error> {
    let response = server
        .client()
        .post(format!("{}/api/v1/projects", server.url()))
        .bearer_auth(token)
        .json(&json!({ "name": name, "description": format!("{} description", name) }))
        .send()
        .await?;
    anyhow::ensure!(
        response.status() == StatusCode::CREATED,
        "create returned {}",
        response.status()
    );
    Ok(response.json().await?)
}

fn project_id(project: &serde_json::Value) -> Result<i64, anyhow::Error> {
    project["id"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("Project has no id: {}", project))
}

#[tokio::test]
async fn test_create_project_returns_created_project() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    let project = create_project(&server, &token, "apollo").await?;

    assert_eq!(project["name"].as_str(), Some("apollo"));
    assert_eq!(project["description"].as_str(), Some("apollo description"));
    assert_eq!(project["user_id"].as_i64(), Some(1));

    Ok(())
}

#[tokio::test]
async fn test_create_project_blank_name_returns_bad_request() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/projects", server.url()))
        .bearer_auth(&token)
        .json(&json!({ "name": "   " }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_project_crud_round_trip() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;
    let project = create_project(&server, &token, "apollo").await?;
    let url = format!("{}/api/v1/projects/{}", server.url(), project_id(&project)?);

    // Read
    let response = server.client().get(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: serde_json::Value = response.json().await?;
    assert_eq!(fetched["name"].as_str(), Some("apollo"));

    // Update only the name
    let response = server
        .client()
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "name": "artemis" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: serde_json::Value = response.json().await?;
    assert_eq!(updated["name"].as_str(), Some("artemis"));
    assert_eq!(updated["description"].as_str(), Some("apollo description"));

    // Delete
    let response = server
        .client()
        .delete(&url)
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone, and the ACL entry with it
    let response = server.client().get(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_list_projects_returns_only_accessible() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let alice = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;
    let bob = server
        .register_and_login(TEST_USERNAME_BOB, TEST_PASSWORD)
        .await?;

    create_project(&server, &alice, "apollo").await?;
    create_project(&server, &bob, "gemini").await?;
    create_project(&server, &alice, "mercury").await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/projects", server.url()))
        .bearer_auth(&alice)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let projects: Vec<serde_json::Value> = response.json().await?;
    let names: Vec<&str> = projects.iter().filter_map(|p| p["name"].as_str()).collect();
    assert_eq!(names, vec!["apollo", "mercury"]);

    Ok(())
}

#[tokio::test]
async fn test_other_user_cannot_touch_project() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let alice = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;
    let bob = server
        .register_and_login(TEST_USERNAME_BOB, TEST_PASSWORD)
        .await?;
    let project = create_project(&server, &alice, "apollo").await?;
    let url = format!("{}/api/v1/projects/{}", server.url(), project_id(&project)?);

    let get = server.client().get(&url).bearer_auth(&bob).send().await?;
    assert_eq!(get.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = get.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("ACCESS_DENIED"));

    let patch = server
        .client()
        .patch(&url)
        .bearer_auth(&bob)
        .json(&json!({ "name": "hijacked" }))
        .send()
        .await?;
    assert_eq!(patch.status(), StatusCode::FORBIDDEN);

    let delete = server.client().delete(&url).bearer_auth(&bob).send().await?;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);

    // Alice still sees the original
    let response = server.client().get(&url).bearer_auth(&alice).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["name"].as_str(), Some("apollo"));

    Ok(())
}

#[tokio::test]
async fn test_missing_project_returns_forbidden() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;

    // No ACL entry exists, so existence is not revealed
    let response = server
        .client()
        .get(format!("{}/api/v1/projects/999", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_projects_accessible_via_api_key() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;
    let token = server
        .register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD)
        .await?;
    let api_key = server.rotate_api_key(&token).await?;
    create_project(&server, &token, "apollo").await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/projects", server.url()))
        .header("X-API-Key", &api_key)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let projects: Vec<serde_json::Value> = response.json().await?;
    assert_eq!(projects.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_projects_require_authentication() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/projects", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
