mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// Owner-scoped CRUD over a live server. Each test uses its own account, so
// the shared database never leaks records between tests.

async fn create_person(
    server: &common::TestServer,
    client: &reqwest::Client,
    token: &str,
    name: &str,
    roll: &str,
    age: u32,
    gender: &str,
) -> Result<serde_json::Value> {
    let res = client
        .post(format!("{}/persons", server.base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "roll": roll, "age": age, "gender": gender }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "create failed: {}",
        res.status()
    );
    let payload = res.json::<serde_json::Value>().await?;
    Ok(payload["data"].clone())
}

#[tokio::test]
async fn sequence_numbers_survive_deletion() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::signup_and_login(server, &client, "crud_alice", "pw").await?;

    let bob = create_person(server, &client, &token, "Bob", "101", 20, "M").await?;
    let carol = create_person(server, &client, &token, "Carol", "102", 22, "F").await?;
    assert_eq!(bob["seq"], 1);
    assert_eq!(carol["seq"], 2);

    // Get by sequence number
    let res = client
        .get(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["data"]["name"], "Bob");

    // Delete returns the record's last state
    let res = client
        .delete(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["data"]["name"], "Bob");

    // The freed number is not reissued; allocation continues past the max
    let dave = create_person(server, &client, &token, "Dave", "103", 19, "M").await?;
    assert_eq!(dave["seq"], 3);

    // Carol kept her number
    let res = client
        .get(format!("{}/persons/2", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn owners_are_isolated() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token_a = common::signup_and_login(server, &client, "iso_a", "pw").await?;
    let token_b = common::signup_and_login(server, &client, "iso_b", "pw").await?;

    create_person(server, &client, &token_a, "OnlyA", "1", 30, "F").await?;
    let b_first = create_person(server, &client, &token_b, "OnlyB", "1", 31, "M").await?;

    // each owner's numbering starts at 1
    assert_eq!(b_first["seq"], 1);

    let res = client
        .get(format!("{}/persons", server.base_url))
        .bearer_auth(&token_b)
        .send()
        .await?;
    let payload = res.json::<serde_json::Value>().await?;
    let items = payload["data"]["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "OnlyB");

    // owner B cannot address owner A's record
    let res = client
        .put(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token_b)
        .json(&json!({ "name": "Stolen", "roll": "0", "age": 1, "gender": "x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let payload = res.json::<serde_json::Value>().await?;
    // ...only their own record with that number
    assert_eq!(payload["data"]["name"], "Stolen");

    let res = client
        .get(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token_a)
        .send()
        .await?;
    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["data"]["name"], "OnlyA");

    Ok(())
}

#[tokio::test]
async fn list_supports_search_and_pagination() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::signup_and_login(server, &client, "list_owner", "pw").await?;

    for (name, roll) in [
        ("Alice Johnson", "1"),
        ("Bob Smith", "2"),
        ("Carla Johnston", "3"),
    ] {
        create_person(server, &client, &token, name, roll, 20, "x").await?;
    }

    // case-insensitive substring search
    let res = client
        .get(format!("{}/persons?search=JOHNS", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let payload = res.json::<serde_json::Value>().await?;
    let items = payload["data"]["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 2);

    // pagination slices the sequence-ordered listing
    let res = client
        .get(format!("{}/persons?skip=1&limit=1", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let payload = res.json::<serde_json::Value>().await?;
    let items = payload["data"]["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["seq"], 2);

    // invalid limit is rejected
    let res = client
        .get(format!("{}/persons?limit=0", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn partial_update_enforces_allow_list() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::signup_and_login(server, &client, "patch_owner", "pw").await?;

    create_person(server, &client, &token, "Bob", "101", 20, "M").await?;

    // empty payload
    let res = client
        .patch(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // protected identity field
    let res = client
        .patch(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "owner_id": 5 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // only unrecognized fields
    let res = client
        .patch(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "nickname": "Bobby" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // a recognized subset applies; unknown fields are skipped
    let res = client
        .patch(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "age": 21, "nickname": "Bobby" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["data"]["age"], 21);
    assert_eq!(payload["data"]["name"], "Bob");

    Ok(())
}

#[tokio::test]
async fn replace_requires_full_field_set() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::signup_and_login(server, &client, "put_owner", "pw").await?;

    let before = create_person(server, &client, &token, "Bob", "101", 20, "M").await?;

    let res = client
        .put(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Robert", "roll": "201", "age": 21, "gender": "M" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["data"]["name"], "Robert");
    assert_eq!(payload["data"]["seq"], 1);
    assert_eq!(payload["data"]["id"], before["id"]);

    // a partial body is not a valid replace
    let res = client
        .put(format!("{}/persons/1", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "OnlyName" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn missing_records_are_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::signup_and_login(server, &client, "missing_owner", "pw").await?;

    let res = client
        .get(format!("{}/persons/42", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["code"], "NOT_FOUND");

    Ok(())
}
