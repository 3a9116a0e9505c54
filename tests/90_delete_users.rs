mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn partial_batch_reports_multi_status() -> Result<()> {
    let server = common::spawn().await?;
    let (member, member_email) = server.register("member", "Leaving").await?;
    let (participant, _) = server.register("participant", "Also Leaving").await?;
    let missing = Uuid::new_v4();

    let res = server
        .post("/deleteUsers")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "userIds": [member, missing, participant] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::MULTI_STATUS);

    let body: Value = res.json().await?;
    let results = body["results"].as_array().cloned().unwrap_or_default();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["userId"], json!(member));
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["error"], "User not found");
    assert_eq!(results[2]["success"], true);

    // Deleted accounts can no longer log in
    let res = server
        .post("/auth/login")
        .json(&json!({ "email": member_email, "password": "longenough" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn full_success_and_full_failure_statuses() -> Result<()> {
    let server = common::spawn().await?;
    let (user, _) = server.register("free", "Gone").await?;

    let res = server
        .post("/deleteUsers")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "userIds": [user] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .post("/deleteUsers")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "userIds": [user] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["results"][0]["success"], false);
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_rejected() -> Result<()> {
    let server = common::spawn().await?;

    let res = server
        .post("/deleteUsers")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "userIds": [] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn deleting_a_hub_host_fails_for_that_user_only() -> Result<()> {
    let server = common::spawn().await?;
    let (host, _) = server.register("participant", "Host").await?;
    let (bystander, _) = server.register("member", "Bystander").await?;

    let res = server
        .post("/hubs")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "name": "Hub", "hub_host": host }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .post("/deleteUsers")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "userIds": [host, bystander] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::MULTI_STATUS);
    let body: Value = res.json().await?;
    assert_eq!(body["results"][0]["success"], false);
    assert_eq!(body["results"][1]["success"], true);
    Ok(())
}

#[tokio::test]
async fn deleted_co_organizer_leaves_events_editable() -> Result<()> {
    let server = common::spawn().await?;
    let (_, host_email) = server.register("participant", "Host").await?;
    let (helper, _) = server.register("participant", "Helper").await?;
    let host_token = server.login(&host_email, "longenough").await?;

    let mut body = json!({
        "title": "Kiln opening",
        "day": "saturday",
        "event_type": "workshop",
        "co_organizers": [helper]
    });
    let created: Value = server.post("/events").bearer_auth(&host_token).json(&body).send().await?.json().await?;
    let path = format!("/events/{}", created["id"].as_str().unwrap_or_default());

    let res = server
        .post("/deleteUsers")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "userIds": [helper] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let stored: Value = server.get(&path).send().await?.json().await?;
    assert_eq!(stored["co_organizers"], json!([]));

    // Resending the stored list is a plain edit
    body["co_organizers"] = stored["co_organizers"].clone();
    body["title"] = json!("Kiln opening (moved)");
    let res = server.put(&path).bearer_auth(&host_token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
