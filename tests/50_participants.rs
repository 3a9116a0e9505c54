mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn display_number_check_ignores_own_record() -> Result<()> {
    let server = common::spawn().await?;
    let (id, email) = server.register("participant", "Numbered").await?;
    let token = server.login(&email, "longenough").await?;

    let res = server
        .put(&format!("/users/participants/{}/details", id))
        .bearer_auth(&token)
        .json(&json!({ "short_description": "Ceramics", "display_number": "12" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let check = |body: Value| server.post("/check-display-number").json(&body).send();

    let taken: Value = check(json!({ "displayNumber": "12", "entityType": "hub" })).await?.json().await?;
    assert_eq!(taken["isAvailable"], false);

    let own: Value = check(json!({ "displayNumber": "12", "entityType": "participant", "entityId": id }))
        .await?
        .json()
        .await?;
    assert_eq!(own["isAvailable"], true);

    let free: Value = check(json!({ "displayNumber": "13", "entityType": "participant" })).await?.json().await?;
    assert_eq!(free["isAvailable"], true);

    let res = check(json!({ "displayNumber": "1-2", "entityType": "participant" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn participants_cannot_moderate_themselves() -> Result<()> {
    let server = common::spawn().await?;
    let (id, email) = server.register("participant", "Eager").await?;
    let token = server.login(&email, "longenough").await?;
    let path = format!("/users/participants/{}/details", id);

    let details: Value = server
        .put(&path)
        .bearer_auth(&token)
        .json(&json!({ "short_description": "Prints", "status": "accepted", "is_sticky": true }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(details["status"], "pending");
    assert_eq!(details["is_sticky"], false);

    let details: Value = server
        .put(&path)
        .bearer_auth(&server.admin_token)
        .json(&json!({ "short_description": "Prints", "status": "accepted", "is_sticky": true }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(details["status"], "accepted");
    assert_eq!(details["is_sticky"], true);
    Ok(())
}

#[tokio::test]
async fn accepted_participants_have_public_profiles() -> Result<()> {
    let server = common::spawn().await?;
    let (id, email) = server.register("participant", "Open Studio").await?;
    let token = server.login(&email, "longenough").await?;

    let res = server.get("/participants/open-studio").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .put(&format!("/users/participants/{}/hours", id))
        .bearer_auth(&token)
        .json(&json!({ "hours": [{ "day": "Saturday", "opens_at": "10:00", "closes_at": "17:00" }] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    server
        .put(&format!("/users/participants/{}/details", id))
        .bearer_auth(&server.admin_token)
        .json(&json!({ "short_description": "Open doors", "status": "accepted" }))
        .send()
        .await?;

    let profile: Value = server.get("/participants/open-studio").send().await?.json().await?;
    assert_eq!(profile["name"], "Open Studio");
    assert_eq!(profile["hours"][0]["day"], "saturday");
    Ok(())
}

#[tokio::test]
async fn curated_section_groups_by_year() -> Result<()> {
    let server = common::spawn().await?;

    for (name, year) in [("Older", 2023), ("Newer", 2024)] {
        let (id, _) = server.register("participant", name).await?;
        let res = server
            .put(&format!("/users/participants/{}/details", id))
            .bearer_auth(&server.admin_token)
            .json(&json!({
                "short_description": "Work",
                "year": year,
                "status": "accepted",
                "is_sticky": true
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }
    // Sticky but never accepted: left out
    let (pending, _) = server.register("participant", "Pending").await?;
    server
        .put(&format!("/users/participants/{}/details", pending))
        .bearer_auth(&server.admin_token)
        .json(&json!({ "short_description": "Work", "is_sticky": true }))
        .send()
        .await?;

    let section: Value = server.get("/about/curated").send().await?.json().await?;
    let groups = section["entries"].as_array().cloned().unwrap_or_default();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["year"], 2024);
    assert_eq!(groups[0]["entries"][0]["name"], "Newer");
    assert_eq!(groups[1]["year"], 2023);
    Ok(())
}
