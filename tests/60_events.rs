mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn event(title: &str) -> Value {
    json!({
        "title": title,
        "day": "saturday",
        "event_type": "workshop",
        "start_time": "14:00",
        "end_time": "16:00"
    })
}

#[tokio::test]
async fn rsvp_requires_message_and_link() -> Result<()> {
    let server = common::spawn().await?;
    let (_, email) = server.register("participant", "Host").await?;
    let token = server.login(&email, "longenough").await?;

    let mut body = event("Glaze night");
    body["rsvp"] = json!(true);
    let res = server.post("/events").bearer_auth(&token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    body["rsvp_message"] = json!("Places are limited");
    body["rsvp_link"] = json!("https://example.org/rsvp");
    let res = server.post("/events").bearer_auth(&token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let created: Value = res.json().await?;
    assert_eq!(created["rsvp"], true);
    assert_eq!(created["rsvp_link"], "https://example.org/rsvp");
    Ok(())
}

#[tokio::test]
async fn rsvp_fields_are_dropped_without_rsvp() -> Result<()> {
    let server = common::spawn().await?;
    let (_, email) = server.register("participant", "Host").await?;
    let token = server.login(&email, "longenough").await?;

    let mut body = event("Open doors");
    body["rsvp_message"] = json!("ignored");
    let created: Value = server.post("/events").bearer_auth(&token).json(&body).send().await?.json().await?;
    assert_eq!(created["rsvp"], false);
    assert!(created["rsvp_message"].is_null());
    Ok(())
}

#[tokio::test]
async fn organizers_and_co_organizers_edit_events() -> Result<()> {
    let server = common::spawn().await?;
    let (host, host_email) = server.register("participant", "Host").await?;
    let (helper, helper_email) = server.register("participant", "Helper").await?;
    let (_, other_email) = server.register("participant", "Other").await?;
    let host_token = server.login(&host_email, "longenough").await?;
    let helper_token = server.login(&helper_email, "longenough").await?;
    let other_token = server.login(&other_email, "longenough").await?;

    let mut body = event("Kiln opening");
    body["co_organizers"] = json!([helper]);
    let created: Value = server.post("/events").bearer_auth(&host_token).json(&body).send().await?.json().await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();
    let path = format!("/events/{}", id);

    let listed: Value = server.get(&format!("/events?organizer={}", host)).send().await?.json().await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    body["title"] = json!("Kiln opening (moved)");
    let res = server.put(&path).bearer_auth(&helper_token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.put(&path).bearer_auth(&other_token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Co-organizers may edit but not delete
    let res = server.delete(&path).bearer_auth(&helper_token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.delete(&path).bearer_auth(&host_token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.get(&path).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn bad_event_id_is_a_bad_request() -> Result<()> {
    let server = common::spawn().await?;

    let res = server.get("/events/not-a-uuid").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["error"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn event_images_come_from_the_organizer_folder() -> Result<()> {
    let server = common::spawn().await?;
    let (visitor, email) = server.register("free", "Visitor").await?;
    let token = server.login(&email, "longenough").await?;

    let res = server
        .put("/storage/press/a.png")
        .bearer_auth(&server.admin_token)
        .body("press image")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let mut body = event("Borrowed poster");
    body["image_path"] = json!("press/a.png");
    let res = server.post("/events").bearer_auth(&token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let poster = format!("users/{}/poster.png", visitor);
    let res = server
        .put(&format!("/storage/{}", poster))
        .bearer_auth(&server.admin_token)
        .body("poster")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    body["image_path"] = json!(poster);
    let created: Value = server.post("/events").bearer_auth(&token).json(&body).send().await?.json().await?;
    let path = format!("/events/{}", created["id"].as_str().unwrap_or_default());
    let res = server.delete(&path).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.get(&format!("/storage/{}", poster)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = server.get("/storage/press/a.png").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
