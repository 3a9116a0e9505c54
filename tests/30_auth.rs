mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let server = common::spawn().await?;

    let res = server
        .post("/auth/login")
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": "not-the-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Invalid email or password");
    Ok(())
}

#[tokio::test]
async fn login_sets_session_cookie() -> Result<()> {
    let server = common::spawn().await?;

    let res = server
        .post("/auth/login")
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("glue_session="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = res.json().await?;
    assert_eq!(body["user"]["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn elevated_routes_check_session_then_role() -> Result<()> {
    let server = common::spawn().await?;
    let plan = json!({ "label": "Member", "price": "25.00", "currency": "EUR" });

    // No session
    let res = server.post("/plans").json(&plan).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Participant session
    let (_, email) = server.register("participant", "Someone").await?;
    let token = server.login(&email, "longenough").await?;
    let res = server.post("/plans").bearer_auth(&token).json(&plan).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Nothing was written
    let plans: Value = server.get("/plans").send().await?.json().await?;
    assert_eq!(plans.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn users_cannot_read_each_other() -> Result<()> {
    let server = common::spawn().await?;

    let (alice, alice_email) = server.register("member", "Alice").await?;
    let (bob, _) = server.register("member", "Bob").await?;
    let token = server.login(&alice_email, "longenough").await?;

    let res = server.get(&format!("/users/{}", alice)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.get(&format!("/users/{}", bob)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .get(&format!("/users/{}", bob))
        .bearer_auth(&server.admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
