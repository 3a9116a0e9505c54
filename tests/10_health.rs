mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn().await?;

    let res = server.get("/health").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_reports_service_name() -> Result<()> {
    let server = common::spawn().await?;

    let body: Value = server.get("/").send().await?.json().await?;
    assert!(body["name"].as_str().is_some());
    assert!(body["version"].as_str().is_some());
    Ok(())
}
