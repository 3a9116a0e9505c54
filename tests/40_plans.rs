mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn plans_get_sequential_ids() -> Result<()> {
    let server = common::spawn().await?;

    let mut ids = Vec::new();
    for label in ["Member", "Participant"] {
        let res = server
            .post("/plans")
            .bearer_auth(&server.admin_token)
            .json(&json!({ "label": label, "price": "25.00", "currency": "EUR", "features": ["Newsletter"] }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
        let plan: Value = res.json().await?;
        ids.push(plan["plan_id"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(ids, vec!["planId-1", "planId-2"]);

    let plans: Value = server.get("/plans").send().await?.json().await?;
    assert_eq!(plans.as_array().map(Vec::len), Some(2));
    assert_eq!(plans[0]["plan_id"], "planId-1");
    Ok(())
}

#[tokio::test]
async fn plan_update_and_delete_need_query_parameter() -> Result<()> {
    let server = common::spawn().await?;
    let body = json!({ "label": "Member", "price": "10", "currency": "EUR" });

    let res = server.post("/plans").bearer_auth(&server.admin_token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server.put("/plans").bearer_auth(&server.admin_token).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let updated = json!({ "label": "Supporter", "price": "15", "currency": "EUR" });
    let res = server
        .put("/plans?plan=planId-1")
        .bearer_auth(&server.admin_token)
        .json(&updated)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let plan: Value = res.json().await?;
    assert_eq!(plan["label"], "Supporter");

    let res = server
        .delete("/plans?plan=planId-1")
        .bearer_auth(&server.admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server
        .delete("/plans?plan=planId-1")
        .bearer_auth(&server.admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn negative_price_is_rejected() -> Result<()> {
    let server = common::spawn().await?;

    let res = server
        .post("/plans")
        .bearer_auth(&server.admin_token)
        .json(&json!({ "label": "Broken", "price": "-1", "currency": "EUR" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
