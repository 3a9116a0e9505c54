#![allow(dead_code)]

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use glue_api::app::{self, AppState};
use glue_api::config::AppConfig;
use glue_api::database::models::UserRole;
use glue_api::services::registration;

pub const ADMIN_EMAIL: &str = "admin@glue.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// A router bound to an ephemeral port over a fresh memory store.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub state: AppState,
    pub admin_token: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Log in and return the session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .post("/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    /// Register through the public endpoint and return (id, email).
    pub async fn register(&self, plan_type: &str, name: &str) -> Result<(Uuid, String)> {
        let email = format!("{}@example.org", Uuid::new_v4().simple());
        let res = self
            .post("/auth/register")
            .json(&registration_body(plan_type, &email, name))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "registration failed: {}", res.status());
        let body: Value = res.json().await?;
        let id = body["user"]["id"].as_str().context("registration response has no id")?;
        Ok((id.parse()?, email))
    }
}

/// Sign-up body for the given plan type with every field that plan needs.
pub fn registration_body(plan_type: &str, email: &str, name: &str) -> Value {
    let mut body = json!({
        "plan_type": plan_type,
        "email": email,
        "password": "longenough",
        "name": name,
    });
    if plan_type != "free" {
        let extra = json!({
            "invoice_company_name": format!("{} Ltd", name),
            "invoice_address": "1 Canal St",
            "invoice_zip_code": "1011",
            "invoice_city": "Amsterdam",
            "invoice_country": "NL",
        });
        merge(&mut body, extra);
    }
    if plan_type == "participant" {
        merge(
            &mut body,
            json!({ "short_description": "Furniture and lighting", "no_address": true }),
        );
    }
    body
}

fn merge(target: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(extra)) = (target.as_object_mut(), extra) {
        target.extend(extra);
    }
}

pub async fn spawn() -> Result<TestServer> {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.cache.view_ttl_secs = 0;
    config.storage.root = std::env::temp_dir()
        .join(format!("glue-it-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = AppState::in_memory(config);
    registration::create_staff(&state, ADMIN_EMAIL, "Admin", ADMIN_PASSWORD, UserRole::Admin).await?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = app::router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let mut server = TestServer {
        base_url: format!("http://{}", addr),
        client: Client::new(),
        state,
        admin_token: String::new(),
    };
    server.admin_token = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    Ok(server)
}
