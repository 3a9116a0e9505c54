// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::schema::{parse, RegistrationPayload};
use crate::services::registration;

/**
 * POST /auth/register - Register a free, member or participant account
 *
 * Expected Input:
 * ```json
 * {
 *   "plan_type": "member",          // Required: free | member | participant
 *   "email": "ada@example.org",     // Required
 *   "password": "correct horse",    // Required: at least 8 characters
 *   "name": "Ada",                  // Required
 *   "plan_id": "planId-2",          // Optional
 *   "invoice_company_name": "...",  // member/participant: invoice_* fields
 *   "short_description": "...",     // participant only, plus slug, year,
 *   "no_address": true              //   display_number and a location
 * }
 * ```
 *
 * Expected Output:
 * ```json
 * { "success": true, "user": { "id": "uuid" } }
 * ```
 *
 * Failures never escape as bare errors: they come back as
 * `{ "success": false, "error": "...", "details"?: {...} }` with the matching
 * status code, and nothing is written when validation fails.
 */
pub async fn register(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Response {
    match run(&state, body).await {
        Ok(user) => (StatusCode::CREATED, Json(json!({ "success": true, "user": user }))).into_response(),
        Err(err) => failure(err),
    }
}

async fn run(
    state: &AppState,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<registration::RegisteredUser, ApiError> {
    let Json(value) = body.map_err(|rejection| {
        ApiError::validation(
            "Invalid JSON body",
            json!({ "field": "body", "message": rejection.body_text() }),
        )
    })?;
    let payload: RegistrationPayload = parse(value)?;
    registration::register(state, payload).await
}

fn failure(err: ApiError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = err.to_json();
    if let Some(obj) = body.as_object_mut() {
        obj.insert("success".to_string(), Value::Bool(false));
    }
    (status, Json(body)).into_response()
}
