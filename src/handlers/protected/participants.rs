// handlers/protected/participants.rs - /users/participants/:user_id/* handlers
//
// GET|POST|PUT .../details   participant profile (POST creates, PUT replaces)
// GET|POST|PUT .../hours     opening hours, replaced wholesale
// GET|POST|PUT .../info      account name and plan
// GET|POST|PUT .../invoice   billing address
// GET|POST|PUT .../map-info  map location
//
// POST and PUT behave the same except on details, where POST creates the row.

use axum::{
    extract::{Path, State},
    Extension,
};

use crate::app::AppState;
use crate::database::models::{InvoiceData, MapInfo, OpeningHours, ParticipantDetails, UserInfo};
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::schema::{HoursPayload, InvoicePayload, MapInfoPayload, ParticipantDetailsPayload, UserInfoPayload, ValidJson};
use crate::services::participants;

pub async fn details_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<ParticipantDetails> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(participants::get_details(&state, &caller, user_id).await?))
}

/**
 * POST /users/participants/:user_id/details - Create participant details
 *
 * Expected Input:
 * ```json
 * {
 *   "slug": "studio-north",          // Optional: generated from the name when absent
 *   "short_description": "string",   // Required
 *   "long_description": "string",    // Optional
 *   "year": 2024,                    // Optional: defaults to the current year
 *   "display_number": "3B",          // Optional: unique across participants and hubs
 *   "image_path": "participants/x.png",
 *   "is_sticky": true,               // Staff only
 *   "status": "accepted"             // Staff only
 * }
 * ```
 */
pub async fn details_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<ParticipantDetailsPayload>,
) -> ApiResult<ParticipantDetails> {
    let user_id = parse_id(&user_id, "user")?;
    let details = participants::create_details(&state, &caller, user_id, payload).await?;
    Ok(ApiResponse::created(details))
}

pub async fn details_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<ParticipantDetailsPayload>,
) -> ApiResult<ParticipantDetails> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(
        participants::update_details(&state, &caller, user_id, payload).await?,
    ))
}

pub async fn hours_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<OpeningHours>> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(participants::get_hours(&state, &caller, user_id).await?))
}

pub async fn hours_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<HoursPayload>,
) -> ApiResult<Vec<OpeningHours>> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(
        participants::replace_hours(&state, &caller, user_id, payload).await?,
    ))
}

pub async fn info_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<UserInfo> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(participants::get_info(&state, &caller, user_id).await?))
}

pub async fn info_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<UserInfoPayload>,
) -> ApiResult<UserInfo> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(
        participants::update_info(&state, &caller, user_id, payload).await?,
    ))
}

pub async fn invoice_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<InvoiceData> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(participants::get_invoice(&state, &caller, user_id).await?))
}

pub async fn invoice_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<InvoicePayload>,
) -> ApiResult<InvoiceData> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(
        participants::upsert_invoice(&state, &caller, user_id, payload).await?,
    ))
}

pub async fn map_info_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<MapInfo> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(participants::get_map_info(&state, &caller, user_id).await?))
}

pub async fn map_info_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<MapInfoPayload>,
) -> ApiResult<MapInfo> {
    let user_id = parse_id(&user_id, "user")?;
    Ok(ApiResponse::success(
        participants::upsert_map_info(&state, &caller, user_id, payload).await?,
    ))
}
