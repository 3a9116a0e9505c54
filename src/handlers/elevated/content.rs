// handlers/elevated/content.rs - site content handlers
//
// PUT /about/:section   replace a section header and item list
// PUT /storage/*path    upload a file (raw request body)

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::schema::{SectionPayload, ValidJson};
use crate::services::content::{self, SectionView};

/**
 * PUT /about/:section - Replace a section
 *
 * The body is the complete desired state. Items resent with their `id` are
 * kept; items without one are created; items left out are deleted along
 * with their stored images.
 *
 * Expected Input (press):
 * ```json
 * {
 *   "header": { "title": "Press" },
 *   "items": [
 *     { "id": "uuid", "data": { "title": "Feature", "url": "https://..." }, "image_path": "press/a.png" },
 *     { "data": { "title": "Interview", "url": "https://..." } }
 *   ]
 * }
 * ```
 */
pub async fn section_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(section): Path<String>,
    ValidJson(payload): ValidJson<SectionPayload>,
) -> ApiResult<SectionView> {
    Ok(ApiResponse::success(
        content::put_section(&state, Some(&caller), &section, payload).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct StoredFile {
    pub path: String,
    pub size: usize,
}

pub async fn storage_put(State(state): State<AppState>, Path(path): Path<String>, body: Bytes) -> ApiResult<StoredFile> {
    if body.is_empty() {
        return Err(ApiError::bad_request("Empty upload"));
    }
    state.storage.put(&path, &body).await?;
    Ok(ApiResponse::created(StoredFile { path, size: body.len() }))
}
