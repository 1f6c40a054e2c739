use axum::{extract::State, http::StatusCode, Extension, Json};
use newsflow_ai::validate_key;
use tracing::info;

use crate::serializers::api_key::{GeminiKeyReq, KeyValidationOut};
use crate::storage::{ApiKey, StoreError};
use crate::views::respond::{bad, internal, not_found, ApiResult, JsonBody};
use crate::views::user_auth::CurrentUser;
use crate::AppState;

pub async fn get_key(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiKey>> {
    state
        .store
        .get_api_key(user.id)
        .await
        .map_err(internal("Failed to fetch API key"))?
        .map(Json)
        .ok_or_else(|| not_found("API key not found"))
}

pub async fn put_key(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    JsonBody(req): JsonBody<GeminiKeyReq>,
) -> ApiResult<(StatusCode, Json<ApiKey>)> {
    let key = req
        .gemini_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| bad("gemini_key is required"))?;

    // insert first; a conflict means the row exists, possibly from a concurrent request
    let store = &state.store;
    match store.create_api_key(user.id, key.clone()).await {
        Ok(created) => {
            info!(user_id = user.id, "gemini key stored");
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(StoreError::Conflict(_)) => store
            .update_api_key(user.id, key)
            .await
            .map_err(internal("Failed to save API key"))?
            .map(|updated| (StatusCode::OK, Json(updated)))
            .ok_or_else(|| not_found("API key not found")),
        Err(e) => Err(internal("Failed to save API key")(e)),
    }
}

/// Check a candidate key against the generative API without storing it.
pub async fn validate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GeminiKeyReq>,
) -> Json<KeyValidationOut> {
    let cfg = &state.gemini_cfg;
    let verdict = validate_key(
        state.generator.as_ref(),
        req.gemini_key.as_deref().unwrap_or_default(),
        cfg.validation_policy,
        cfg.validation_deadline(),
    )
    .await;
    Json(KeyValidationOut { valid: verdict.is_usable(), verdict })
}
