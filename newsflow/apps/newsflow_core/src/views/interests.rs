use axum::{body::Bytes, extract::State, http::StatusCode, Extension, Json};

use crate::serializers::interests::InterestsReq;
use crate::storage::{Categories, Interest, StoreError};
use crate::views::respond::{internal, not_found, parse_json, ApiResult};
use crate::views::user_auth::CurrentUser;
use crate::AppState;

pub async fn get_interests(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Interest>> {
    state
        .store
        .get_interests(user.id)
        .await
        .map_err(internal("Failed to fetch interests"))?
        .map(Json)
        .ok_or_else(|| not_found("Interests not found"))
}

/// Create-or-replace; POST and PUT behave the same. 201 when the row is new.
/// The insert goes first so two first-time writers cannot both create.
pub async fn put_interests(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Interest>)> {
    let req: InterestsReq = parse_json(&body, "Categories must be an array")?;
    let categories = Categories::new(
        req.categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
    );

    let store = &state.store;
    match store.create_interests(user.id, categories.clone()).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(StoreError::Conflict(_)) => store
            .update_interests(user.id, categories)
            .await
            .map_err(internal("Failed to save interests"))?
            .map(|updated| (StatusCode::OK, Json(updated)))
            .ok_or_else(|| not_found("Interests not found")),
        Err(e) => Err(internal("Failed to save interests")(e)),
    }
}
