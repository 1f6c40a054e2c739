use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use crate::serializers::saved_articles::SaveArticleReq;
use crate::serializers::user_auth::MessageOut;
use crate::storage::{SavedArticle, StoreError};
use crate::views::respond::{bad, internal, not_found, ApiResult, JsonBody};
use crate::views::user_auth::CurrentUser;
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<SavedArticle>>> {
    let articles = state
        .store
        .get_saved_articles(user.id)
        .await
        .map_err(internal("Failed to fetch saved articles"))?;
    Ok(Json(articles))
}

pub async fn save(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    JsonBody(req): JsonBody<SaveArticleReq>,
) -> ApiResult<(StatusCode, Json<SavedArticle>)> {
    let missing = req.missing_fields();
    if !missing.is_empty() {
        return Err(bad(&format!("{} required", missing.join(", "))));
    }

    let store = &state.store;
    if store
        .get_saved_article(user.id, &req.article_id)
        .await
        .map_err(internal("Failed to save article"))?
        .is_some()
    {
        return Err(bad("Article already saved"));
    }

    let saved = store
        .create_saved_article(req.into_new(user.id))
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => bad("Article already saved"),
            other => internal("Failed to save article")(other),
        })?;
    info!(user_id = user.id, article_id = %saved.article_id, "article saved");
    Ok((StatusCode::CREATED, Json(saved)))
}

/// `article_id` is a wildcard segment; ids are often URLs.
pub async fn remove(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(article_id): Path<String>,
) -> ApiResult<Json<MessageOut>> {
    let removed = state
        .store
        .delete_saved_article(user.id, &article_id)
        .await
        .map_err(internal("Failed to remove article"))?;
    if !removed {
        return Err(not_found("Article not found"));
    }
    Ok(Json(MessageOut::new("Article removed from saved")))
}
