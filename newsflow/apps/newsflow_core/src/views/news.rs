use axum::{
    extract::{Query, State},
    Extension, Json,
};
use newsflow_ai::personalize::HEADLINES_PAGE_SIZE;
use newsflow_ai::{fetch_personalized, summarize_article, AiError, Article, ArticleBrief, Category};
use tracing::debug;

use crate::serializers::news::{NewsQuery, SummaryOut};
use crate::views::respond::{bad, internal, ApiResult, JsonBody};
use crate::views::user_auth::CurrentUser;
use crate::AppState;

const NO_INTERESTS: &str = "Please set your interests first";
const NO_KEY: &str = "Gemini API key not found. Please set it in your profile.";

/// Top headlines for one category: the `category` query parameter, else the
/// user's first interest, else `general`.
pub async fn news(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(q): Query<NewsQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let interest = state
        .store
        .get_interests(user.id)
        .await
        .map_err(internal("Failed to fetch news"))?
        .ok_or_else(|| bad(NO_INTERESTS))?;

    let category = q
        .category
        .filter(|c| !c.trim().is_empty())
        .or_else(|| interest.categories.first().map(str::to_string))
        .unwrap_or_else(|| Category::General.as_str().to_string());
    debug!(user_id = user.id, %category, "listing headlines");

    let articles = state
        .news
        .top_headlines(&category, HEADLINES_PAGE_SIZE)
        .await
        .map_err(internal("Failed to fetch news"))?;
    Ok(Json(articles))
}

pub async fn personalized(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Article>>> {
    let store = &state.store;
    let interest = store
        .get_interests(user.id)
        .await
        .map_err(internal("Failed to fetch personalized news"))?
        .ok_or_else(|| bad(NO_INTERESTS))?;
    let key = store
        .get_api_key(user.id)
        .await
        .map_err(internal("Failed to fetch personalized news"))?
        .and_then(|k| k.gemini_key);

    let feed = fetch_personalized(
        state.news.as_ref(),
        interest.categories.as_slice(),
        key.as_deref(),
    )
    .await
    .map_err(|e| bad(&e.to_string()))?;
    Ok(Json(feed))
}

/// Long-form write-up of one article, generated with the caller's own key.
pub async fn summarize(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    JsonBody(brief): JsonBody<ArticleBrief>,
) -> ApiResult<Json<SummaryOut>> {
    if brief.title.trim().is_empty() {
        return Err(bad("title is required"));
    }
    let key = state
        .store
        .get_api_key(user.id)
        .await
        .map_err(internal("Failed to generate article"))?
        .and_then(|k| k.gemini_key)
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| bad(NO_KEY))?;

    let content = summarize_article(
        state.generator.as_ref(),
        &key,
        &brief,
        state.gemini_cfg.generation_deadline(),
    )
    .await
    .map_err(|e| match e {
        AiError::Timeout => internal("Article generation timed out")(e),
        other => internal("Failed to generate article")(other),
    })?;
    Ok(Json(SummaryOut { content }))
}
