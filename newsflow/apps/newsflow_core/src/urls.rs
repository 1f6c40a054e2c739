use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};

use crate::views::user_auth::{require_admin, require_session};
use crate::views::{admin, api_keys, health, interests, news, saved_articles, user_auth};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/categories", get(health::categories))
        .route("/api/auth/signup", post(user_auth::signup))
        .route("/api/auth/login", post(user_auth::login));

    let signed_in = Router::new()
        .route("/api/auth/logout", post(user_auth::logout))
        .route("/api/user", get(user_auth::me).patch(user_auth::update_me))
        .route(
            "/api/interests",
            get(interests::get_interests)
                .post(interests::put_interests)
                .put(interests::put_interests),
        )
        .route("/api/gemini-key", get(api_keys::get_key).post(api_keys::put_key))
        .route("/api/gemini-key/validate", post(api_keys::validate))
        .route("/api/news", get(news::news))
        .route("/api/news/personalized", get(news::personalized))
        .route("/api/news/summarize", post(news::summarize))
        .route(
            "/api/saved-articles",
            get(saved_articles::list).post(saved_articles::save),
        )
        .route("/api/saved-articles/{*article_id}", delete(saved_articles::remove))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    // require_session is added last so it runs first
    let admin_only = Router::new()
        .route("/api/admin/users", get(admin::users))
        .route("/api/admin/saved-articles", get(admin::saved_articles))
        .route("/api/admin/users/{id}/admin-status", put(admin::set_admin_status))
        .route("/api/admin/users/{id}", delete(admin::delete_user))
        .route("/api/admin/logs", get(admin::logs).post(admin::create_log))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    public.merge(signed_in).merge(admin_only).with_state(state)
}
