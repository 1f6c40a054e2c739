use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use crate::serializers::admin::{text_of, AdminLogReq, AdminStatusReq};
use crate::serializers::user_auth::{MessageOut, UserPublic};
use crate::storage::{AdminAction, AdminLog, NewAdminLog, SavedArticle};
use crate::views::respond::{bad, internal, not_found, parse_json, ApiResult, JsonBody};
use crate::views::user_auth::CurrentUser;
use crate::AppState;

fn user_id_param(raw: &str) -> ApiResult<i64> {
    raw.trim().parse().map_err(|_| bad("Invalid user id"))
}

pub async fn users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserPublic>>> {
    let users = state
        .store
        .get_all_users()
        .await
        .map_err(internal("Failed to fetch users"))?;
    Ok(Json(users.iter().map(UserPublic::from).collect()))
}

pub async fn saved_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<SavedArticle>>> {
    let articles = state
        .store
        .get_all_saved_articles()
        .await
        .map_err(internal("Failed to fetch saved articles"))?;
    Ok(Json(articles))
}

/// Grant or revoke the admin flag. The self-check runs before the body is
/// looked at, so a self-targeted request is a 400 whatever it carries.
pub async fn set_admin_status(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<UserPublic>> {
    let target_id = user_id_param(&raw_id)?;
    if target_id == admin.id {
        return Err(bad("Cannot change your own admin status"));
    }
    let req: AdminStatusReq = parse_json(&body, "isAdmin must be a boolean")?;

    let store = &state.store;
    let target = store
        .get_user(target_id)
        .await
        .map_err(internal("Failed to update admin status"))?
        .ok_or_else(|| not_found("User not found"))?;

    let (action, details) = if req.is_admin {
        (AdminAction::GrantAdmin, format!("Granted admin privileges to {}", target.username))
    } else {
        (AdminAction::RevokeAdmin, format!("Revoked admin privileges from {}", target.username))
    };
    let audit = NewAdminLog::on_user(admin.id, action, target_id, details);
    let updated = store
        .set_user_admin_status(target_id, req.is_admin, Some(audit))
        .await
        .map_err(internal("Failed to update admin status"))?
        .ok_or_else(|| not_found("User not found"))?;
    info!(admin_id = admin.id, target_id, action = action.as_str(), "admin status changed");

    Ok(Json(UserPublic::from(&updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageOut>> {
    let target_id = user_id_param(&raw_id)?;
    if target_id == admin.id {
        return Err(bad("Cannot delete your own account"));
    }

    let store = &state.store;
    let target = store
        .get_user(target_id)
        .await
        .map_err(internal("Failed to delete user"))?
        .ok_or_else(|| not_found("User not found"))?;

    let details = format!("Deleted user account: {} ({})", target.username, target.email);
    let audit = NewAdminLog::on_user(admin.id, AdminAction::DeleteUser, target_id, details);
    if !store
        .delete_user(target_id, Some(audit))
        .await
        .map_err(internal("Failed to delete user"))?
    {
        return Err(not_found("User not found"));
    }
    info!(admin_id = admin.id, target_id, "user deleted");

    Ok(Json(MessageOut::new("User deleted successfully")))
}

pub async fn logs(State(state): State<AppState>) -> ApiResult<Json<Vec<AdminLog>>> {
    let logs = state
        .store
        .get_admin_logs()
        .await
        .map_err(internal("Failed to fetch admin logs"))?;
    Ok(Json(logs))
}

pub async fn create_log(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    JsonBody(req): JsonBody<AdminLogReq>,
) -> ApiResult<(StatusCode, Json<AdminLog>)> {
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(action), Some(target_type), Some(target_id)) = (
        non_blank(req.action),
        non_blank(req.target_type),
        text_of(req.target_id),
    ) else {
        return Err(bad("action, target_type, and target_id are required"));
    };

    let log = state
        .store
        .create_admin_log(NewAdminLog {
            admin_id: admin.id,
            action,
            target_type,
            target_id,
            details: text_of(req.details),
        })
        .await
        .map_err(internal("Failed to create admin log"))?;
    Ok((StatusCode::CREATED, Json(log)))
}
