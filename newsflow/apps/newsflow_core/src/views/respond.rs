use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::serializers::user_auth::ApiError;

pub type Failure = (StatusCode, Json<ApiError>);
pub type ApiResult<T> = Result<T, Failure>;

pub fn bad(msg: &str) -> Failure {
    (StatusCode::BAD_REQUEST, Json(ApiError { message: msg.into() }))
}
pub fn unauth(msg: &str) -> Failure {
    (StatusCode::UNAUTHORIZED, Json(ApiError { message: msg.into() }))
}
pub fn forbidden(msg: &str) -> Failure {
    (StatusCode::FORBIDDEN, Json(ApiError { message: msg.into() }))
}
pub fn not_found(msg: &str) -> Failure {
    (StatusCode::NOT_FOUND, Json(ApiError { message: msg.into() }))
}

/// 500 with a fixed message; the cause only goes to the log.
pub fn internal<E: std::fmt::Display>(msg: &'static str) -> impl FnOnce(E) -> Failure {
    move |e| {
        error!(error = %e, "{msg}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError { message: msg.into() }),
        )
    }
}

/// `Json<T>` whose rejections come back as `{message}` 400s.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad(&rejection.body_text())),
        }
    }
}

/// Parse a raw body, answering any failure with one fixed 400 message.
pub fn parse_json<T: DeserializeOwned>(body: &[u8], msg: &str) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|_| bad(msg))
}
