use axum::body::Body;
use axum::http::Request;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::info;
use uuid::Uuid;

use crate::serializers::user_auth::{
    Claims, LoginReq, MessageOut, ProfileUpdateReq, SignupReq, UserPublic,
};
use crate::storage::{NewSession, NewUser, StoreError, User, UserUpdate};
use crate::views::respond::{bad, forbidden, internal, unauth, ApiResult, JsonBody};
use crate::{AppState, PasswordCost};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm as ArgonAlgorithm, Argon2, Params, Version,
};

const MIN_PASSWORD_LEN: usize = 6;

/// The signed-in user, attached to the request by `require_session`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

// ---------- handlers ----------
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupReq>,
) -> ApiResult<(StatusCode, HeaderMap, Json<UserPublic>)> {
    let email = req.email.trim().to_string();
    let username = req.username.trim().to_string();
    if email.is_empty() || username.is_empty() || req.password.is_empty() {
        return Err(bad("email, username, and password are required"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(bad("Password must be at least 6 characters"));
    }

    let store = &state.store;
    if store
        .get_user_by_username(&username)
        .await
        .map_err(internal("Failed to create user"))?
        .is_some()
    {
        return Err(bad("Username already exists"));
    }
    if store
        .get_user_by_email(&email)
        .await
        .map_err(internal("Failed to create user"))?
        .is_some()
    {
        return Err(bad("Email already exists"));
    }
    if let Some(ref supabase_id) = req.supabase_id {
        if store
            .get_user_by_supabase_id(supabase_id)
            .await
            .map_err(internal("Failed to create user"))?
            .is_some()
        {
            return Err(bad("Account already linked"));
        }
    }

    let hash = hash_password(&req.password, state.session_cfg.password_cost)
        .map_err(internal("Failed to create user"))?;

    let created = store
        .create_user(NewUser {
            username,
            email,
            password_hash: hash,
            first_name: req.first_name.filter(|s| !s.trim().is_empty()),
            last_name: req.last_name.filter(|s| !s.trim().is_empty()),
            supabase_id: req.supabase_id,
            is_admin: false,
        })
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent signup
            StoreError::Conflict(_) => bad("Username or email already exists"),
            other => internal("Failed to create user")(other),
        })?;
    info!(user_id = created.id, "user signed up");

    let headers = open_session(&state, &created).await?;
    Ok((StatusCode::CREATED, headers, Json(UserPublic::from(&created))))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginReq>,
) -> ApiResult<(StatusCode, HeaderMap, Json<UserPublic>)> {
    let Some(found) = state
        .store
        .get_user_by_email(req.email.trim())
        .await
        .map_err(internal("Failed to log in"))?
    else {
        return Err(unauth("Invalid email or password"));
    };

    if !verify_password(&found.password_hash, &req.password).map_err(internal("Failed to log in"))? {
        return Err(unauth("Invalid email or password"));
    }

    let headers = open_session(&state, &found).await?;
    Ok((StatusCode::OK, headers, Json(UserPublic::from(&found))))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<(StatusCode, HeaderMap, Json<MessageOut>)> {
    state
        .store
        .revoke_session(claims.sid)
        .await
        .map_err(internal("Failed to log out"))?;

    let mut out = HeaderMap::new();
    out.insert(header::SET_COOKIE, cookie_header(clear_session_cookie(&state))?);
    Ok((StatusCode::OK, out, Json(MessageOut::new("Logged out successfully"))))
}

pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserPublic> {
    Json(UserPublic::from(&user))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    JsonBody(req): JsonBody<ProfileUpdateReq>,
) -> ApiResult<Json<UserPublic>> {
    let mut update = UserUpdate::default();

    if let Some(username) = req.username.map(|s| s.trim().to_string()) {
        if username.is_empty() {
            return Err(bad("Username cannot be empty"));
        }
        if username != user.username {
            update.username = Some(username);
        }
    }
    if let Some(email) = req.email.map(|s| s.trim().to_string()) {
        if email.is_empty() {
            return Err(bad("Email cannot be empty"));
        }
        if email != user.email {
            update.email = Some(email);
        }
    }
    if let Some(password) = req.password {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(bad("Password must be at least 6 characters"));
        }
        update.password_hash = Some(
            hash_password(&password, state.session_cfg.password_cost)
                .map_err(internal("Failed to update profile"))?,
        );
    }
    if let Some(ref username) = update.username {
        if state
            .store
            .get_user_by_username(username)
            .await
            .map_err(internal("Failed to update profile"))?
            .is_some()
        {
            return Err(bad("Username already exists"));
        }
    }
    if let Some(ref email) = update.email {
        if state
            .store
            .get_user_by_email(email)
            .await
            .map_err(internal("Failed to update profile"))?
            .is_some()
        {
            return Err(bad("Email already exists"));
        }
    }
    update.first_name = req.first_name.map(|s| Some(s).filter(|s| !s.trim().is_empty()));
    update.last_name = req.last_name.map(|s| Some(s).filter(|s| !s.trim().is_empty()));

    let updated = state
        .store
        .update_user(user.id, update)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => bad("Username or email already exists"),
            other => internal("Failed to update profile")(other),
        })?
        .ok_or_else(|| unauth("Unauthorized"))?;

    Ok(Json(UserPublic::from(&updated)))
}

// ---------- middleware ----------

/// Admits requests carrying a live session cookie; everything else is a 401.
/// The user row is reloaded on every request so deletions and admin-flag
/// changes apply immediately.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match resolve_session(&state, req.headers()).await {
        Ok((user, claims)) => {
            req.extensions_mut().insert(CurrentUser(user));
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(failure) => failure.into_response(),
    }
}

/// Must be layered inside `require_session`.
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    let is_admin = req
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.is_admin);
    match is_admin {
        Some(true) => next.run(req).await,
        Some(false) => forbidden("Forbidden - Admin access required").into_response(),
        None => unauth("Unauthorized").into_response(),
    }
}

async fn resolve_session(state: &AppState, headers: &HeaderMap) -> ApiResult<(User, Claims)> {
    let token = cookie_value(headers, &state.session_cfg.cookie_name)
        .ok_or_else(|| unauth("Unauthorized"))?;
    let claims = decode_validated(&token, state).map_err(|_| unauth("Unauthorized"))?;

    let session = state
        .store
        .get_session(claims.sid)
        .await
        .map_err(internal("Failed to load session"))?
        .filter(|s| s.user_id == claims.sub && s.is_live(Utc::now()))
        .ok_or_else(|| unauth("Unauthorized"))?;

    let user = state
        .store
        .get_user(session.user_id)
        .await
        .map_err(internal("Failed to load session"))?
        .ok_or_else(|| unauth("Unauthorized"))?;

    Ok((user, claims))
}

/// Persist a new session for `user` and return the Set-Cookie header for it.
async fn open_session(state: &AppState, user: &User) -> ApiResult<HeaderMap> {
    let sid = Uuid::new_v4();
    let claims = session_claims(user, state, sid);
    let token = jsonwebtoken::encode(&JwtHeader::new(Algorithm::HS256), &claims, &state.jwt_enc)
        .map_err(internal("Failed to start session"))?;

    state
        .store
        .create_session(NewSession {
            user_id: user.id,
            sid,
            issued_at: chrono::DateTime::from_timestamp(claims.iat, 0).unwrap_or_else(Utc::now),
            expires_at: chrono::DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        })
        .await
        .map_err(internal("Failed to start session"))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie_header(session_cookie(&token, state))?);
    Ok(headers)
}

// ---------- password hashing ----------
pub fn hash_password(password: &str, cost: PasswordCost) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(cost.memory_kib, cost.iterations, 1, None)?;
    let argon = Argon2::new(ArgonAlgorithm::Argon2id, Version::V0x13, params);
    Ok(argon.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Parameters come from the stored PHC string, not from the current config.
fn verify_password(phc: &str, password: &str) -> Result<bool, anyhow::Error> {
    let parsed = PasswordHash::new(phc)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ---------- jwt helpers ----------
const ISSUER: &str = "newsflow";
const AUDIENCE: &str = "newsflow-app";

fn session_claims(user: &User, state: &AppState, sid: Uuid) -> Claims {
    let now = Utc::now();
    Claims {
        sub: user.id,
        username: user.username.clone(),
        sid,
        iat: now.timestamp(),
        exp: (now + state.session_cfg.ttl).timestamp(),
        iss: ISSUER.into(),
        aud: AUDIENCE.into(),
    }
}

fn decode_validated(
    token: &str,
    state: &AppState,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.set_audience(&[AUDIENCE]);
    v.set_issuer(&[ISSUER]);
    jsonwebtoken::decode::<Claims>(token, &state.jwt_dec, &v).map(|d| d.claims)
}

// ---------- cookies ----------
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|kv| kv.trim().strip_prefix(&format!("{name}=")).map(str::to_string))
        .filter(|v| !v.is_empty())
}

fn session_cookie(value: &str, state: &AppState) -> String {
    let cfg = &state.session_cfg;
    let mut c = Cookie::build((cfg.cookie_name.clone(), value.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(cfg.ttl.num_seconds()))
        .build();

    if cfg.cookie_secure {
        c.set_secure(true);
    }
    if let Some(ref d) = cfg.cookie_domain {
        c.set_domain(d.clone());
    }

    c.to_string()
}

fn clear_session_cookie(state: &AppState) -> String {
    let cfg = &state.session_cfg;
    let mut c = Cookie::build((cfg.cookie_name.clone(), "".to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .build();
    if cfg.cookie_secure {
        c.set_secure(true);
    }
    if let Some(ref d) = cfg.cookie_domain {
        c.set_domain(d.clone());
    }
    c.to_string()
}

fn cookie_header(raw: String) -> ApiResult<axum::http::HeaderValue> {
    raw.parse().map_err(internal("Failed to set session cookie"))
}
