use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupReq {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub supabase_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginReq {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile edit. Absent fields stay as they are; an empty first/last name
/// clears it.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdateReq {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A user as clients see it: everything but the password hash.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub supabase_id: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<&User> for UserPublic {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            supabase_id: u.supabase_id.clone(),
            is_admin: u.is_admin,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageOut {
    pub message: String,
}

impl MessageOut {
    pub fn new(msg: &str) -> Self {
        Self { message: msg.into() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub sid: Uuid, // session id
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}
