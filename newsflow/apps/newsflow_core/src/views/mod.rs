pub mod admin;
pub mod api_keys;
pub mod health;
pub mod interests;
pub mod news;
pub mod respond;
pub mod saved_articles;
pub mod user_auth;
