pub mod admin;
pub mod api_key;
pub mod interests;
pub mod news;
pub mod saved_articles;
pub mod user_auth;
