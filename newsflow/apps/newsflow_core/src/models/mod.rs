pub mod admin_log;
pub mod api_key;
pub mod interest;
pub mod saved_article;
pub mod session;
pub mod user;
