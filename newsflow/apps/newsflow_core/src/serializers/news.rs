use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryOut {
    pub content: String,
}
