use axum::Json;
use newsflow_ai::category::CategoryInfo;
use newsflow_ai::Category;
use serde_json::{json, Value};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok", "app": "newsflow" }))
}

pub async fn categories() -> Json<Vec<CategoryInfo>> {
    Json(Category::ALL.into_iter().map(Category::info).collect())
}
