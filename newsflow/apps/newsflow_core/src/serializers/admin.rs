use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct AdminStatusReq {
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminLogReq {
    pub action: Option<String>,
    pub target_type: Option<String>,
    /// Accepts a string or a number.
    pub target_id: Option<Value>,
    /// Free text, or any JSON which is stored in its serialized form.
    pub details: Option<Value>,
}

/// Render a loosely-typed JSON value as stored text; blank and null are absent.
pub fn text_of(v: Option<Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
