use newsflow_ai::KeyVerdict;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GeminiKeyReq {
    #[serde(default)]
    pub gemini_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KeyValidationOut {
    pub valid: bool,
    pub verdict: KeyVerdict,
}
