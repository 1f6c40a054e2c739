use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InterestsReq {
    pub categories: Vec<String>,
}
