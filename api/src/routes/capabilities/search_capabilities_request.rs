use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchCapabilitiesRequest {
    pub query: String,
    pub limit: Option<usize>,
    pub score_threshold: Option<f32>,
}
