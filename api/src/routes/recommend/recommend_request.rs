use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// What the user wants to deploy, in plain words.
    pub intent: String,
}
