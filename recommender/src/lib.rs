//! Intent to Kubernetes resource recommendations.
//!
//! [`ResourceRecommender`] searches stored capabilities and patterns, asks the
//! model to assemble solutions, injects pattern resources, fetches schemas
//! from the cluster and generates configuration questions.

pub mod candidates;
pub mod cluster;
pub mod config;
pub mod error;
pub mod json_extract;
pub mod llm;
pub mod prompt;
pub mod prompt_dump;
pub mod questions;
pub mod recommender;
pub mod schema;
pub mod stage;
pub mod types;

pub use cluster::{
    ClusterDiscovery, ClusterOptions, DiscoveredResource, KubectlDiscovery, ResourceInventory,
};
pub use config::RecommenderConfig;
pub use error::{RecommendError, Result};
pub use llm::LlmClient;
pub use recommender::ResourceRecommender;
pub use stage::{Stage, StagePolicy};
pub use types::{
    CapabilityMeta, OpenQuestion, PatternInfluence, Question, QuestionGroup, QuestionType,
    RecommendationOutcome, ResourceCandidate, ResourceSolution, SolutionType,
};
