//! Recommender settings.

use std::path::PathBuf;

use crate::error::{RecommendError, Result};

pub const DEFAULT_DEBUG_DIR: &str = "tmp/debug";
pub const DEFAULT_CAPABILITY_LIMIT: usize = 20;
pub const DEFAULT_PATTERN_LIMIT: usize = 5;
pub const DEFAULT_POLICY_LIMIT: usize = 5;

/// Passed to [`crate::ResourceRecommender::new`]; the pipeline never reads
/// the environment itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderConfig {
    /// Dump prompts and raw responses under `debug_dir`.
    pub debug: bool,
    pub debug_dir: PathBuf,
    pub capability_limit: usize,
    pub pattern_limit: usize,
    pub policy_limit: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            debug: false,
            debug_dir: PathBuf::from(DEFAULT_DEBUG_DIR),
            capability_limit: DEFAULT_CAPABILITY_LIMIT,
            pattern_limit: DEFAULT_PATTERN_LIMIT,
            policy_limit: DEFAULT_POLICY_LIMIT,
        }
    }
}

impl RecommenderConfig {
    /// Reads `RECOMMENDER_DEBUG`, `RECOMMENDER_DEBUG_DIR` and
    /// `RECOMMENDER_{CAPABILITY,PATTERN,POLICY}_LIMIT`.
    ///
    /// # Errors
    /// [`RecommendError::Config`] for a non-numeric or zero limit.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let d = Self::default();
        let limit = |name: &str, default: usize| -> Result<usize> {
            match get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                None => Ok(default),
                Some(v) => match v.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(RecommendError::Config(format!(
                        "{name} must be a positive integer, got `{v}`"
                    ))),
                },
            }
        };
        Ok(Self {
            debug: get("RECOMMENDER_DEBUG").is_some_and(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            }),
            debug_dir: get("RECOMMENDER_DEBUG_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(d.debug_dir),
            capability_limit: limit("RECOMMENDER_CAPABILITY_LIMIT", d.capability_limit)?,
            pattern_limit: limit("RECOMMENDER_PATTERN_LIMIT", d.pattern_limit)?,
            policy_limit: limit("RECOMMENDER_POLICY_LIMIT", d.policy_limit)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(
            RecommenderConfig::from_lookup(lookup(&[])).unwrap(),
            RecommenderConfig::default()
        );
    }

    #[test]
    fn reads_flags_and_limits() {
        let cfg = RecommenderConfig::from_lookup(lookup(&[
            ("RECOMMENDER_DEBUG", "Yes"),
            ("RECOMMENDER_DEBUG_DIR", "/tmp/dumps"),
            ("RECOMMENDER_PATTERN_LIMIT", "3"),
        ]))
        .unwrap();
        assert!(cfg.debug);
        assert_eq!(cfg.debug_dir, PathBuf::from("/tmp/dumps"));
        assert_eq!(cfg.pattern_limit, 3);
        assert_eq!(cfg.policy_limit, DEFAULT_POLICY_LIMIT);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = RecommenderConfig::from_lookup(lookup(&[("RECOMMENDER_POLICY_LIMIT", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("RECOMMENDER_POLICY_LIMIT"));
    }
}
