//! Question set parsing and cluster option injection.

use crate::cluster::ClusterOptions;
use crate::error::{RecommendError, Result};
use crate::json_extract::parse_json_object;
use crate::types::{QuestionGroup, QuestionType};

/// Cluster option category a question asks about, judged from its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionSource {
    Namespace,
    StorageClass,
    IngressClass,
    NodeLabel,
}

fn option_source(id: &str) -> Option<OptionSource> {
    let id: String = id
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if id.contains("storageclass") {
        Some(OptionSource::StorageClass)
    } else if id.contains("ingressclass") {
        Some(OptionSource::IngressClass)
    } else if id.contains("nodeselector") || id.contains("nodelabel") {
        Some(OptionSource::NodeLabel)
    } else if id.contains("namespace") {
        Some(OptionSource::Namespace)
    } else {
        None
    }
}

/// Parses the model's question set.
pub fn parse_question_group(raw: &str) -> Result<QuestionGroup> {
    let group: QuestionGroup = parse_json_object(raw).map_err(RecommendError::QuestionParse)?;
    if group.open.question.trim().is_empty() {
        return Ok(QuestionGroup {
            open: Default::default(),
            ..group
        });
    }
    Ok(group)
}

/// Replaces the options of cluster-backed questions with discovered values.
///
/// Only questions without options of their own are touched; free-text ones
/// become `select` (`multiselect` for node labels). Returns how many
/// questions were changed.
pub fn inject_cluster_options(group: &mut QuestionGroup, options: &ClusterOptions) -> usize {
    let mut changed = 0;
    for q in group.iter_mut() {
        if !q.options.is_empty() {
            continue;
        }
        let Some(source) = option_source(&q.id) else {
            continue;
        };
        let values = match source {
            OptionSource::Namespace => &options.namespaces,
            OptionSource::StorageClass => &options.storage_classes,
            OptionSource::IngressClass => &options.ingress_classes,
            OptionSource::NodeLabel => &options.node_labels,
        };
        if values.is_empty() {
            continue;
        }
        q.options = values.clone();
        if q.kind == QuestionType::Text {
            q.kind = if source == OptionSource::NodeLabel {
                QuestionType::Multiselect
            } else {
                QuestionType::Select
            };
        }
        changed += 1;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FALLBACK_OPEN_QUESTION, Question};

    fn q(id: &str, kind: QuestionType, options: &[&str]) -> Question {
        Question {
            id: id.into(),
            question: format!("{id}?"),
            kind,
            options: options.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn cluster() -> ClusterOptions {
        ClusterOptions {
            namespaces: vec!["default".into(), "prod".into()],
            storage_classes: vec!["standard".into()],
            ingress_classes: vec![],
            node_labels: vec!["zone=a".into()],
        }
    }

    #[test]
    fn options_injected_by_question_id() {
        let mut g = QuestionGroup {
            required: vec![q("namespace", QuestionType::Text, &[])],
            basic: vec![
                q("storage-class", QuestionType::Text, &[]),
                q("ingressClassName", QuestionType::Text, &[]),
            ],
            advanced: vec![
                q("node_selector", QuestionType::Text, &[]),
                q("target_namespace", QuestionType::Select, &["mine"]),
            ],
            ..Default::default()
        };
        assert_eq!(inject_cluster_options(&mut g, &cluster()), 3);
        assert_eq!(g.required[0].options, vec!["default", "prod"]);
        assert_eq!(g.required[0].kind, QuestionType::Select);
        assert_eq!(g.basic[0].options, vec!["standard"]);
        // no ingress classes discovered
        assert!(g.basic[1].options.is_empty());
        assert_eq!(g.advanced[0].kind, QuestionType::Multiselect);
        assert_eq!(g.advanced[1].options, vec!["mine"]);
    }

    #[test]
    fn parse_fills_blank_open_question() {
        let g = parse_question_group(
            "```json\n{\"required\":[],\"open\":{\"question\":\"\",\"placeholder\":\"\"}}\n```",
        )
        .unwrap();
        assert_eq!(g.open.question, FALLBACK_OPEN_QUESTION);
    }

    #[test]
    fn parse_rejects_prose() {
        let err = parse_question_group("I need more information first.").unwrap_err();
        assert!(matches!(err, RecommendError::QuestionParse(_)));
    }
}
