//! Candidate normalization, inventory enrichment and pattern injection.

use knowledge_store::{Capability, EntityHit, Pattern};
use tracing::debug;

use crate::cluster::ResourceInventory;
use crate::types::{
    CapabilityMeta, PatternInfluence, ResourceCandidate, ResourceSolution, SolutionType,
};

/// Cloud provider implied by an API group.
pub fn infer_provider(group: &str) -> &'static str {
    let segments: Vec<String> = group.split('.').map(str::to_ascii_lowercase).collect();
    let has = |name: &str| segments.iter().any(|s| s == name);
    if has("azure") {
        "azure"
    } else if has("aws") {
        "aws"
    } else if has("gcp") {
        "gcp"
    } else {
        "kubernetes"
    }
}

/// Splits `plural.group` on the first dot. A bare name is a core resource
/// (empty group). `None` for empty or malformed names.
pub fn split_resource_name(name: &str) -> Option<(&str, &str)> {
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    match name.split_once('.') {
        Some((kind, group)) if !kind.is_empty() && !group.is_empty() => Some((kind, group)),
        Some(_) => None,
        None => Some((name, "")),
    }
}

/// Placeholder version until the cluster inventory says otherwise.
pub fn default_api_version(group: &str) -> String {
    if group.is_empty() {
        "v1".to_string()
    } else {
        format!("{group}/v1beta1")
    }
}

/// Turns capability hits into candidates, keeping search order.
pub fn from_capability_hits(hits: &[EntityHit<Capability>]) -> Vec<ResourceCandidate> {
    hits.iter()
        .filter_map(|hit| {
            let cap = &hit.data;
            let Some((kind, parsed_group)) = split_resource_name(&cap.resource_name) else {
                debug!(id = %cap.id, resource = %cap.resource_name, "skipping capability with malformed resourceName");
                return None;
            };
            let group = cap.group.clone().unwrap_or_else(|| parsed_group.to_string());
            Some(ResourceCandidate {
                kind: kind.to_string(),
                api_version: cap
                    .api_version
                    .clone()
                    .unwrap_or_else(|| default_api_version(&group)),
                group,
                resource_name: cap.resource_name.trim().to_string(),
                namespaced: true,
                capabilities: CapabilityMeta {
                    capabilities: cap.capabilities.clone(),
                    providers: cap.providers.clone(),
                    abstractions: cap.abstractions.clone(),
                    complexity: Some(cap.complexity),
                    description: (!cap.description.is_empty()).then(|| cap.description.clone()),
                    confidence: Some(cap.confidence),
                    relevance: Some(hit.score),
                    pattern_id: None,
                },
            })
        })
        .collect()
}

/// Fills kind, version and scope from the live cluster. Returns how many
/// candidates were matched.
pub fn enrich_with_inventory(
    candidates: &mut [ResourceCandidate],
    inventory: &ResourceInventory,
) -> usize {
    let mut matched = 0;
    for c in candidates.iter_mut() {
        if let Some(r) = inventory.find(&c.resource_name) {
            c.kind = r.kind.clone();
            c.group = r.group.clone();
            c.api_version = r.api_version.clone();
            c.namespaced = r.namespaced;
            matched += 1;
        }
    }
    matched
}

/// Completes a model-returned resource from the known candidates.
///
/// A resource whose `resourceName` matches a candidate takes the candidate's
/// verified fields. Anything else is kept as the model returned it.
pub fn reconcile_resource(
    resource: ResourceCandidate,
    candidates: &[ResourceCandidate],
) -> ResourceCandidate {
    let name = resource.resource_name.trim();
    if name.is_empty() {
        return resource;
    }
    match candidates
        .iter()
        .find(|c| c.resource_name.eq_ignore_ascii_case(name))
    {
        Some(known) => known.clone(),
        None => {
            let mut r = resource;
            r.resource_name = r.resource_name.trim().to_string();
            if let Some((kind, group)) = split_resource_name(&r.resource_name) {
                if r.kind.is_empty() {
                    r.kind = kind.to_string();
                }
                if r.group.is_empty() {
                    r.group = group.to_string();
                }
            }
            if r.api_version.is_empty() {
                r.api_version = default_api_version(&r.group);
            }
            r
        }
    }
}

/// Candidate for a resource suggested by `pattern`.
pub fn pattern_candidate(resource_name: &str, pattern: &Pattern) -> Option<ResourceCandidate> {
    let (kind, group) = split_resource_name(resource_name)?;
    Some(ResourceCandidate {
        kind: kind.to_string(),
        group: group.to_string(),
        api_version: default_api_version(group),
        resource_name: resource_name.trim().to_string(),
        namespaced: true,
        capabilities: CapabilityMeta {
            providers: vec![infer_provider(group).to_string()],
            description: (!pattern.rationale.is_empty()).then(|| pattern.rationale.clone()),
            pattern_id: Some(pattern.id.clone()),
            ..CapabilityMeta::default()
        },
    })
}

/// Appends each pattern's suggested resources that `solution` lacks.
///
/// Empty or malformed entries are skipped. Running it twice adds nothing the
/// second time. Returns the number of resources added.
pub fn inject_pattern_resources(solution: &mut ResourceSolution, patterns: &[Pattern]) -> usize {
    let mut added = 0;
    for pattern in patterns {
        let mut added_by_pattern = 0;
        for name in &pattern.suggested_resources {
            if solution.has_resource(name.trim()) {
                continue;
            }
            match pattern_candidate(name, pattern) {
                Some(c) => {
                    solution.resources.push(c);
                    added_by_pattern += 1;
                }
                None => {
                    debug!(pattern = %pattern.id, resource = %name, "skipping malformed suggested resource");
                }
            }
        }
        if added_by_pattern > 0 {
            solution.used_patterns = true;
            if !solution
                .pattern_influences
                .iter()
                .any(|p| p.pattern_id == pattern.id)
            {
                solution.pattern_influences.push(PatternInfluence {
                    pattern_id: pattern.id.clone(),
                    description: pattern.description.clone(),
                    influence: "injected".to_string(),
                    matched_triggers: pattern.triggers.clone(),
                });
            }
            added += added_by_pattern;
        }
    }
    if added > 0 && solution.resources.len() > 1 {
        solution.solution_type = SolutionType::Combination;
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pattern(id: &str, resources: &[&str]) -> Pattern {
        Pattern {
            id: id.into(),
            description: format!("{id} pattern"),
            triggers: vec!["azure".into()],
            suggested_resources: resources.iter().map(|s| s.to_string()).collect(),
            rationale: "Always group Azure resources".into(),
            created_at: Utc::now(),
            created_by: "platform".into(),
        }
    }

    #[test]
    fn provider_from_group_segments() {
        assert_eq!(infer_provider("azure.upbound.io"), "azure");
        assert_eq!(infer_provider("rds.aws.upbound.io"), "aws");
        assert_eq!(infer_provider("sql.gcp.upbound.io"), "gcp");
        assert_eq!(infer_provider("apps"), "kubernetes");
        assert_eq!(infer_provider(""), "kubernetes");
        assert_eq!(infer_provider("awesome.dev"), "kubernetes");
    }

    #[test]
    fn resource_names_split_on_first_dot() {
        assert_eq!(
            split_resource_name("resourcegroups.azure.upbound.io"),
            Some(("resourcegroups", "azure.upbound.io"))
        );
        assert_eq!(split_resource_name("services"), Some(("services", "")));
        assert_eq!(split_resource_name("  "), None);
        assert_eq!(split_resource_name(".apps"), None);
        assert_eq!(split_resource_name("deployments."), None);
        assert_eq!(split_resource_name("two words"), None);
    }

    #[test]
    fn azure_injection_example() {
        let mut s = ResourceSolution::default();
        let n = inject_pattern_resources(&mut s, &[pattern("azure-rg", &["resourcegroups.azure.upbound.io"])]);
        assert_eq!(n, 1);
        let r = &s.resources[0];
        assert_eq!(r.kind, "resourcegroups");
        assert_eq!(r.group, "azure.upbound.io");
        assert_eq!(r.api_version, "azure.upbound.io/v1beta1");
        assert_eq!(r.capabilities.providers, vec!["azure"]);
        assert_eq!(r.capabilities.pattern_id.as_deref(), Some("azure-rg"));
        assert!(s.used_patterns);
        assert_eq!(s.pattern_influences[0].influence, "injected");
    }

    #[test]
    fn injection_is_idempotent_and_skips_malformed() {
        let patterns = [pattern(
            "p",
            &["resourcegroups.azure.upbound.io", "", "bad name", "services"],
        )];
        let mut s = ResourceSolution {
            resources: vec![ResourceCandidate {
                resource_name: "Services".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(inject_pattern_resources(&mut s, &patterns), 1);
        let snapshot = s.clone();
        assert_eq!(inject_pattern_resources(&mut s, &patterns), 0);
        assert_eq!(s, snapshot);
        assert_eq!(s.resources.len(), 2);
        assert_eq!(s.solution_type, SolutionType::Combination);
    }

    #[test]
    fn reconcile_prefers_known_candidate() {
        let known = ResourceCandidate {
            kind: "Deployment".into(),
            group: "apps".into(),
            api_version: "apps/v1".into(),
            resource_name: "deployments.apps".into(),
            namespaced: true,
            capabilities: CapabilityMeta::default(),
        };
        let from_model = ResourceCandidate {
            kind: "deployment".into(),
            resource_name: "Deployments.apps".into(),
            ..Default::default()
        };
        assert_eq!(reconcile_resource(from_model, &[known.clone()]), known);

        let unknown = ResourceCandidate {
            resource_name: "sqls.devopstoolkit.live".into(),
            ..Default::default()
        };
        let r = reconcile_resource(unknown, &[known]);
        assert_eq!(r.group, "devopstoolkit.live");
        assert_eq!(r.api_version, "devopstoolkit.live/v1beta1");
    }
}
