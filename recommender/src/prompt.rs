//! Prompt builders for solution assembly and question generation.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use knowledge_store::{Pattern, PolicyIntent};

use crate::cluster::ClusterOptions;
use crate::types::{ResourceCandidate, ResourceSolution};

pub const SOLUTION_SYSTEM: &str = "You are a Kubernetes platform engineer. You select cluster resource types that satisfy a user's deployment intent. Answer with JSON only.";

pub const QUESTION_SYSTEM: &str = "You are a Kubernetes platform engineer. You ask the minimum set of questions needed to configure the chosen resources. Answer with JSON only.";

/// Max schema chars per resource in the question prompt.
const SCHEMA_CHARS: usize = 6_000;

/// One line per candidate; built-in resources and CRDs share the format.
pub fn candidate_summary(candidates: &[ResourceCandidate]) -> String {
    let mut out = String::new();
    for (i, c) in candidates.iter().enumerate() {
        let group = if c.group.is_empty() { "core" } else { &c.group };
        let _ = write!(
            out,
            "{}. {} (kind: {}, group: {}, version: {}, namespaced: {})",
            i + 1,
            c.resource_name,
            c.kind,
            group,
            c.api_version,
            c.namespaced
        );
        let meta = &c.capabilities;
        if !meta.capabilities.is_empty() {
            let _ = write!(out, "\n   capabilities: {}", meta.capabilities.join(", "));
        }
        if !meta.providers.is_empty() {
            let _ = write!(out, "\n   providers: {}", meta.providers.join(", "));
        }
        if let Some(d) = &meta.description {
            let _ = write!(out, "\n   description: {d}");
        }
        out.push('\n');
    }
    out
}

fn pattern_context(patterns: &[Pattern]) -> String {
    if patterns.is_empty() {
        return "No organizational patterns matched this intent.\n".to_string();
    }
    let mut out = String::new();
    for p in patterns {
        let _ = writeln!(
            out,
            "- [{}] {}\n  triggers: {}\n  suggested resources: {}\n  rationale: {}",
            p.id,
            p.description,
            p.triggers.join(", "),
            p.suggested_resources.join(", "),
            p.rationale
        );
    }
    out
}

fn policy_context(policies: &[PolicyIntent]) -> String {
    if policies.is_empty() {
        return "No organizational policies apply.\n".to_string();
    }
    let mut out = String::new();
    for p in policies {
        let _ = writeln!(out, "- [{}] {}\n  rationale: {}", p.id, p.description, p.rationale);
    }
    out
}

fn options_context(options: &ClusterOptions) -> String {
    let list = |v: &[String]| {
        if v.is_empty() {
            "(none discovered)".to_string()
        } else {
            v.join(", ")
        }
    };
    format!(
        "namespaces: {}\nstorage classes: {}\ningress classes: {}\nnode labels: {}\n",
        list(&options.namespaces),
        list(&options.storage_classes),
        list(&options.ingress_classes),
        list(&options.node_labels)
    )
}

pub fn solution_prompt(intent: &str, candidates: &[ResourceCandidate], patterns: &[Pattern]) -> String {
    format!(
        r#"## User intent
{intent}

## Available resources
{resources}
## Organizational patterns
{patterns}
## Task
Propose one or more solutions built only from the available resources, best first.
A solution is "single" when one resource covers the intent, "combination" otherwise.
Score each solution from 0 to 100. Reference resources by their exact resourceName.

Respond with a JSON object of this shape and nothing else:
{{
  "solutions": [
    {{
      "type": "single" | "combination",
      "resources": [{{"kind": "...", "apiVersion": "...", "group": "...", "resourceName": "..."}}],
      "score": 0-100,
      "description": "...",
      "reasons": ["..."],
      "analysis": "...",
      "patternInfluences": [{{"patternId": "...", "description": "...", "influence": "high|medium|low", "matchedTriggers": ["..."]}}],
      "usedPatterns": true | false
    }}
  ]
}}
"#,
        resources = candidate_summary(candidates),
        patterns = pattern_context(patterns),
    )
}

pub fn question_prompt(
    intent: &str,
    solution: &ResourceSolution,
    schemas: &BTreeMap<String, String>,
    options: &ClusterOptions,
    policies: &[PolicyIntent],
) -> String {
    let mut schema_text = String::new();
    for (name, schema) in schemas {
        let trimmed: String = schema.chars().take(SCHEMA_CHARS).collect();
        let _ = writeln!(schema_text, "### {name}\n{trimmed}\n");
    }

    format!(
        r#"## User intent
{intent}

## Chosen solution
{description}

Resources:
{resources}
## Resource schemas
{schema_text}
## Cluster options
{options}
## Organizational policies
{policies}
## Task
Generate the questions needed to configure these resources. Put must-answer
questions (names, namespaces) in "required", common settings in "basic",
tuning knobs in "advanced". Prefer "select" with options from the cluster
options above when one applies. Policies should become defaults or validation.

Respond with a JSON object of this shape and nothing else:
{{
  "required": [{{"id": "...", "question": "...", "type": "text|select|multiselect|boolean|number", "options": ["..."], "placeholder": "...", "validation": {{"required": true}}, "suggestedAnswer": null}}],
  "basic": [],
  "advanced": [],
  "open": {{"question": "...", "placeholder": "..."}}
}}
"#,
        description = solution.description,
        resources = candidate_summary(&solution.resources),
        options = options_context(options),
        policies = policy_context(policies),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_marks_core_group() {
        let c = ResourceCandidate {
            kind: "Service".into(),
            group: String::new(),
            api_version: "v1".into(),
            resource_name: "services".into(),
            namespaced: true,
            ..Default::default()
        };
        let s = candidate_summary(&[c]);
        assert!(s.starts_with("1. services (kind: Service, group: core, version: v1, namespaced: true)"));
    }

    #[test]
    fn solution_prompt_carries_intent_and_shape() {
        let p = solution_prompt("deploy postgres", &[], &[]);
        assert!(p.contains("deploy postgres"));
        assert!(p.contains("\"resourceName\""));
        assert!(p.contains("No organizational patterns"));
    }
}
