//! Cluster discovery boundary and its `kubectl` adapter.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{RecommendError, Result};
use crate::stage::Stage;

/// One API resource type served by the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredResource {
    /// Singular CamelCase kind, e.g. `Deployment`.
    pub kind: String,
    /// Empty for the core group.
    pub group: String,
    pub api_version: String,
    /// Plural, group-qualified name (`deployments.apps`, `services`).
    pub resource_name: String,
    pub namespaced: bool,
}

/// Built-in resources and CRD-backed resources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceInventory {
    pub resources: Vec<DiscoveredResource>,
    pub custom: Vec<DiscoveredResource>,
}

impl ResourceInventory {
    pub fn find(&self, resource_name: &str) -> Option<&DiscoveredResource> {
        self.resources
            .iter()
            .chain(self.custom.iter())
            .find(|r| r.resource_name.eq_ignore_ascii_case(resource_name))
    }
}

/// Values offered as answer options for generated questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOptions {
    pub namespaces: Vec<String>,
    pub storage_classes: Vec<String>,
    pub ingress_classes: Vec<String>,
    /// `key=value` pairs across all nodes.
    pub node_labels: Vec<String>,
}

impl ClusterOptions {
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
            && self.storage_classes.is_empty()
            && self.ingress_classes.is_empty()
            && self.node_labels.is_empty()
    }
}

/// Read-only view of a cluster.
pub trait ClusterDiscovery: Send + Sync {
    fn discover_resources(&self) -> BoxFuture<'_, Result<ResourceInventory>>;

    /// Field documentation for `resource_name`.
    fn explain_resource<'a>(&'a self, resource_name: &'a str) -> BoxFuture<'a, Result<String>>;

    fn namespaces(&self) -> BoxFuture<'_, Result<Vec<String>>>;
    fn storage_classes(&self) -> BoxFuture<'_, Result<Vec<String>>>;
    fn ingress_classes(&self) -> BoxFuture<'_, Result<Vec<String>>>;
    fn node_labels(&self) -> BoxFuture<'_, Result<Vec<String>>>;
}

/// Lists every option category concurrently; a failing category is empty.
pub async fn discover_options(discovery: &dyn ClusterDiscovery) -> ClusterOptions {
    let (namespaces, storage_classes, ingress_classes, node_labels) = tokio::join!(
        discovery.namespaces(),
        discovery.storage_classes(),
        discovery.ingress_classes(),
        discovery.node_labels(),
    );
    let tolerate = |r: Result<Vec<String>>| Stage::ClusterOptions.resolve(r, Vec::new).unwrap_or_default();
    ClusterOptions {
        namespaces: tolerate(namespaces),
        storage_classes: tolerate(storage_classes),
        ingress_classes: tolerate(ingress_classes),
        node_labels: tolerate(node_labels),
    }
}

/* ------------------------------------------------------------------------- */
/* kubectl adapter                                                           */
/* ------------------------------------------------------------------------- */

/// Shells out to `kubectl`.
#[derive(Debug, Clone)]
pub struct KubectlDiscovery {
    binary: String,
    kubeconfig: Option<PathBuf>,
    timeout: Duration,
}

impl Default for KubectlDiscovery {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
            kubeconfig: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl KubectlDiscovery {
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self {
            kubeconfig,
            ..Self::default()
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let started = Instant::now();
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).kill_on_drop(true);
        if let Some(path) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(path);
        }

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                RecommendError::Cluster(format!(
                    "`{} {}` timed out after {:?}",
                    self.binary,
                    args.join(" "),
                    self.timeout
                ))
            })?
            .map_err(|e| RecommendError::Cluster(format!("failed to run {}: {e}", self.binary)))?;

        debug!(
            args = %args.join(" "),
            status = ?output.status.code(),
            latency_ms = started.elapsed().as_millis(),
            "kubectl finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecommendError::Cluster(format!(
                "`{} {}` failed: {}",
                self.binary,
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn names_of(&self, kind: &str) -> Result<Vec<String>> {
        let out = self
            .run(&["get", kind, "-o", "jsonpath={.items[*].metadata.name}"])
            .await?;
        Ok(split_names(&out))
    }
}

impl ClusterDiscovery for KubectlDiscovery {
    fn discover_resources(&self) -> BoxFuture<'_, Result<ResourceInventory>> {
        Box::pin(async move {
            let (api, crds) = tokio::join!(
                self.run(&["api-resources", "--no-headers", "-o", "wide"]),
                self.run(&["get", "crd", "-o", "json"]),
            );
            let custom = match crds {
                Ok(text) => parse_crds(&text)?,
                Err(e) => {
                    warn!(error = %e, "CRD listing failed; continuing with api-resources only");
                    Vec::new()
                }
            };
            let custom_names: HashSet<&str> =
                custom.iter().map(|r| r.resource_name.as_str()).collect();
            let resources = parse_api_resources(&api?)
                .into_iter()
                .filter(|r| !custom_names.contains(r.resource_name.as_str()))
                .collect();
            Ok(ResourceInventory { resources, custom })
        })
    }

    fn explain_resource<'a>(&'a self, resource_name: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { self.run(&["explain", resource_name, "--recursive"]).await })
    }

    fn namespaces(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(self.names_of("namespaces"))
    }

    fn storage_classes(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(self.names_of("storageclasses"))
    }

    fn ingress_classes(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(self.names_of("ingressclasses"))
    }

    fn node_labels(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move {
            let out = self.run(&["get", "nodes", "-o", "json"]).await?;
            parse_node_labels(&out)
        })
    }
}

fn split_names(out: &str) -> Vec<String> {
    out.split_whitespace().map(str::to_string).collect()
}

/// Parses `kubectl api-resources --no-headers -o wide`.
///
/// Columns are `NAME [SHORTNAMES] APIVERSION NAMESPACED KIND VERBS [CATEGORIES]`;
/// SHORTNAMES may be blank, so rows are anchored on the NAMESPACED column.
pub fn parse_api_resources(out: &str) -> Vec<DiscoveredResource> {
    out.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            let ns_idx = cols
                .iter()
                .enumerate()
                .skip(2)
                .find(|(_, c)| **c == "true" || **c == "false")
                .map(|(i, _)| i)?;
            let name = *cols.first()?;
            let api_version = cols[ns_idx - 1];
            let kind = *cols.get(ns_idx + 1)?;
            let group = api_version
                .rsplit_once('/')
                .map(|(g, _)| g.to_string())
                .unwrap_or_default();
            let resource_name = if group.is_empty() {
                name.to_string()
            } else {
                format!("{name}.{group}")
            };
            Some(DiscoveredResource {
                kind: kind.to_string(),
                group,
                api_version: api_version.to_string(),
                resource_name,
                namespaced: cols[ns_idx] == "true",
            })
        })
        .collect()
}

/// Parses `kubectl get crd -o json`. The storage version wins, then the
/// first served one.
pub fn parse_crds(out: &str) -> Result<Vec<DiscoveredResource>> {
    let v: Value = serde_json::from_str(out)
        .map_err(|e| RecommendError::Cluster(format!("invalid CRD list: {e}")))?;
    let items = v["items"].as_array().map(Vec::as_slice).unwrap_or_default();

    Ok(items
        .iter()
        .filter_map(|item| {
            let spec = &item["spec"];
            let group = spec["group"].as_str()?;
            let plural = spec["names"]["plural"].as_str()?;
            let kind = spec["names"]["kind"].as_str()?;
            let versions = spec["versions"].as_array()?;
            let version = versions
                .iter()
                .find(|v| v["storage"].as_bool() == Some(true))
                .or_else(|| versions.iter().find(|v| v["served"].as_bool() == Some(true)))
                .and_then(|v| v["name"].as_str())?;
            Some(DiscoveredResource {
                kind: kind.to_string(),
                group: group.to_string(),
                api_version: format!("{group}/{version}"),
                resource_name: format!("{plural}.{group}"),
                namespaced: spec["scope"].as_str() != Some("Cluster"),
            })
        })
        .collect())
}

/// Parses `kubectl get nodes -o json` into sorted, unique `key=value` labels.
pub fn parse_node_labels(out: &str) -> Result<Vec<String>> {
    let v: Value = serde_json::from_str(out)
        .map_err(|e| RecommendError::Cluster(format!("invalid node list: {e}")))?;
    let mut labels = BTreeSet::new();
    for node in v["items"].as_array().into_iter().flatten() {
        if let Some(map) = node["metadata"]["labels"].as_object() {
            for (k, val) in map {
                labels.insert(format!("{k}={}", val.as_str().unwrap_or_default()));
            }
        }
    }
    Ok(labels.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_resources_with_and_without_shortnames() {
        let out = "\
bindings                                       v1                        true         Binding                    create
services              svc                      v1                        true         Service                    create,delete,get,list   all
deployments           deploy                   apps/v1                   true         Deployment                 create,delete,get,list   all
storageclasses        sc                       storage.k8s.io/v1         false        StorageClass               create,delete,get,list
";
        let rs = parse_api_resources(out);
        assert_eq!(rs.len(), 4);
        assert_eq!(rs[0].resource_name, "bindings");
        assert_eq!(rs[0].kind, "Binding");
        assert_eq!(rs[2].resource_name, "deployments.apps");
        assert_eq!(rs[2].group, "apps");
        assert_eq!(rs[3].resource_name, "storageclasses.storage.k8s.io");
        assert!(!rs[3].namespaced);
    }

    #[test]
    fn crds_pick_storage_version() {
        let out = r#"{"items":[{"spec":{
            "group":"azure.upbound.io",
            "names":{"plural":"resourcegroups","kind":"ResourceGroup"},
            "scope":"Cluster",
            "versions":[{"name":"v1beta2","served":true,"storage":false},
                        {"name":"v1beta1","served":true,"storage":true}]}}]}"#;
        let crds = parse_crds(out).unwrap();
        assert_eq!(crds.len(), 1);
        assert_eq!(crds[0].resource_name, "resourcegroups.azure.upbound.io");
        assert_eq!(crds[0].api_version, "azure.upbound.io/v1beta1");
        assert!(!crds[0].namespaced);
    }

    #[test]
    fn node_labels_are_unique_and_sorted() {
        let out = r#"{"items":[
            {"metadata":{"labels":{"zone":"a","kubernetes.io/os":"linux"}}},
            {"metadata":{"labels":{"zone":"b","kubernetes.io/os":"linux"}}}]}"#;
        assert_eq!(
            parse_node_labels(out).unwrap(),
            vec!["kubernetes.io/os=linux", "zone=a", "zone=b"]
        );
    }

    #[tokio::test]
    async fn missing_binary_is_a_cluster_error() {
        let d = KubectlDiscovery::default().with_binary("kubectl-does-not-exist-here");
        let err = d.namespaces().await.unwrap_err();
        assert!(matches!(err, RecommendError::Cluster(_)));
    }
}
