//! Concurrent schema lookup for solution resources.

use std::collections::BTreeMap;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::cluster::ClusterDiscovery;
use crate::error::{RecommendError, Result};
use crate::types::ResourceCandidate;

/// Fetches the schema of every resource, keyed by `resourceName`.
///
/// # Errors
/// - [`RecommendError::MissingResourceName`] before any lookup when a
///   resource has no key
/// - [`RecommendError::SchemaFetch`] when every lookup failed
///
/// Partial failures are logged and the successful schemas returned.
pub async fn fetch_schemas(
    discovery: &dyn ClusterDiscovery,
    resources: &[ResourceCandidate],
) -> Result<BTreeMap<String, String>> {
    if let Some(r) = resources.iter().find(|r| r.resource_name.trim().is_empty()) {
        return Err(RecommendError::MissingResourceName {
            kind: r.kind.clone(),
        });
    }
    if resources.is_empty() {
        return Ok(BTreeMap::new());
    }

    let started = Instant::now();
    let results = join_all(resources.iter().map(|r| async move {
        let name = r.resource_name.trim();
        (name, discovery.explain_resource(name).await)
    }))
    .await;

    let mut schemas = BTreeMap::new();
    let mut failures = Vec::new();
    for (name, result) in results {
        match result {
            Ok(schema) => {
                schemas.insert(name.to_string(), schema);
            }
            Err(e) => failures.push(format!("{name}: {e}")),
        }
    }

    debug!(
        ok = schemas.len(),
        failed = failures.len(),
        latency_ms = started.elapsed().as_millis(),
        "schemas fetched"
    );

    if schemas.is_empty() {
        return Err(RecommendError::SchemaFetch {
            failed: failures.len(),
            details: failures.join("; "),
        });
    }
    if !failures.is_empty() {
        warn!(
            failed = failures.len(),
            details = %failures.join("; "),
            "some resource schemas could not be fetched"
        );
    }
    Ok(schemas)
}
