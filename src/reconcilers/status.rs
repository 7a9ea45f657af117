// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status Updater: recomputes the four replica counters from the current
//! pod inventory and writes the `RayCluster.status` subresource.
//!
//! `lastUpdateTime` is refreshed unconditionally on every call so callers
//! can use it as a liveness signal; the counters themselves are only
//! patched when at least one of them actually changed. Status write
//! failures are logged and swallowed here -- the top-level reconciler
//! never turns a status error into a requeue.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use tracing::{debug, warn};

use crate::builders::worker_selector_labels;
use crate::constants::FIELD_MANAGER;
use crate::crd::RayCluster;
use crate::labels::RAY_CLUSTER_LABEL;
use crate::status_calc::{compute_replica_counts, counts_changed};

/// Recompute and, if needed, patch `cluster`'s status subresource.
///
/// Lists every worker pod across all of the cluster's groups (a single
/// cluster-label-scoped list, rather than one list per group, since the
/// replica calculator only needs the aggregate) and writes the resulting
/// counters plus a fresh `lastUpdateTime`.
///
/// Status write failures are logged, not returned: a stale status is
/// corrected on the next reconcile, so it isn't worth an extra retry.
pub async fn update_status(client: &Client, cluster: &RayCluster) {
    if let Err(err) = try_update_status(client, cluster).await {
        warn!(
            cluster = %cluster.name_any(),
            namespace = %cluster.namespace().unwrap_or_default(),
            error = %err,
            "failed to patch RayCluster status, will rely on next reconcile"
        );
    }
}

async fn try_update_status(client: &Client, cluster: &RayCluster) -> Result<(), kube::Error> {
    let namespace = cluster.namespace().unwrap_or_default();
    let cluster_name = cluster.name_any();

    let pod_api: Api<Pod> = Api::namespaced(client.clone(), &namespace);
    let selector = format!("{RAY_CLUSTER_LABEL}={cluster_name}");
    let worker_pods: Vec<Pod> = pod_api
        .list(&ListParams::default().labels(&selector))
        .await?
        .items
        .into_iter()
        .filter(|p| {
            p.metadata
                .labels
                .as_ref()
                .is_some_and(|labels| is_worker_pod(labels, &cluster_name))
        })
        .collect();

    let counts = compute_replica_counts(&cluster.spec.worker_group_specs, &worker_pods);
    let existing = cluster.status.clone().unwrap_or_default();
    let now = chrono::Utc::now().to_rfc3339();

    let mut status = json!({
        "lastUpdateTime": now,
        "observedGeneration": cluster.metadata.generation,
    });

    if counts_changed(&existing, &counts) {
        let fields = status.as_object_mut().expect("status patch is always an object");
        fields.insert("availableWorkerReplicas".to_string(), json!(counts.available));
        fields.insert("desiredWorkerReplicas".to_string(), json!(counts.desired));
        fields.insert("minWorkerReplicas".to_string(), json!(counts.min));
        fields.insert("maxWorkerReplicas".to_string(), json!(counts.max));
    } else {
        debug!(cluster = %cluster_name, namespace = %namespace, "replica counters unchanged, patching timestamp only");
    }

    let patch = json!({ "status": status });

    let api: Api<RayCluster> = Api::namespaced(client.clone(), &namespace);
    api.patch_status(
        &cluster_name,
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(&patch),
    )
    .await?;

    Ok(())
}

/// Whether `labels` identify a worker pod (as opposed to the head pod)
/// belonging to `cluster_name`. Reuses [`worker_selector_labels`] with an
/// empty group name stripped off, since the calculator only needs the
/// node-type discriminator, not the specific group.
fn is_worker_pod(labels: &std::collections::BTreeMap<String, String>, cluster_name: &str) -> bool {
    let worker_labels = worker_selector_labels(cluster_name, "");
    labels.get(crate::labels::RAY_NODE_TYPE_LABEL)
        == worker_labels.get(crate::labels::RAY_NODE_TYPE_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_worker_pod_matches_worker_node_type_label() {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert(crate::labels::RAY_NODE_TYPE_LABEL.to_string(), "worker".to_string());
        assert!(is_worker_pod(&labels, "c"));
    }

    #[test]
    fn is_worker_pod_rejects_head_node_type_label() {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert(crate::labels::RAY_NODE_TYPE_LABEL.to_string(), "head".to_string());
        assert!(!is_worker_pod(&labels, "c"));
    }
}
