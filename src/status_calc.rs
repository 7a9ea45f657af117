// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Replica Calculator: pure functions computing the worker-replica counters
//! written into `RayCluster.status`.

use k8s_openapi::api::core::v1::Pod;

use crate::crd::{RayClusterStatus, WorkerGroupSpec};

/// Computed replica counters for a `RayCluster`, before being compared
/// against the existing status to decide whether a write is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaCounts {
    /// Count of worker pods observed `Running` and ready.
    pub available: i32,
    /// Sum of `replicas` across all worker groups.
    pub desired: i32,
    /// Sum of each group's `minReplicas` (or `replicas` if unset).
    pub min: i32,
    /// Sum of each group's `maxReplicas` (or `replicas` if unset).
    pub max: i32,
}

/// Whether a pod counts as "available" for the replica calculator: its
/// phase is `Running` and its `Ready` condition is `True`.
#[must_use]
pub fn is_available(pod: &Pod) -> bool {
    let Some(status) = &pod.status else {
        return false;
    };
    if status.phase.as_deref() != Some("Running") {
        return false;
    }
    status
        .conditions
        .iter()
        .flatten()
        .any(|c| c.type_ == "Ready" && c.status == "True")
}

/// Compute desired/min/max/available replica counts for a cluster from its
/// worker group specs and the current set of worker pods across all
/// groups.
#[must_use]
pub fn compute_replica_counts(groups: &[WorkerGroupSpec], worker_pods: &[Pod]) -> ReplicaCounts {
    let available = worker_pods.iter().filter(|p| is_available(p)).count() as i32;

    let mut desired = 0;
    let mut min = 0;
    let mut max = 0;
    for group in groups {
        desired += group.replicas;
        min += group.min_replicas.unwrap_or(group.replicas);
        max += group.max_replicas.unwrap_or(group.replicas);
    }

    ReplicaCounts {
        available,
        desired,
        min,
        max,
    }
}

/// Whether `counts` differs from the existing status in at least one
/// counter. The status subresource is written only when this is `true`;
/// `lastUpdateTime` is updated unconditionally by the caller regardless of
/// this result.
#[must_use]
pub fn counts_changed(existing: &RayClusterStatus, counts: &ReplicaCounts) -> bool {
    existing.available_worker_replicas != counts.available
        || existing.desired_worker_replicas != counts.desired
        || existing.min_worker_replicas != counts.min
        || existing.max_worker_replicas != counts.max
}

#[cfg(test)]
#[path = "status_calc_tests.rs"]
mod status_calc_tests;
