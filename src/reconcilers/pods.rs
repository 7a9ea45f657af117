// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pod Reconciler: the controller's core. Two phases per reconcile pass:
//!
//! - Phase A enforces the head-pod singleton invariant.
//! - Phase B converges each worker group's live pod count toward its
//!   desired replica count, honoring `scaleStrategy.workersToDelete` and
//!   the `PrioritizeWorkersToDelete` compatibility flag.
//!
//! Both phases are split into a pure decision function (`plan_head_action`,
//! `plan_worker_scale`) and a thin async executor that carries out the
//! plan against the Kubernetes API. The pure functions hold every
//! testable invariant from the design; the executors only translate a
//! plan into `list`/`create`/`delete` calls.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info, warn};

use crate::builders::{self, head_selector_labels, worker_selector_labels};
use crate::crd::{RayCluster, WorkerGroupSpec};
use crate::errors::{is_already_exists, is_not_found, Error};
use crate::events;
use crate::metrics;

/// Minimal view of a pod used by the head-singleton planner: just enough
/// to decide liveness and which pod to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    /// Pod name.
    pub name: String,
    /// Observed pod phase (e.g. `"Running"`, `"Pending"`, `"Failed"`).
    pub phase: String,
    /// Whether the pod has a `deletionTimestamp` set.
    pub terminating: bool,
}

/// Whether a pod phase counts as "live" for singleton/convergence
/// purposes: `Running` or `Pending`.
#[must_use]
pub fn is_live_phase(phase: &str) -> bool {
    phase == "Running" || phase == "Pending"
}

/// Decision produced by the head-pod singleton planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadAction {
    /// No head pod exists: create one.
    Create,
    /// Exactly one head pod exists and it is live: nothing to do.
    Accept,
    /// Exactly one head pod exists and it is not live: this is a terminal
    /// condition from the controller's point of view -- it never
    /// recreates a failed head pod automatically.
    Unhealthy {
        /// Name of the unhealthy head pod.
        name: String,
        /// Observed phase of the unhealthy head pod.
        phase: String,
    },
    /// More than one head pod exists: keep one survivor, delete the rest.
    RetainAndDelete {
        /// Name of the pod retained as the singleton head.
        survivor: String,
        /// Names of the extra head pods to delete.
        victims: Vec<String>,
    },
}

/// Decide the head-pod singleton action from the current set of head pods,
/// in API scan order.
///
/// When more than one pod exists, the survivor is the first pod in scan
/// order whose phase is live (`Running`/`Pending`); if none are live, the
/// first pod in scan order is kept regardless, since the controller must
/// always retain exactly one candidate.
#[must_use]
pub fn plan_head_action(pods: &[PodInfo]) -> HeadAction {
    match pods.len() {
        0 => HeadAction::Create,
        1 => {
            let pod = &pods[0];
            if is_live_phase(&pod.phase) {
                HeadAction::Accept
            } else {
                HeadAction::Unhealthy {
                    name: pod.name.clone(),
                    phase: pod.phase.clone(),
                }
            }
        }
        _ => {
            let survivor_index = pods
                .iter()
                .position(|p| is_live_phase(&p.phase))
                .unwrap_or(0);
            let survivor = pods[survivor_index].name.clone();
            let victims = pods
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != survivor_index)
                .map(|(_, p)| p.name.clone())
                .collect();
            HeadAction::RetainAndDelete { survivor, victims }
        }
    }
}

/// Result of the worker-group convergence planner: how many new pods to
/// create and which existing pods to delete, in the order they should be
/// deleted (named victims before any overflow eviction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerScalePlan {
    /// Number of new worker pods to create.
    pub create_count: i32,
    /// Names of worker pods to delete.
    pub delete_names: Vec<String>,
}

/// Plan the scale action for one worker group.
///
/// `running` is the set of live worker pod names in this group (phase
/// `Running`/`Pending`, no `deletionTimestamp`), in API scan order.
/// `workers_to_delete` is the group's `scaleStrategy.workersToDelete`
/// list, already pruned by the caller to names present in `running`.
///
/// When `prioritize` is set, every pruned victim is deleted immediately
/// and folded into the scale-down diff before the final action is
/// computed (the legacy ordering kept for backwards compatibility); when
/// unset, the diff and the named-victim list are both evaluated against
/// the original `running` set with no bias toward `workers_to_delete`
/// beyond what the final-action rules below already give it.
///
/// Every pruned named victim is deleted regardless of `diff`'s sign --
/// a pod named in `workers_to_delete` is honored even while the group is
/// simultaneously scaling up or already at its desired count, since
/// nothing else ever re-triggers its deletion once it's been pruned down
/// to "present but unwanted" by the caller.
///
/// Final action rules, given `diff = desired - running.len()`:
/// - `diff > 0`: create `diff` new pods, and delete the named victims.
/// - `diff == 0`: delete the named victims, no create.
/// - `diff < 0` and `|diff| == workers_to_delete.len()`: delete exactly
///   the named victims.
/// - `diff < 0` and `|diff| != workers_to_delete.len()` (including an
///   empty `workers_to_delete`): delete all named victims first, then
///   delete `|diff| - workers_to_delete.len()` additional pods chosen
///   from `running` minus the named victims, in first-encountered order.
#[must_use]
pub fn plan_worker_scale(
    desired: i32,
    running: &[String],
    workers_to_delete: &[String],
    prioritize: bool,
) -> WorkerScalePlan {
    let pruned: Vec<String> = workers_to_delete
        .iter()
        .filter(|name| running.contains(name))
        .cloned()
        .collect();

    if prioritize {
        let remaining: Vec<String> = running
            .iter()
            .filter(|name| !pruned.contains(name))
            .cloned()
            .collect();
        let diff = desired - running.len() as i32 + pruned.len() as i32;
        finalize_plan(diff, desired, remaining.len() as i32, &[], &remaining, pruned)
    } else {
        finalize_plan(
            desired - running.len() as i32,
            desired,
            running.len() as i32,
            &pruned,
            running,
            Vec::new(),
        )
    }
}

/// Compute the final create/delete action given `diff`, the named
/// victims still to be considered (`named_victims`), the pool to draw
/// arbitrary overflow evictions from (`pool`), and any deletions already
/// decided before this call (`already_deciding`, e.g. the immediate
/// `PrioritizeWorkersToDelete` deletions).
fn finalize_plan(
    diff: i32,
    _desired: i32,
    _live_count: i32,
    named_victims: &[String],
    pool: &[String],
    mut already_deciding: Vec<String>,
) -> WorkerScalePlan {
    if diff > 0 {
        already_deciding.extend(named_victims.iter().cloned());
        return WorkerScalePlan {
            create_count: diff,
            delete_names: already_deciding,
        };
    }
    if diff == 0 {
        already_deciding.extend(named_victims.iter().cloned());
        return WorkerScalePlan {
            create_count: 0,
            delete_names: already_deciding,
        };
    }

    let abs_diff = usize::try_from(-diff).unwrap_or(0);
    if abs_diff == named_victims.len() {
        already_deciding.extend(named_victims.iter().cloned());
        return WorkerScalePlan {
            create_count: 0,
            delete_names: already_deciding,
        };
    }

    already_deciding.extend(named_victims.iter().cloned());
    let additional_count = abs_diff.saturating_sub(named_victims.len());
    let overflow_pool: Vec<&String> = pool.iter().filter(|n| !named_victims.contains(n)).collect();
    already_deciding.extend(overflow_pool.into_iter().take(additional_count).cloned());

    WorkerScalePlan {
        create_count: 0,
        delete_names: already_deciding,
    }
}

// ============================================================================
// Async execution against the Kubernetes API
// ============================================================================

fn pod_to_info(pod: &Pod) -> PodInfo {
    let phase = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_default();
    let terminating = pod.metadata.deletion_timestamp.is_some();
    PodInfo {
        name: pod.name_any(),
        phase,
        terminating,
    }
}

/// Run Phase A: reconcile the singleton head pod.
///
/// # Errors
///
/// Returns [`Error::HeadNotHealthy`] if the single existing head pod is
/// not live (no auto-recreation is attempted). Returns
/// [`Error::ConflictingObjectTerminating`] if a create races with a head
/// pod that is already terminating. Returns [`Error::Kube`] for any other
/// platform failure.
pub async fn reconcile_head_pod(client: &Client, cluster: &RayCluster) -> Result<(), Error> {
    let namespace = cluster.namespace().unwrap_or_default();
    let cluster_name = cluster.name_any();
    let api: Api<Pod> = Api::namespaced(client.clone(), &namespace);

    let labels = head_selector_labels(&cluster_name);
    let selector = labels_to_selector(&labels);
    let existing = api.list(&ListParams::default().labels(&selector)).await?;
    let infos: Vec<PodInfo> = existing.items.iter().map(pod_to_info).collect();

    match plan_head_action(&infos) {
        HeadAction::Create => {
            let pod = builders::build_head_pod(cluster, &cluster.spec.head_group_spec)?;
            match api.create(&PostParams::default(), &pod).await {
                Ok(created) => {
                    let name = created.name_any();
                    info!(cluster = %cluster_name, namespace = %namespace, name = %name, "created head pod");
                    metrics::record_resource_created("Pod");
                    let recorder = events::recorder_for(client, cluster);
                    if let Err(e) = events::record_created(&recorder, &cluster_name, &namespace, "Pod", &name).await {
                        warn!(cluster = %cluster_name, namespace = %namespace, name = %name, error = %e, "failed to publish event");
                    }
                    Ok(())
                }
                Err(e) if is_already_exists(&e) => {
                    // Re-list to see whether the conflicting pod is terminating.
                    let refreshed = api.list(&ListParams::default().labels(&selector)).await?;
                    if refreshed.items.iter().any(|p| p.metadata.deletion_timestamp.is_some()) {
                        Err(Error::ConflictingObjectTerminating {
                            kind: "Pod".to_string(),
                            name: "head".to_string(),
                            cluster: cluster_name,
                        })
                    } else {
                        Ok(())
                    }
                }
                Err(e) => Err(Error::from(e)),
            }
        }
        HeadAction::Accept => {
            debug!(cluster = %cluster_name, namespace = %namespace, "head pod healthy");
            Ok(())
        }
        HeadAction::Unhealthy { name, phase } => Err(Error::HeadNotHealthy {
            cluster: cluster_name,
            name,
            phase,
        }),
        HeadAction::RetainAndDelete { survivor, victims } => {
            info!(
                cluster = %cluster_name,
                namespace = %namespace,
                survivor = %survivor,
                victim_count = victims.len(),
                "duplicate head pods detected, retaining one survivor"
            );
            for victim in victims {
                delete_pod(client, cluster, &api, &victim, &cluster_name, &namespace).await?;
            }
            Ok(())
        }
    }
}

/// Run Phase B for a single worker group: list its live pods, plan the
/// scale action, then create/delete to converge.
///
/// # Errors
///
/// Returns [`Error::Kube`] if a list/create/delete call fails. A `NotFound`
/// on delete is treated as success (idempotent); an `AlreadyExists` on
/// create is tolerated unless the conflicting pod is terminating.
pub async fn reconcile_worker_group(
    client: &Client,
    cluster: &RayCluster,
    group: &WorkerGroupSpec,
    prioritize_workers_to_delete: bool,
) -> Result<(), Error> {
    let namespace = cluster.namespace().unwrap_or_default();
    let cluster_name = cluster.name_any();
    let api: Api<Pod> = Api::namespaced(client.clone(), &namespace);

    let labels = worker_selector_labels(&cluster_name, &group.group_name);
    let selector = labels_to_selector(&labels);
    let existing = api.list(&ListParams::default().labels(&selector)).await?;

    let running: Vec<String> = existing
        .items
        .iter()
        .map(pod_to_info)
        .filter(|p| is_live_phase(&p.phase) && !p.terminating)
        .map(|p| p.name)
        .collect();

    let plan = plan_worker_scale(
        group.replicas,
        &running,
        &group.scale_strategy.workers_to_delete,
        prioritize_workers_to_delete,
    );

    for name in &plan.delete_names {
        delete_pod(client, cluster, &api, name, &cluster_name, &namespace).await?;
    }

    for _ in 0..plan.create_count {
        let pod = builders::build_worker_pod(cluster, group)?;
        match api.create(&PostParams::default(), &pod).await {
            Ok(created) => {
                let name = created.name_any();
                info!(
                    cluster = %cluster_name,
                    namespace = %namespace,
                    group = %group.group_name,
                    name = %name,
                    "created worker pod"
                );
                metrics::record_resource_created("Pod");
                let recorder = events::recorder_for(client, cluster);
                if let Err(e) = events::record_created(&recorder, &cluster_name, &namespace, "Pod", &name).await {
                    warn!(cluster = %cluster_name, namespace = %namespace, name = %name, error = %e, "failed to publish event");
                }
            }
            Err(e) if is_already_exists(&e) => {
                debug!(
                    cluster = %cluster_name,
                    namespace = %namespace,
                    group = %group.group_name,
                    "worker pod create raced with an existing pod, treating as success"
                );
            }
            Err(e) => return Err(Error::from(e)),
        }
    }

    Ok(())
}

async fn delete_pod(
    client: &Client,
    cluster: &RayCluster,
    api: &Api<Pod>,
    name: &str,
    cluster_name: &str,
    namespace: &str,
) -> Result<(), Error> {
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            info!(cluster = cluster_name, namespace, name, "deleted pod");
            metrics::record_resource_deleted("Pod");
            let recorder = events::recorder_for(client, cluster);
            if let Err(e) = events::record_deleted(&recorder, cluster_name, namespace, "Pod", name).await {
                warn!(cluster = cluster_name, namespace, name, error = %e, "failed to publish event");
            }
            Ok(())
        }
        Err(e) if is_not_found(&e) => {
            debug!(cluster = cluster_name, namespace, name, "pod already gone");
            Ok(())
        }
        Err(e) => Err(Error::from(e)),
    }
}

fn labels_to_selector(labels: &std::collections::BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[path = "pods_tests.rs"]
mod pods_tests;
