// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `RayCluster` custom resource definition.
//!
//! A `RayCluster` describes a head node and zero or more worker groups that
//! together form a single Ray cluster. The controller reconciles this
//! resource into a head pod, one pod per desired worker replica, and a
//! small set of supporting objects (head `Service`, optional `Ingress`,
//! and an optional autoscaler `ServiceAccount`/`Role`/`RoleBinding` trio).

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-worker-group scale-down hints.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleStrategy {
    /// Names of worker pods the user has explicitly requested be removed
    /// on the next scale-down, honored ahead of any other victim choice.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workers_to_delete: Vec<String>,
}

/// Specification for the singleton head group.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeadGroupSpec {
    /// Service type hint for the head `Service` (defaults to `ClusterIP`
    /// when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,

    /// Whether an `Ingress` fronting the head service should be created.
    #[serde(default)]
    pub enable_ingress: bool,

    /// `ray start` parameters specific to the head node.
    #[serde(default)]
    pub ray_start_params: BTreeMap<String, String>,

    /// Pod template used to build the head pod.
    pub template: PodTemplateSpec,
}

/// Specification for a single worker group.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerGroupSpec {
    /// Name of this worker group, unique within the cluster.
    pub group_name: String,

    /// Desired number of running worker pods in this group.
    pub replicas: i32,

    /// Lower bound used by the replica calculator's min-replica sum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,

    /// Upper bound used by the replica calculator's max-replica sum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<i32>,

    /// `ray start` parameters specific to this worker group.
    #[serde(default)]
    pub ray_start_params: BTreeMap<String, String>,

    /// Pod template used to build worker pods in this group.
    pub template: PodTemplateSpec,

    /// Scale-down hints for this group.
    #[serde(default)]
    pub scale_strategy: ScaleStrategy,
}

/// `RayCluster` describes a head node and worker groups that together form
/// one Ray cluster. The controller creates and maintains a head pod, one
/// pod per desired worker replica, and the head's supporting `Service`,
/// optional `Ingress`, and optional autoscaler RBAC objects.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ray.firestoned.io",
    version = "v1",
    kind = "RayCluster",
    namespaced,
    shortname = "rc",
    shortname = "rcs",
    doc = "RayCluster defines a head node plus worker groups that together form a single Ray cluster, reconciled into a head pod, per-group worker pods, and supporting service/ingress/RBAC objects.",
    printcolumn = r#"{"name":"Desired","type":"integer","jsonPath":".status.desiredWorkerReplicas"}"#,
    printcolumn = r#"{"name":"Available","type":"integer","jsonPath":".status.availableWorkerReplicas"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "RayClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct RayClusterSpec {
    /// Specification for the singleton head node.
    pub head_group_spec: HeadGroupSpec,

    /// Specifications for each worker group.
    #[serde(default)]
    pub worker_group_specs: Vec<WorkerGroupSpec>,

    /// Whether the in-tree autoscaler RBAC trio (`ServiceAccount`, `Role`,
    /// `RoleBinding`) should be reconciled for this cluster.
    #[serde(default)]
    pub enable_in_tree_autoscaling: bool,
}

/// Observed status of a `RayCluster`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RayClusterStatus {
    /// Number of worker pods observed `Running` and ready.
    #[serde(default)]
    pub available_worker_replicas: i32,

    /// Sum of `spec.workerGroupSpecs[].replicas` across all groups.
    #[serde(default)]
    pub desired_worker_replicas: i32,

    /// Sum of each group's `minReplicas` (or `replicas` if unset).
    #[serde(default)]
    pub min_worker_replicas: i32,

    /// Sum of each group's `maxReplicas` (or `replicas` if unset).
    #[serde(default)]
    pub max_worker_replicas: i32,

    /// RFC3339 timestamp of the last status write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,

    /// `metadata.generation` observed by the last completed reconcile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}
