// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! This module defines standard Kubernetes labels and controller-specific
//! labels to ensure consistency across all resources created for a
//! `RayCluster`.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool managing this object.
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application.
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for a unique name identifying the instance of an application.
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Value for `app.kubernetes.io/managed-by` on every resource this controller owns.
pub const MANAGED_BY_RAY_CLUSTER: &str = "raycluster-controller";

/// Value for `app.kubernetes.io/name` on every resource this controller owns.
pub const APP_NAME_RAY: &str = "kuberay";

// ============================================================================
// RayCluster-Specific Labels
// ============================================================================

/// Label identifying which `RayCluster` a dependent object belongs to.
pub const RAY_CLUSTER_LABEL: &str = "ray.firestoned.io/cluster";

/// Label identifying the node's role: `head` or `worker`.
pub const RAY_NODE_TYPE_LABEL: &str = "ray.firestoned.io/node-type";

/// Label identifying which worker group a worker pod belongs to.
pub const RAY_NODE_GROUP_LABEL: &str = "ray.firestoned.io/group";
