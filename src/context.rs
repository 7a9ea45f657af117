// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context passed to the `RayCluster` controller.
//!
//! Unlike the multi-CRD reflector-store pattern used elsewhere in this
//! codebase's lineage, a `RayCluster`'s dependent objects are always
//! looked up scoped to one cluster at a time (by label or by name within
//! its namespace), so no cross-cluster reflector store is needed here --
//! every lookup is a direct, narrowly-scoped API list.

use std::sync::Arc;

use kube::Client;

use crate::config::ControllerConfig;

/// Shared context passed to the controller's reconcile function.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations.
    pub client: Client,

    /// Immutable configuration resolved once at startup. Carried here
    /// rather than as package-level statics, per the controller's
    /// no-global-mutable-state design.
    pub config: Arc<ControllerConfig>,

    /// Metrics handles for observability.
    pub metrics: Metrics,
}

/// Placeholder for future per-context metrics state. Metric series
/// themselves are process-wide `LazyLock` statics in [`crate::metrics`];
/// this struct exists so per-context metric configuration (e.g. extra
/// labels) has somewhere to live without touching every call site.
#[derive(Clone, Default)]
pub struct Metrics;
