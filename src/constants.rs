// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the RayCluster controller.
//!
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// Fully qualified API group/version for the `RayCluster` CRD, used to
/// stamp owner references without hand-duplicating the string that
/// `crd.rs`'s `#[kube(group = ..., version = ...)]` attribute declares.
pub const API_GROUP_VERSION: &str = "ray.firestoned.io/v1";

/// Kind name for the `RayCluster` resource
pub const KIND_RAY_CLUSTER: &str = "RayCluster";

// ============================================================================
// Node Role Values
// ============================================================================

/// Node type value identifying the head pod
pub const NODE_TYPE_HEAD: &str = "head";

/// Node type value identifying a worker pod
pub const NODE_TYPE_WORKER: &str = "worker";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Default requeue duration used after a reconcile error.
pub const DEFAULT_REQUEUE_DURATION_SECS: u64 = 2;

/// Requeue duration used after a non-transient error (e.g. `HeadNotHealthy`,
/// `InvalidName`) -- these only clear once a human intervenes, so there is
/// no point hammering the API server at the transient-error cadence.
pub const NON_TRANSIENT_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Naming Constants
// ============================================================================

/// Maximum length of a Kubernetes DNS label (RFC 1123).
pub const DNS_LABEL_MAX_LENGTH: usize = 63;

/// Suffix appended to head pod generated-name stems before letting the
/// platform append its own unique suffix.
pub const HEAD_NAME_COMPONENT: &str = "head";

/// Suffix appended to worker pod generated-name stems before letting the
/// platform append its own unique suffix.
pub const WORKER_NAME_COMPONENT: &str = "worker";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime.
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default reconcile concurrency (number of objects processed in parallel).
pub const DEFAULT_RECONCILE_CONCURRENCY: u16 = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for the Prometheus metrics HTTP server.
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for the Prometheus metrics endpoint.
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for the metrics HTTP server.
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";

// ============================================================================
// Field Manager
// ============================================================================

/// Field manager name used for server-side apply / create calls.
pub const FIELD_MANAGER: &str = "raycluster-controller";
