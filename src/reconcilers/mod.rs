// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the `RayCluster` custom resource.
//!
//! # Module structure
//!
//! - [`dependents`] -- ensure-singleton reconcilers for the head `Service`,
//!   the optional `Ingress`, and the optional autoscaler RBAC trio.
//! - [`pods`] -- the Pod Reconciler: head-pod singleton enforcement plus
//!   per-worker-group scale convergence.
//! - [`status`] -- the Status Updater, recomputing the four replica
//!   counters and writing the status subresource.
//! - [`raycluster`] -- the Top-level Reconciler, invoking the three above
//!   in a fixed order.

pub mod dependents;
pub mod pods;
pub mod raycluster;
pub mod status;

pub use raycluster::{reconcile, should_reconcile};
