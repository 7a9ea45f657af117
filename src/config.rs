// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration: the three knobs described in the external
//! interfaces design (reconcile concurrency, default requeue duration,
//! and the `PrioritizeWorkersToDelete` compatibility flag), resolved once
//! at startup from CLI flags with environment variable fallbacks.

use std::time::Duration;

use clap::Parser;

use crate::constants::{DEFAULT_RECONCILE_CONCURRENCY, DEFAULT_REQUEUE_DURATION_SECS};

/// Command-line flags for the `RayCluster` controller.
#[derive(Debug, Parser)]
#[command(name = "raycluster-controller", about = "RayCluster cluster-lifecycle controller")]
pub struct Cli {
    /// Number of `RayCluster` objects the controller reconciles in parallel.
    #[arg(long, env = "RAYCLUSTER_RECONCILE_CONCURRENCY")]
    pub reconcile_concurrency: Option<u16>,

    /// Seconds to wait before retrying after a reconcile error.
    #[arg(long, env = "RAYCLUSTER_DEFAULT_REQUEUE_DURATION_SECS")]
    pub default_requeue_duration_secs: Option<u64>,

    /// Backwards-compatible scale-down ordering: delete every pruned
    /// `workersToDelete` victim immediately and fold the deletion count
    /// into the scale-down diff, instead of computing final actions first.
    #[arg(long, env = "RAYCLUSTER_PRIORITIZE_WORKERS_TO_DELETE")]
    pub prioritize_workers_to_delete: bool,
}

/// Resolved, immutable controller configuration. Built once in `main` and
/// handed to the reconciler via [`crate::context::Context`] -- never read
/// from a package-level static.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Number of `RayCluster` objects reconciled in parallel.
    pub reconcile_concurrency: u16,

    /// Duration to wait before retrying after a reconcile error.
    pub default_requeue_duration: Duration,

    /// Whether to fold `workersToDelete` deletions into the scale-down
    /// diff before computing the final scale action (legacy ordering).
    pub prioritize_workers_to_delete: bool,
}

impl From<Cli> for ControllerConfig {
    fn from(cli: Cli) -> Self {
        ControllerConfig {
            reconcile_concurrency: cli
                .reconcile_concurrency
                .unwrap_or(DEFAULT_RECONCILE_CONCURRENCY),
            default_requeue_duration: Duration::from_secs(
                cli.default_requeue_duration_secs
                    .unwrap_or(DEFAULT_REQUEUE_DURATION_SECS),
            ),
            prioritize_workers_to_delete: cli.prioritize_workers_to_delete,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            reconcile_concurrency: DEFAULT_RECONCILE_CONCURRENCY,
            default_requeue_duration: Duration::from_secs(DEFAULT_REQUEUE_DURATION_SECS),
            prioritize_workers_to_delete: false,
        }
    }
}
