// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Watch Wiring: binds the `RayCluster` reconciler to `kube::runtime`'s
//! informer/queue machinery. Owner-scoped enqueue on pods and services
//! (`.owns(...)`) means an out-of-band pod delete or a service edit
//! re-triggers a reconcile for the owning cluster without any extra
//! bookkeeping on our side. Concurrency is bounded by
//! `ControllerConfig::reconcile_concurrency` via `for_each_concurrent`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::runtime::{controller::Action, watcher, Controller};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, error, info, warn};

use raycluster_controller::config::{Cli, ControllerConfig};
use raycluster_controller::constants::{
    KIND_RAY_CLUSTER, METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH, METRICS_SERVER_PORT,
    NON_TRANSIENT_REQUEUE_DURATION_SECS, TOKIO_WORKER_THREADS,
};
use raycluster_controller::context::{Context, Metrics};
use raycluster_controller::crd::RayCluster;
use raycluster_controller::metrics;
use raycluster_controller::reconcilers;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] raycluster_controller::errors::Error);

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("raycluster-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize `tracing` logging.
///
/// `RUST_LOG` controls the filter level (default `info`); `RUST_LOG_FORMAT`
/// picks between compact text (default) and `json` output.
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .compact()
                .init();
        }
    }

    info!("Starting RayCluster controller");
}

/// Start the Prometheus metrics HTTP server in the background.
fn start_metrics_server() -> tokio::task::JoinHandle<()> {
    info!(
        bind_address = METRICS_SERVER_BIND_ADDRESS,
        port = METRICS_SERVER_PORT,
        path = METRICS_SERVER_PATH,
        "starting Prometheus metrics HTTP server"
    );

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(text) => text,
                Err(e) => {
                    error!("failed to gather metrics: {e}");
                    String::from("# error gathering metrics\n")
                }
            }
        }

        let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));
        let bind_addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");

        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("metrics server listening on http://{bind_addr}{METRICS_SERVER_PATH}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("metrics server error: {e}");
        }
    })
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let cli = Cli::parse();
    let config = Arc::new(ControllerConfig::from(cli));
    info!(
        reconcile_concurrency = config.reconcile_concurrency,
        default_requeue_secs = config.default_requeue_duration.as_secs(),
        prioritize_workers_to_delete = config.prioritize_workers_to_delete,
        "resolved controller configuration"
    );

    let client = Client::try_default().await?;
    let _metrics_handle = start_metrics_server();

    let context = Arc::new(Context {
        client: client.clone(),
        config: config.clone(),
        metrics: Metrics::default(),
    });

    run_controller(context, config.reconcile_concurrency).await
}

/// Wire up and run the `RayCluster` controller: watches `RayCluster`
/// directly and its owned `Pod`/`Service` children, so an out-of-band pod
/// deletion or service edit re-triggers a reconcile without polling.
async fn run_controller(context: Arc<Context>, reconcile_concurrency: u16) -> Result<()> {
    let client = context.client.clone();
    let clusters: Api<RayCluster> = Api::all(client.clone());
    let pods: Api<Pod> = Api::all(client.clone());
    let services: Api<Service> = Api::all(client.clone());

    info!("starting RayCluster controller");

    Controller::new(clusters, watcher::Config::default())
        .owns(pods, watcher::Config::default())
        .owns(services, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile_wrapper, error_policy, context)
        .for_each_concurrent(Some(usize::from(reconcile_concurrency)), |result| async move {
            match result {
                Ok((obj_ref, action)) => {
                    debug!(?obj_ref, ?action, "reconcile completed");
                }
                Err(e) => {
                    warn!(error = %e, "reconcile stream error");
                }
            }
        })
        .await;

    info!("RayCluster controller stopped");
    Ok(())
}

/// Reconcile wrapper: times the pass, records metrics, and translates
/// success/error into the `Action` the `kube::runtime` scheduler expects.
async fn reconcile_wrapper(cluster: Arc<RayCluster>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let cluster_name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_default();

    debug!(cluster = %cluster_name, namespace = %namespace, "reconcile wrapper invoked");

    let result = reconcilers::reconcile(&ctx.client, &ctx.config, &cluster).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            info!(cluster = %cluster_name, namespace = %namespace, "reconciled RayCluster");
            metrics::record_reconciliation_success(duration);
            Ok(Action::requeue(ctx.config.default_requeue_duration))
        }
        Err(err) => {
            raycluster_controller::events::log_error(&cluster_name, &namespace, &err, None);
            metrics::record_reconciliation_error(duration);
            metrics::record_error(err.kind_str());
            Err(ReconcileError::from(err))
        }
    }
}

/// Error policy: every reconcile error requeues, but how soon depends on
/// whether [`Error::is_transient`] thinks a retry can plausibly help.
/// Transient platform errors use the error's own (short) backoff; a
/// non-transient error like `HeadNotHealthy` or `InvalidName` only clears
/// once a human intervenes, so it backs off to
/// [`NON_TRANSIENT_REQUEUE_DURATION_SECS`] instead of retrying at the
/// transient cadence forever.
///
/// [`Error::is_transient`]: raycluster_controller::errors::Error::is_transient
fn error_policy(cluster: Arc<RayCluster>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    error!(
        cluster = %cluster.name_any(),
        namespace = %cluster.namespace().unwrap_or_default(),
        error = %err,
        "reconcile failed, requeueing"
    );

    if err.0.is_transient() {
        Action::requeue(err.0.requeue_after())
    } else {
        Action::requeue(Duration::from_secs(NON_TRANSIENT_REQUEUE_DURATION_SECS))
    }
}

#[cfg(test)]
mod main_tests {
    use super::*;

    #[test]
    fn metrics_server_constants_form_a_valid_bind_address() {
        let addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
        assert!(addr.parse::<std::net::SocketAddr>().is_ok());
    }

    #[test]
    fn kind_constant_matches_the_crd() {
        assert_eq!(KIND_RAY_CLUSTER, "RayCluster");
    }
}
