// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Event/Log Surface: emits Kubernetes `Event` objects alongside structured
//! log lines for every successful create/delete, and logs every watch
//! event the controller observes.

use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};

use crate::crd::RayCluster;

/// Build a [`Recorder`] that publishes events against `cluster`, reported
/// as coming from this controller.
#[must_use]
pub fn recorder_for(client: &Client, cluster: &RayCluster) -> Recorder {
    let reporter: Reporter = "raycluster-controller".to_owned().into();
    Recorder::new(client.clone(), reporter, cluster.object_ref(&()))
}

/// Publish a `Normal`/`Created` event for a successfully created dependent
/// object, and log the same fact with structured fields.
///
/// # Errors
///
/// Returns an error if the event could not be published to the API server.
pub async fn record_created(
    recorder: &Recorder,
    cluster_name: &str,
    namespace: &str,
    kind: &str,
    name: &str,
) -> Result<(), kube::Error> {
    tracing::info!(cluster = cluster_name, namespace, kind, name, "created");
    recorder
        .publish(Event {
            type_: EventType::Normal,
            reason: "Created".into(),
            note: Some(format!("Created {kind} {name}")),
            action: "Create".into(),
            secondary: None,
        })
        .await
}

/// Publish a `Normal`/`Deleted` event for a successfully deleted dependent
/// object, and log the same fact with structured fields.
///
/// # Errors
///
/// Returns an error if the event could not be published to the API server.
pub async fn record_deleted(
    recorder: &Recorder,
    cluster_name: &str,
    namespace: &str,
    kind: &str,
    name: &str,
) -> Result<(), kube::Error> {
    tracing::info!(cluster = cluster_name, namespace, kind, name, "deleted");
    recorder
        .publish(Event {
            type_: EventType::Normal,
            reason: "Deleted".into(),
            note: Some(format!("Deleted {kind} {name}")),
            action: "Delete".into(),
            secondary: None,
        })
        .await
}

/// Log a reconciliation error with the structured fields the design calls
/// for: cluster, namespace, error kind, and (when applicable) object name.
pub fn log_error(cluster_name: &str, namespace: &str, err: &crate::errors::Error, name: Option<&str>) {
    tracing::error!(
        cluster = cluster_name,
        namespace,
        kind = err.kind_str(),
        name = name.unwrap_or(""),
        error = %err,
        "reconcile error"
    );
}
