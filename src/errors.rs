// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Structured error types for the RayCluster controller.
//!
//! Every variant maps onto one of the error kinds described in the
//! reconciliation design: transient platform errors, terminal naming
//! errors, and the "head pod requires human diagnosis" case. `is_transient`
//! and `requeue_after` let the top-level reconciler and the `kube::runtime`
//! error policy decide how to react without matching on variants directly.

use std::time::Duration;

use crate::constants::DEFAULT_REQUEUE_DURATION_SECS;

/// Errors that can occur while reconciling a `RayCluster`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Kubernetes API returned an error that isn't specifically handled
    /// below (network errors, forbidden, internal server error, etc).
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The resource is missing a required field (e.g. `metadata.name`).
    #[error("RayCluster is missing required field: {0}")]
    MissingField(String),

    /// A generated object name could not be turned into a valid DNS label.
    #[error("could not derive a valid name for {kind} from cluster {cluster}: {reason}")]
    InvalidName {
        /// Kind of the object whose name could not be derived (e.g. "head pod").
        kind: String,
        /// Name of the owning `RayCluster`.
        cluster: String,
        /// Human-readable reason the name was rejected.
        reason: String,
    },

    /// Exactly one head pod exists but it is neither `Running` nor `Pending`.
    ///
    /// The controller never recreates a failed head pod automatically --
    /// this requires a human to diagnose and delete it.
    #[error("head pod {name} for cluster {cluster} is unhealthy (phase={phase}); will not auto-recreate")]
    HeadNotHealthy {
        /// Name of the owning `RayCluster`.
        cluster: String,
        /// Name of the unhealthy head pod.
        name: String,
        /// Observed pod phase.
        phase: String,
    },

    /// A create raced with a pod that is already terminating; the caller
    /// should requeue rather than treat this as `AlreadyExists`-tolerated.
    #[error("conflicting {kind} {name} for cluster {cluster} is terminating, requeueing")]
    ConflictingObjectTerminating {
        /// Kind of the conflicting object.
        kind: String,
        /// Name of the conflicting object.
        name: String,
        /// Name of the owning `RayCluster`.
        cluster: String,
    },

    /// Serialization of a generated object failed.
    #[error("failed to serialize object: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether a retry with the default backoff is appropriate for this
    /// error. `false` means the caller has already decided the action to
    /// take (e.g. a terminal naming failure still requeues, but
    /// callers that want to distinguish "will eventually succeed" from
    /// "stuck until a human intervenes" can consult this).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Kube(_) | Error::ConflictingObjectTerminating { .. }
        )
    }

    /// The duration the controller should wait before retrying after this
    /// error. All current error kinds use the same default requeue
    /// duration; this indirection exists so a future error kind can opt
    /// into a different backoff without touching call sites.
    #[must_use]
    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(DEFAULT_REQUEUE_DURATION_SECS)
    }

    /// Structured identifier for this error kind, used as the `kind` field
    /// in error log lines.
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        match self {
            Error::Kube(_) => "platform",
            Error::MissingField(_) => "missing_field",
            Error::InvalidName { .. } => "invalid_name",
            Error::HeadNotHealthy { .. } => "head_not_healthy",
            Error::ConflictingObjectTerminating { .. } => "conflicting_object_terminating",
            Error::Serialization(_) => "serialization",
        }
    }
}

/// Whether a `kube::Error` represents a 404 Not Found response.
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(
        err,
        kube::Error::Api(resp) if resp.code == 404
    )
}

/// Whether a `kube::Error` represents a 409 Conflict / AlreadyExists response.
#[must_use]
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(
        err,
        kube::Error::Api(resp) if resp.code == 409
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_not_healthy_is_not_transient() {
        let err = Error::HeadNotHealthy {
            cluster: "c".into(),
            name: "c-head-abcde".into(),
            phase: "Failed".into(),
        };
        assert!(!err.is_transient());
        assert_eq!(err.kind_str(), "head_not_healthy");
    }

    #[test]
    fn conflicting_object_terminating_is_transient() {
        let err = Error::ConflictingObjectTerminating {
            kind: "Pod".into(),
            name: "c-head-abcde".into(),
            cluster: "c".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn requeue_after_uses_default_duration() {
        let err = Error::MissingField("metadata.name".into());
        assert_eq!(err.requeue_after(), Duration::from_secs(2));
    }
}
