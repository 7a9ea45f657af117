// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Name Normalizer: derives DNS-label-safe `generateName` stems for pods
//! owned by a `RayCluster`, and sanitizes arbitrary strings (worker group
//! names, cluster names) into valid Kubernetes object-name components.
//!
//! Pods created by this controller never get a fixed `name`; they get a
//! `generateName` stem, and the platform appends a unique suffix. The stem
//! still has to be a valid (possibly truncated) DNS label so that whatever
//! suffix the platform appends still fits within the 63-character limit.

use crate::constants::{DNS_LABEL_MAX_LENGTH, HEAD_NAME_COMPONENT, WORKER_NAME_COMPONENT};
use crate::errors::Error;

/// Number of characters the platform reserves for the random suffix it
/// appends to a `generateName` stem (`-` plus 5 alphanumeric characters).
const GENERATED_SUFFIX_RESERVATION: usize = 6;

/// Sanitize an arbitrary string into a valid DNS label component: lowercase
/// ASCII alphanumerics and hyphens only, no leading/trailing hyphen.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] if the input contains no characters that
/// survive sanitization (i.e. normalizes to an empty string).
pub fn sanitize_component(raw: &str, kind: &str, cluster: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == '_' || ch.is_whitespace() {
            out.push('-');
        }
        // all other characters are dropped
    }

    let trimmed = out.trim_matches('-').to_string();
    let collapsed = collapse_hyphens(&trimmed);

    if collapsed.is_empty() {
        return Err(Error::InvalidName {
            kind: kind.to_string(),
            cluster: cluster.to_string(),
            reason: format!("input {raw:?} contains no valid DNS label characters"),
        });
    }

    Ok(collapsed)
}

fn collapse_hyphens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_hyphen = false;
    for ch in s.chars() {
        if ch == '-' {
            if !last_was_hyphen {
                out.push(ch);
            }
            last_was_hyphen = true;
        } else {
            out.push(ch);
            last_was_hyphen = false;
        }
    }
    out
}

/// Build the `generateName` stem for a `RayCluster`'s head pod.
///
/// Produces `<cluster>-head-`, truncated so the stem plus the platform's
/// generated suffix still fits within a 63-character DNS label.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] if `cluster` sanitizes to an empty
/// string.
pub fn head_pod_generate_name(cluster: &str) -> Result<String, Error> {
    generate_name_stem(cluster, HEAD_NAME_COMPONENT, "head pod", cluster)
}

/// Build the `generateName` stem for a worker pod in the given group.
///
/// Produces `<cluster>-worker-<group>-`, truncated so the stem plus the
/// platform's generated suffix still fits within a 63-character DNS label.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] if `cluster` or `group` sanitize to an
/// empty string.
pub fn worker_pod_generate_name(cluster: &str, group: &str) -> Result<String, Error> {
    let cluster_part = sanitize_component(cluster, "worker pod", cluster)?;
    let group_part = sanitize_component(group, "worker pod", cluster)?;
    let stem = format!("{cluster_part}-{WORKER_NAME_COMPONENT}-{group_part}");
    Ok(truncate_for_generate_name(&stem))
}

fn generate_name_stem(
    cluster: &str,
    component: &str,
    kind: &str,
    cluster_for_err: &str,
) -> Result<String, Error> {
    let cluster_part = sanitize_component(cluster, kind, cluster_for_err)?;
    let stem = format!("{cluster_part}-{component}");
    Ok(truncate_for_generate_name(&stem))
}

/// Truncate `stem` and append a trailing hyphen so that `stem + "-" +
/// <platform suffix>` fits within [`DNS_LABEL_MAX_LENGTH`], then hand the
/// result to the platform's `generateName` machinery.
fn truncate_for_generate_name(stem: &str) -> String {
    let budget = DNS_LABEL_MAX_LENGTH.saturating_sub(GENERATED_SUFFIX_RESERVATION);
    let truncated: String = stem.chars().take(budget).collect();
    let truncated = truncated.trim_end_matches('-');
    format!("{truncated}-")
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;
