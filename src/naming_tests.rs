// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn sanitize_component_lowercases_and_strips_invalid_chars() {
    let out = sanitize_component("My_Cluster Name!!", "head pod", "My_Cluster Name!!").unwrap();
    assert_eq!(out, "my-cluster-name");
}

#[test]
fn sanitize_component_collapses_repeated_separators() {
    let out = sanitize_component("foo___bar   baz", "head pod", "x").unwrap();
    assert_eq!(out, "foo-bar-baz");
}

#[test]
fn sanitize_component_trims_leading_and_trailing_hyphens() {
    let out = sanitize_component("--foo--", "head pod", "x").unwrap();
    assert_eq!(out, "foo");
}

#[test]
fn sanitize_component_rejects_empty_result() {
    let err = sanitize_component("!!!___", "head pod", "mycluster").unwrap_err();
    match err {
        Error::InvalidName { kind, cluster, .. } => {
            assert_eq!(kind, "head pod");
            assert_eq!(cluster, "mycluster");
        }
        other => panic!("expected InvalidName, got {other:?}"),
    }
}

#[test]
fn head_pod_generate_name_has_expected_shape() {
    let name = head_pod_generate_name("my-cluster").unwrap();
    assert_eq!(name, "my-cluster-head-");
}

#[test]
fn worker_pod_generate_name_has_expected_shape() {
    let name = worker_pod_generate_name("my-cluster", "cpu-group").unwrap();
    assert_eq!(name, "my-cluster-worker-cpu-group-");
}

#[test]
fn worker_pod_generate_name_truncates_long_inputs() {
    let long_cluster = "a".repeat(40);
    let long_group = "b".repeat(40);
    let name = worker_pod_generate_name(&long_cluster, &long_group).unwrap();
    assert!(name.len() <= DNS_LABEL_MAX_LENGTH);
    assert!(name.ends_with('-'));
}

#[test]
fn generate_name_never_ends_with_double_hyphen() {
    let name = head_pod_generate_name(&"x".repeat(62)).unwrap();
    assert!(!name.ends_with("--"));
}
