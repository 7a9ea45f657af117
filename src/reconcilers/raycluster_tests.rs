// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn should_reconcile_on_first_pass_with_no_observed_generation() {
    assert!(should_reconcile(Some(1), None));
}

#[test]
fn should_reconcile_when_generation_changed() {
    assert!(should_reconcile(Some(2), Some(1)));
}

#[test]
fn should_not_reconcile_when_generation_unchanged() {
    assert!(!should_reconcile(Some(2), Some(2)));
}

#[test]
fn should_not_reconcile_without_generation_tracking() {
    assert!(!should_reconcile(None, None));
    assert!(!should_reconcile(None, Some(1)));
}
