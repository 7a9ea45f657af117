// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn zero_existing_creates() {
    assert_eq!(decide(0), SingletonAction::Create);
}

#[test]
fn one_existing_is_noop() {
    assert_eq!(decide(1), SingletonAction::NoOp);
}

#[test]
fn more_than_one_warns_without_mutating() {
    assert_eq!(decide(2), SingletonAction::WarnDuplicates);
    assert_eq!(decide(5), SingletonAction::WarnDuplicates);
}
