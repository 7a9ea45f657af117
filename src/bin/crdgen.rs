// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator.
//!
//! Generates the `RayCluster` CRD YAML from the Rust type in `src/crd.rs`
//! so the manifest in `deploy/crds/` never drifts from the code.
//!
//! Usage:
//!   cargo run --bin crdgen

use std::fs;
use std::path::Path;

use kube::CustomResourceExt;
use raycluster_controller::crd::RayCluster;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY -- run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/crds");
    fs::create_dir_all(output_dir)?;

    println!("Generating CRD YAML from src/crd.rs...");
    generate_crd::<RayCluster>("rayclusters.crd.yaml", output_dir)?;
    println!("Successfully generated deploy/crds/rayclusters.crd.yaml");

    Ok(())
}

fn generate_crd<T>(filename: &str, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    T: CustomResourceExt,
{
    let crd = T::crd();
    let yaml = serde_yaml::to_string(&crd)?;
    let content = format!("{COPYRIGHT_HEADER}{yaml}");

    let output_path = output_dir.join(filename);
    fs::write(&output_path, content)?;

    println!("  wrote {filename}");
    Ok(())
}
