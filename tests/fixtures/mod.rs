//! Shared test fixtures
//!
//! - `mcus.json`: a three-target configuration (git, archive, and no SDK)

#![allow(dead_code)]

use mcu_ci::config::{self, MatrixConfig};
use std::path::{Path, PathBuf};

/// Path to the sample configuration document
pub fn mcus_json_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mcus.json")
}

/// Load the sample configuration document
pub fn load_mcus_json() -> MatrixConfig {
    config::load_file(&mcus_json_path()).expect("fixture mcus.json should parse")
}
