#![allow(unused)]

use std::path::PathBuf;

pub fn valid_profile_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/valid_profile.json")
}

pub fn broken_profile_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/broken_profile.json")
}
