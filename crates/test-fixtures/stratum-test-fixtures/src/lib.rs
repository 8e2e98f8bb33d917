//! Manifest-driven access to the shared JSON fixtures under `fixtures/`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../../../fixtures/manifest.json"))
        .expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    animations: HashMap<String, String>,
    #[serde(rename = "invalid-animations", default)]
    invalid_animations: HashMap<String, RejectedFixture>,
}

/// A stored animation that must be rejected, with the error it should produce.
#[derive(Debug, Deserialize)]
struct RejectedFixture {
    path: String,
    error: String,
}

impl Manifest {
    fn animation(&self, name: &str) -> Result<&str> {
        self.animations
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("no animation fixture named '{name}'"))
    }

    fn rejected(&self, name: &str) -> Result<&RejectedFixture> {
        self.invalid_animations
            .get(name)
            .ok_or_else(|| anyhow!("no invalid animation fixture named '{name}'"))
    }
}

/// Read a fixture file given its path relative to `fixtures/`.
fn read_fixture(rel: &str) -> Result<String> {
    let file = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures")
        .join(rel);
    std::fs::read_to_string(&file).with_context(|| format!("reading fixture {}", file.display()))
}

pub mod animations {
    use super::{read_fixture, Result, MANIFEST};

    pub fn keys() -> Vec<String> {
        MANIFEST.animations.keys().cloned().collect()
    }

    /// Raw StoredAnimation JSON of the named fixture.
    pub fn json(name: &str) -> Result<String> {
        read_fixture(MANIFEST.animation(name)?)
    }
}

pub mod invalid_animations {
    use super::{read_fixture, Result, MANIFEST};

    pub fn keys() -> Vec<String> {
        MANIFEST.invalid_animations.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_fixture(&MANIFEST.rejected(name)?.path)
    }

    /// Name of the error variant loading this fixture should fail with.
    pub fn expected_error(name: &str) -> Result<String> {
        Ok(MANIFEST.rejected(name)?.error.clone())
    }
}
