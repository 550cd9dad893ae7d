//! Validation configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Wrap externally supplied target selections in a buffered splitter so
    /// every branch of a disjunction reads one materialized copy.
    pub cache_select_nodes: bool,

    /// Hand every combinator's plan (as Graphviz DOT) to the diagnostics sink.
    pub print_plans: bool,

    /// Bulk mode: validate every current target instead of only the targets
    /// affected by the transaction delta.
    pub validate_all: bool,

    /// Stop validating further shapes once one shape reported violations.
    pub fail_fast: bool,

    /// Stop draining a shape's plan after this many violations.
    pub max_violations_per_shape: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            cache_select_nodes: true,
            print_plans: false,
            validate_all: false,
            fail_fast: false,
            max_violations_per_shape: None,
        }
    }
}

impl ValidationConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SHAPEVAL_CACHE_SELECT_NODES`: `true`/`false`
    /// - `SHAPEVAL_PRINT_PLANS`: `true`/`false`
    /// - `SHAPEVAL_VALIDATE_ALL`: `true`/`false`
    /// - `SHAPEVAL_FAIL_FAST`: `true`/`false`
    /// - `SHAPEVAL_MAX_VIOLATIONS`: per-shape violation cap
    ///
    /// Unparseable values are ignored, like the rest of the env layer.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_bool("SHAPEVAL_CACHE_SELECT_NODES") {
            cfg.cache_select_nodes = v;
        }

        if let Some(v) = env_bool("SHAPEVAL_PRINT_PLANS") {
            cfg.print_plans = v;
        }

        if let Some(v) = env_bool("SHAPEVAL_VALIDATE_ALL") {
            cfg.validate_all = v;
        }

        if let Some(v) = env_bool("SHAPEVAL_FAIL_FAST") {
            cfg.fail_fast = v;
        }

        if let Ok(s) = std::env::var("SHAPEVAL_MAX_VIOLATIONS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_violations_per_shape = Some(v);
            }
        }

        cfg
    }

    /// Reject settings that can never produce a useful run.
    pub fn validate(&self) -> Result<()> {
        if self.max_violations_per_shape == Some(0) {
            return Err(Error::Config(
                "max_violations_per_shape must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let s = std::env::var(key).ok()?;
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
