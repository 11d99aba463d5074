//! Policy file loading.
//!
//! Implements the load pipeline:
//! 1. Read the JSON source
//! 2. Parse to a JSON tree (malformed JSON fails here)
//! 3. Validate the tree, collecting every violation
//! 4. Return the immutable [`PolicyConfig`] snapshot
//!
//! Loading is fail-fast: a policy that cannot be fully validated never
//! becomes active.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{PolicyError, PolicyResult};
use crate::types::PolicyConfig;
use crate::validate;

/// Load and validate a policy from a file path.
///
/// # Errors
///
/// Returns [`PolicyError::Io`] if the file cannot be read,
/// [`PolicyError::Parse`] if it is not well-formed JSON, or
/// [`PolicyError::Validation`] with the full list of violations.
pub fn load_from_path(path: &Path) -> PolicyResult<PolicyConfig> {
    let path_display = path.display().to_string();
    debug!(path = %path_display, "loading policy file");
    let raw = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
        path: path_display.clone(),
        source,
    })?;
    let config = load_from_str_with_origin(&raw, &path_display)?;
    info!(
        path = %path_display,
        chains = config.chain_allowlist.len(),
        tokens = config.token_allowlist.len(),
        "loaded policy"
    );
    Ok(config)
}

/// Load and validate a policy from an in-memory JSON string.
///
/// # Errors
///
/// Returns [`PolicyError::Parse`] or [`PolicyError::Validation`] as for
/// [`load_from_path`].
pub fn load_from_str(raw: &str) -> PolicyResult<PolicyConfig> {
    load_from_str_with_origin(raw, "<inline>")
}

fn load_from_str_with_origin(raw: &str, origin: &str) -> PolicyResult<PolicyConfig> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|source| PolicyError::Parse {
            path: origin.to_string(),
            source,
        })?;
    validate::build(&value).map_err(|errors| PolicyError::Validation { errors })
}
