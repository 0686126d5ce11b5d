//! Session configuration: grading backend URL, request timeout, sandbox limits.
//!
//! Loaded from TOML (SESSION_CONFIG_PATH) with per-field defaults; the
//! GRADER_BASE_URL env var overrides the backend URL either way.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
  /// Base URL of the grading backend (the five /submit*, /get_* endpoints).
  #[serde(default = "default_base_url")]
  pub grader_base_url: String,
  /// Per-request timeout for all backend calls, in seconds.
  #[serde(default = "default_timeout_secs")]
  pub request_timeout_secs: u64,
  #[serde(default)]
  pub sandbox: SandboxConfig,
}

/// Sandbox budgets accepted in TOML. Converted into `SandboxLimits`
/// by the controller wiring.
#[derive(Clone, Debug, Deserialize)]
pub struct SandboxConfig {
  #[serde(default = "default_entry_point")]
  pub entry_point: String,
  #[serde(default = "default_max_operations")]
  pub max_operations: u64,
  #[serde(default = "default_max_call_levels")]
  pub max_call_levels: usize,
  #[serde(default = "default_sandbox_timeout_ms")]
  pub timeout_ms: u64,
}

fn default_base_url() -> String { "http://127.0.0.1:5000".into() }
fn default_timeout_secs() -> u64 { 20 }
fn default_entry_point() -> String { "foo".into() }
fn default_max_operations() -> u64 { 500_000 }
fn default_max_call_levels() -> usize { 64 }
fn default_sandbox_timeout_ms() -> u64 { 2_000 }

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      grader_base_url: default_base_url(),
      request_timeout_secs: default_timeout_secs(),
      sandbox: SandboxConfig::default(),
    }
  }
}

impl Default for SandboxConfig {
  fn default() -> Self {
    Self {
      entry_point: default_entry_point(),
      max_operations: default_max_operations(),
      max_call_levels: default_max_call_levels(),
      timeout_ms: default_sandbox_timeout_ms(),
    }
  }
}

impl SessionConfig {
  /// Build config from the environment: TOML file if SESSION_CONFIG_PATH is
  /// set and parses, defaults otherwise, then the GRADER_BASE_URL override.
  pub fn from_env() -> Self {
    let mut cfg = load_session_config_from_env().unwrap_or_default();
    if let Ok(url) = std::env::var("GRADER_BASE_URL") {
      cfg.grader_base_url = url;
    }
    cfg
  }
}

/// Attempt to load `SessionConfig` from SESSION_CONFIG_PATH.
/// On any parsing/IO error, returns None.
pub fn load_session_config_from_env() -> Option<SessionConfig> {
  let path = std::env::var("SESSION_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<SessionConfig>(&s) {
      Ok(cfg) => {
        info!(target: "codequest_session", %path, "Loaded session config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "codequest_session", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "codequest_session", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
