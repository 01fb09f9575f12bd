//! Engine configuration.
//!
//! Hosts build an [`EngineConfig`] directly or layer it from an optional TOML
//! file and `COACT_*` environment variables.

use std::path::Path;

use serde::Deserialize;

use crate::Result;

/// Runtime engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Largest number of calendar days allowed strictly between one
  /// medication's last day and the next one's first day for the pair to read
  /// as a switch. `0` accepts only a next-day start.
  pub switch_gap_days: u32,
  /// Input-size cap applied before any work is done.
  pub max_medications: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      switch_gap_days: 0,
      max_medications: 300,
    }
  }
}

impl EngineConfig {
  /// Load from `path` (when given) overlaid with `COACT_*` environment
  /// variables. Missing keys keep their defaults.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    Self::load_with(path, environment())
  }

  fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(config::File::from(path).required(true));
    }
    let settings = builder.add_source(env).build()?;
    Ok(settings.try_deserialize()?)
  }
}

fn environment() -> config::Environment {
  config::Environment::with_prefix("COACT").try_parsing(true)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_without_sources() {
    let cfg = EngineConfig::load(None).unwrap();
    assert_eq!(cfg, EngineConfig::default());
  }

  #[test]
  fn toml_file_overrides_defaults() {
    let path = std::env::temp_dir()
      .join(format!("coact-engine-{}.toml", std::process::id()));
    std::fs::write(&path, "switch_gap_days = 2\n").unwrap();

    let cfg = EngineConfig::load(Some(&path));
    std::fs::remove_file(&path).ok();

    let cfg = cfg.unwrap();
    assert_eq!(cfg.switch_gap_days, 2);
    assert_eq!(cfg.max_medications, 300);
  }

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let map = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect::<config::Map<_, _>>();
    environment().source(Some(map))
  }

  #[test]
  fn environment_overrides_file() {
    let path = std::env::temp_dir()
      .join(format!("coact-engine-env-{}.toml", std::process::id()));
    std::fs::write(&path, "switch_gap_days = 2\nmax_medications = 40\n").unwrap();

    let cfg = EngineConfig::load_with(
      Some(&path),
      env(&[("COACT_SWITCH_GAP_DAYS", "4"), ("UNRELATED_VAR", "9")]),
    );
    std::fs::remove_file(&path).ok();

    let cfg = cfg.unwrap();
    assert_eq!(cfg.switch_gap_days, 4);
    assert_eq!(cfg.max_medications, 40);
  }

  #[test]
  fn environment_alone_is_parsed_into_numbers() {
    let cfg =
      EngineConfig::load_with(None, env(&[("COACT_MAX_MEDICATIONS", "25")])).unwrap();
    assert_eq!(cfg.max_medications, 25);
    assert_eq!(cfg.switch_gap_days, 0);
  }

  #[test]
  fn non_numeric_environment_value_is_an_error() {
    let err = EngineConfig::load_with(None, env(&[("COACT_SWITCH_GAP_DAYS", "soon")]))
      .unwrap_err();
    assert!(matches!(err, crate::Error::Config(_)));
  }

  #[test]
  fn missing_file_is_an_error() {
    let path = std::env::temp_dir().join("coact-does-not-exist.toml");
    assert!(EngineConfig::load(Some(&path)).is_err());
  }
}
