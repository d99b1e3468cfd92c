use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use valuation_core::GuardrailConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// JSON file overriding the default guardrails
    pub guardrail_config: Option<PathBuf>,
    pub json_logging: bool,
    /// Trailing years summarised in historical ranges (0 = all)
    pub history_window: usize,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            guardrail_config: env::var("GUARDRAIL_CONFIG").ok().map(PathBuf::from),
            json_logging: env::var("RUST_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            history_window: env::var("HISTORY_WINDOW")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("HISTORY_WINDOW must be a non-negative integer")?,
        })
    }

    /// Guardrails from the override file, or the defaults when none is set.
    pub fn load_guardrails(&self) -> Result<GuardrailConfig> {
        let Some(path) = &self.guardrail_config else {
            return Ok(GuardrailConfig::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading guardrail config {}", path.display()))?;
        let config = GuardrailConfig::from_json_str(&raw)
            .with_context(|| format!("parsing guardrail config {}", path.display()))?;
        tracing::info!("Loaded guardrail config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_override_uses_defaults() {
        let config = CliConfig {
            guardrail_config: None,
            json_logging: false,
            history_window: 10,
        };
        assert_eq!(config.load_guardrails().unwrap(), GuardrailConfig::default());
    }

    #[test]
    fn test_missing_override_file_errors() {
        let config = CliConfig {
            guardrail_config: Some(PathBuf::from("/nonexistent/guardrails.json")),
            json_logging: false,
            history_window: 10,
        };
        let err = config.load_guardrails().unwrap_err();
        assert!(err.to_string().contains("guardrails.json"));
    }
}
