//! Pipeline configuration
//!
//! Defaults match the documented stage budgets. `from_env` loads `.env` first
//! and overrides any value whose variable is set.

use crate::error::PipelineError;
use crate::financial::ProjectionHorizon;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Per-stage time budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub research: Duration,
    pub validation: Duration,
    pub financial: Duration,
    pub swot: Duration,
    pub competitors: Duration,
    pub content: Duration,
    pub compliance: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            research: Duration::from_secs(30),
            validation: Duration::from_secs(5),
            financial: Duration::from_secs(2),
            swot: Duration::from_secs(20),
            competitors: Duration::from_secs(15),
            content: Duration::from_secs(180),
            compliance: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub timeouts: StageTimeouts,
    pub projection_horizon: ProjectionHorizon,
    pub research_cache_capacity: usize,
    pub research_cache_ttl: Duration,
    pub gemini_api_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeouts: StageTimeouts::default(),
            projection_horizon: ProjectionHorizon::default(),
            research_cache_capacity: 128,
            research_cache_ttl: Duration::from_secs(6 * 60 * 60),
            gemini_api_key: None,
        }
    }
}

impl PipelineConfig {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let t = &mut config.timeouts;

        let secs = |key: &str, current: &mut Duration| -> Result<()> {
            if let Some(value) = parse_var::<u64>(&lookup, key)? {
                *current = Duration::from_secs(value);
            }
            Ok(())
        };

        secs("PIPELINE_RESEARCH_TIMEOUT_SECS", &mut t.research)?;
        secs("PIPELINE_VALIDATION_TIMEOUT_SECS", &mut t.validation)?;
        secs("PIPELINE_FINANCIAL_TIMEOUT_SECS", &mut t.financial)?;
        secs("PIPELINE_SWOT_TIMEOUT_SECS", &mut t.swot)?;
        secs("PIPELINE_COMPETITORS_TIMEOUT_SECS", &mut t.competitors)?;
        secs("PIPELINE_CONTENT_TIMEOUT_SECS", &mut t.content)?;
        secs("PIPELINE_COMPLIANCE_TIMEOUT_SECS", &mut t.compliance)?;

        if let Some(years) = parse_var::<u32>(&lookup, "PIPELINE_PROJECTION_YEARS")? {
            config.projection_horizon = ProjectionHorizon::new(years)?;
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, "RESEARCH_CACHE_CAPACITY")? {
            config.research_cache_capacity = capacity;
        }
        if let Some(ttl) = parse_var::<u64>(&lookup, "RESEARCH_CACHE_TTL_SECS")? {
            config.research_cache_ttl = Duration::from_secs(ttl);
        }

        config.gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        Ok(config)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            PipelineError::ConfigError(format!("{} has an invalid value: '{}'", key, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.timeouts, StageTimeouts::default());
        assert_eq!(config.timeouts.content, Duration::from_secs(180));
        assert_eq!(config.projection_horizon.years(), 5);
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("PIPELINE_RESEARCH_TIMEOUT_SECS", "45"),
            ("PIPELINE_PROJECTION_YEARS", "3"),
            ("RESEARCH_CACHE_CAPACITY", "16"),
            ("GEMINI_API_KEY", "abc"),
        ]))
        .unwrap();

        assert_eq!(config.timeouts.research, Duration::from_secs(45));
        assert_eq!(config.timeouts.swot, Duration::from_secs(20));
        assert_eq!(config.projection_horizon.years(), 3);
        assert_eq!(config.research_cache_capacity, 16);
        assert_eq!(config.gemini_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = PipelineConfig::from_lookup(lookup(&[("PIPELINE_SWOT_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));

        let err = PipelineConfig::from_lookup(lookup(&[("PIPELINE_PROJECTION_YEARS", "40")]));
        assert!(err.is_err());
    }
}
