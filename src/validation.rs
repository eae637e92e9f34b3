//! Research data validation
//!
//! Rules-based, synchronous. Errors are fatal to the pipeline; warnings are
//! carried into the result for the caller to surface.

use crate::research::ResearchPack;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Sources accepted without a warning.
pub const APPROVED_SOURCES: &[&str] = &[
    "ONS",
    "Eurostat",
    "World Bank",
    "Companies House",
    "SERP API",
    "Google Trends",
];

const STALE_ERROR_DAYS: i64 = 365;
const STALE_WARNING_DAYS: i64 = 90;
const MIN_MARKET_SIZE_GBP: f64 = 1_000_000.0;
const GROWTH_RATE_RANGE: (f64, f64) = (-10.0, 50.0);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    PassedWithWarnings,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub id: Uuid,
    pub data_pack_id: Uuid,
    pub status: ValidationStatus,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub validated_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn is_failed(&self) -> bool {
        self.status == ValidationStatus::Failed
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DataValidator;

impl DataValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, pack: &ResearchPack) -> ValidationReport {
        self.validate_at(pack, Utc::now())
    }

    /// Validate relative to a fixed clock.
    pub fn validate_at(&self, pack: &ResearchPack, now: DateTime<Utc>) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let market = &pack.market_data;

        // Freshness
        if let Some(raw) = market.market_size_timestamp.as_deref() {
            match parse_timestamp(raw) {
                Some(dated) => {
                    let age_days = (now - dated).num_days();
                    if age_days > STALE_ERROR_DAYS {
                        errors.push(issue(
                            "market_size_timestamp",
                            format!("Data is {} days old (>{} days)", age_days, STALE_ERROR_DAYS),
                            Severity::Error,
                        ));
                    } else if age_days > STALE_WARNING_DAYS {
                        warnings.push(issue(
                            "market_size_timestamp",
                            format!("Data is {} days old (>{} days)", age_days, STALE_WARNING_DAYS),
                            Severity::Warning,
                        ));
                    }
                }
                None => {
                    warn!(timestamp = %raw, "Unparseable market data timestamp");
                    warnings.push(issue(
                        "market_size_timestamp",
                        format!("Could not parse timestamp '{}'", raw),
                        Severity::Warning,
                    ));
                }
            }
        }

        // Source allow-list
        if let Some(source) = market.market_size_source.as_deref() {
            if !APPROVED_SOURCES.contains(&source) {
                warnings.push(issue(
                    "market_size_source",
                    format!("Source '{}' not in approved list", source),
                    Severity::Warning,
                ));
            }
        }

        // Numeric sanity. NaN fails every comparison, so check finiteness first.
        if !market.market_size_gbp.is_finite() {
            warnings.push(not_finite("market_size_gbp", market.market_size_gbp));
        } else if market.market_size_gbp < MIN_MARKET_SIZE_GBP {
            warnings.push(issue(
                "market_size_gbp",
                "Market size appears very small".to_string(),
                Severity::Warning,
            ));
        }

        let (low, high) = GROWTH_RATE_RANGE;
        if !market.growth_rate_percent.is_finite() {
            warnings.push(not_finite("growth_rate_percent", market.growth_rate_percent));
        } else if !(low..=high).contains(&market.growth_rate_percent) {
            warnings.push(issue(
                "growth_rate_percent",
                format!("Growth rate outside typical range ({}% to {}%)", low, high),
                Severity::Warning,
            ));
        }

        // Problems the research source reported about itself
        for stale in &pack.stale_data {
            warnings.push(issue("stale_data", format!("Stale data reported: {}", stale), Severity::Warning));
        }
        for failure in &pack.fetch_errors {
            warnings.push(issue("fetch_errors", format!("Fetch error reported: {}", failure), Severity::Warning));
        }

        let status = if !errors.is_empty() {
            ValidationStatus::Failed
        } else if !warnings.is_empty() {
            ValidationStatus::PassedWithWarnings
        } else {
            ValidationStatus::Passed
        };

        info!(
            data_pack_id = %pack.id,
            status = ?status,
            errors = errors.len(),
            warnings = warnings.len(),
            "Validation completed"
        );

        ValidationReport {
            id: Uuid::new_v4(),
            data_pack_id: pack.id,
            status,
            errors,
            warnings,
            validated_at: now,
        }
    }
}

fn issue(field: &str, message: String, severity: Severity) -> ValidationIssue {
    ValidationIssue {
        field: field.to_string(),
        message,
        severity,
    }
}

fn not_finite(field: &str, value: f64) -> ValidationIssue {
    issue(field, format!("Value is not a finite number ({})", value), Severity::Warning)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
