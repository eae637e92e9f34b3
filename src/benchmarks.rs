//! Industry benchmark provider
//!
//! Supplies the assumption constants the financial engine substitutes
//! wherever the intake has no directly observed value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// UK corporation tax applied to positive operating profit.
pub const CORPORATION_TAX_RATE: f64 = 0.19;

/// Named industry constants. Pure value object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkSet {
    pub cogs_percentage: f64,
    pub revenue_to_capital_ratio: f64,
    /// Raw annual growth; the revenue projection caps it at 20%.
    pub growth_rate: f64,
    pub marketing_spend_percentage: f64,
    pub employee_cost_average: f64,
    pub rent_per_sqft_average: f64,
    pub utilities_monthly: f64,
    pub insurance_annual: f64,
    pub break_even_months_median: u32,
    pub gross_margin_median: f64,
    pub operating_expense_ratio: f64,
    pub failure_rate_year1: f64,
}

impl Default for BenchmarkSet {
    fn default() -> Self {
        Self {
            cogs_percentage: 0.35,
            revenue_to_capital_ratio: 0.30,
            growth_rate: 0.15,
            marketing_spend_percentage: 0.08,
            employee_cost_average: 25_000.0,
            rent_per_sqft_average: 50.0,
            utilities_monthly: 500.0,
            insurance_annual: 2_000.0,
            break_even_months_median: 18,
            gross_margin_median: 0.65,
            operating_expense_ratio: 0.45,
            failure_rate_year1: 0.20,
        }
    }
}

/// Industry-keyed benchmark lookup with a documented default.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkProvider {
    overrides: HashMap<String, BenchmarkSet>,
    fallback: BenchmarkSet,
}

impl BenchmarkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a benchmark set for an industry key (case-insensitive).
    pub fn with_industry(mut self, industry: &str, set: BenchmarkSet) -> Self {
        self.overrides.insert(normalize_key(industry), set);
        self
    }

    /// Always succeeds; unknown industries get the default set.
    pub fn get(&self, industry: &str) -> BenchmarkSet {
        match self.overrides.get(&normalize_key(industry)) {
            Some(set) => *set,
            None => {
                debug!(industry = %industry, "No industry benchmarks, using defaults");
                self.fallback
            }
        }
    }
}

fn normalize_key(industry: &str) -> String {
    industry.trim().to_lowercase()
}

/// Benchmarks for an industry using the built-in provider.
pub fn get_benchmarks(industry: &str) -> BenchmarkSet {
    BenchmarkProvider::new().get(industry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_industry_gets_defaults() {
        let set = get_benchmarks("underwater_basket_weaving");
        assert_eq!(set, BenchmarkSet::default());
        assert_eq!(set.cogs_percentage, 0.35);
        assert_eq!(set.revenue_to_capital_ratio, 0.30);
        assert_eq!(set.growth_rate, 0.15);
        assert_eq!(set.break_even_months_median, 18);
    }

    #[test]
    fn test_override_lookup_is_case_insensitive() {
        let saas = BenchmarkSet {
            cogs_percentage: 0.10,
            growth_rate: 0.40,
            ..BenchmarkSet::default()
        };

        let provider = BenchmarkProvider::new().with_industry("SaaS", saas);

        assert_eq!(provider.get("saas").cogs_percentage, 0.10);
        assert_eq!(provider.get("  SAAS ").growth_rate, 0.40);
        assert_eq!(provider.get("retail"), BenchmarkSet::default());
    }
}
