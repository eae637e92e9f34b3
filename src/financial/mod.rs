//! Deterministic financial engine
//!
//! Closed-form projections only. No I/O, no randomness, no LLM: identical
//! intake + benchmarks always produce an identical model.

use crate::benchmarks::BenchmarkSet;
use crate::error::PipelineError;
use crate::models::BusinessIntake;
use crate::Result;
use serde::{Deserialize, Serialize};

pub mod engine;
pub mod scenarios;

pub use engine::{
    compute_break_even, compute_cogs, compute_kpis, compute_operating_expenses, compute_pnl,
    project_revenue, MAX_GROWTH_RATE, SALARY_ESCALATION_RATE,
};
pub use scenarios::{build_scenarios, run_scenario, ScenarioAssumptions, ScenarioSet};

const DEFAULT_HORIZON_YEARS: u32 = 5;
const MAX_HORIZON_YEARS: u32 = 10;

/// Number of projected years. Validated at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u32", into = "u32")]
pub struct ProjectionHorizon(u32);

impl ProjectionHorizon {
    pub fn new(years: u32) -> Result<Self> {
        if years == 0 || years > MAX_HORIZON_YEARS {
            return Err(PipelineError::InvalidInput(format!(
                "projection horizon must be between 1 and {} years (got {})",
                MAX_HORIZON_YEARS, years
            )));
        }
        Ok(Self(years))
    }

    pub fn years(&self) -> u32 {
        self.0
    }
}

impl Default for ProjectionHorizon {
    fn default() -> Self {
        Self(DEFAULT_HORIZON_YEARS)
    }
}

impl TryFrom<u32> for ProjectionHorizon {
    type Error = PipelineError;

    fn try_from(years: u32) -> Result<Self> {
        Self::new(years)
    }
}

impl From<ProjectionHorizon> for u32 {
    fn from(horizon: ProjectionHorizon) -> u32 {
        horizon.0
    }
}

//
// ================= Series Rows =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YearRevenue {
    pub year: u32,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YearCogs {
    pub year: u32,
    pub cogs: f64,
}

/// Opex row. `salaries` carries its own wage-inflation escalation and is
/// reported alongside, not summed into, the benchmark-driven `total_opex`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YearOpex {
    pub year: u32,
    pub salaries: f64,
    pub software_tools: f64,
    pub hosting_domain: f64,
    pub marketing: f64,
    pub workspace_utilities: f64,
    pub miscellaneous: f64,
    pub custom: f64,
    pub total_opex: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YearPnl {
    pub year: u32,
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub total_opex: f64,
    pub operating_profit: f64,
    pub tax: f64,
    pub net_profit: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BreakEven {
    pub fixed_costs_monthly: f64,
    pub contribution_margin_per_unit: f64,
    pub break_even_units_monthly: f64,
    pub break_even_revenue_monthly: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Kpis {
    pub gross_margin_percent: f64,
    pub net_margin_percent: f64,
    /// `None` when starting capital is zero: ROI is undefined there.
    pub roi_year1_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormulaCitation {
    pub metric: String,
    pub formula: String,
}

/// Complete, immutable projection for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialModel {
    pub horizon: ProjectionHorizon,
    pub pnl_annual: Vec<YearPnl>,
    pub operating_expenses: Vec<YearOpex>,
    pub break_even: BreakEven,
    pub kpis: Kpis,
    pub formulas_used: Vec<FormulaCitation>,
}

impl FinancialModel {
    pub fn year(&self, year: u32) -> Option<&YearPnl> {
        self.pnl_annual.iter().find(|p| p.year == year)
    }

    pub fn first_year(&self) -> Option<&YearPnl> {
        self.pnl_annual.first()
    }
}

/// Five-year model with the default horizon.
pub fn generate_financial_model(
    intake: &BusinessIntake,
    benchmarks: &BenchmarkSet,
) -> FinancialModel {
    generate_financial_model_with_horizon(intake, benchmarks, ProjectionHorizon::default())
}

/// Revenue → COGS → opex → P&L → break-even → KPIs, in that order.
pub fn generate_financial_model_with_horizon(
    intake: &BusinessIntake,
    benchmarks: &BenchmarkSet,
    horizon: ProjectionHorizon,
) -> FinancialModel {
    let revenue = project_revenue(intake, benchmarks, horizon);
    let cogs = compute_cogs(&revenue, benchmarks);
    let opex = compute_operating_expenses(&revenue, intake, benchmarks);
    let pnl = compute_pnl(&revenue, &cogs, &opex);
    let break_even = compute_break_even(intake, benchmarks);
    let kpis = compute_kpis(&pnl, intake.starting_capital);

    FinancialModel {
        horizon,
        pnl_annual: pnl,
        operating_expenses: opex,
        break_even,
        kpis,
        formulas_used: formula_citations(),
    }
}

fn formula_citations() -> Vec<FormulaCitation> {
    [
        ("revenue", "Year 1 = monthly_revenue_estimate × 12 (fallback: starting_capital × revenue_to_capital_ratio)"),
        ("revenue_growth", "Year(N) = Year(N-1) × (1 + min(growth_rate, 0.20))"),
        ("cogs", "COGS = Revenue × cogs_percentage"),
        ("operating_expenses", "Opex(1) = monthly expenses × 12; Opex(N) = Opex(N-1) × (1 + 0.5 × growth_rate)"),
        ("salaries", "Salaries(N) = monthly salaries × 12 × (1 + (N-1) × 0.075)"),
        ("gross_profit", "Gross Profit = Revenue - COGS"),
        ("operating_profit", "Operating Profit = Gross Profit - Total Opex"),
        ("tax", "Tax = max(0, Operating Profit) × 0.19"),
        ("net_profit", "Net Profit = Operating Profit - Tax"),
        ("break_even", "Break-even units = fixed_costs_monthly / (price - price × cogs_percentage), 0 if margin ≤ 0"),
        ("kpis", "Margins = Year 1 profit / Year 1 revenue × 100; ROI = Year 1 net profit / starting_capital × 100"),
    ]
    .into_iter()
    .map(|(metric, formula)| FormulaCitation {
        metric: metric.to_string(),
        formula: formula.to_string(),
    })
    .collect()
}
