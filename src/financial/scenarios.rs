//! What-if scenarios over the deterministic engine
//!
//! A scenario scales the intake (monthly revenue estimate and every operating
//! expense line) and regenerates the whole model, so break-even and KPIs stay
//! consistent with the adjusted figures.

use super::{generate_financial_model_with_horizon, FinancialModel, ProjectionHorizon};
use crate::benchmarks::BenchmarkSet;
use crate::error::PipelineError;
use crate::models::BusinessIntake;
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScenarioAssumptions {
    pub revenue_multiplier: f64,
    pub cost_multiplier: f64,
}

impl ScenarioAssumptions {
    pub const REALISTIC: Self = Self {
        revenue_multiplier: 1.0,
        cost_multiplier: 1.0,
    };
    /// +20% revenue, -10% costs
    pub const BEST_CASE: Self = Self {
        revenue_multiplier: 1.2,
        cost_multiplier: 0.9,
    };
    /// -30% revenue, +15% costs
    pub const WORST_CASE: Self = Self {
        revenue_multiplier: 0.7,
        cost_multiplier: 1.15,
    };

    pub fn new(revenue_multiplier: f64, cost_multiplier: f64) -> Result<Self> {
        for (name, value) in [("revenue", revenue_multiplier), ("cost", cost_multiplier)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::InvalidInput(format!(
                    "{} multiplier must be a non-negative number (got {})",
                    name, value
                )));
            }
        }

        Ok(Self {
            revenue_multiplier,
            cost_multiplier,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub assumptions: ScenarioAssumptions,
    pub model: FinancialModel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSet {
    pub best_case: Scenario,
    pub realistic: Scenario,
    pub worst_case: Scenario,
    pub sensitivity: Vec<SensitivityFactor>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensitivityFactor {
    pub name: String,
    /// 0..=100
    pub impact_score: f64,
    pub effect: Effect,
    pub description: String,
}

/// Intake with revenue and costs scaled by the assumptions.
pub fn adjust_intake(intake: &BusinessIntake, assumptions: ScenarioAssumptions) -> BusinessIntake {
    let mut adjusted = intake.clone();
    adjusted.monthly_revenue_estimate *= assumptions.revenue_multiplier;

    let costs = &mut adjusted.operating_expenses;
    for line in [
        &mut costs.salaries,
        &mut costs.software_tools,
        &mut costs.hosting_domain,
        &mut costs.marketing,
        &mut costs.workspace_utilities,
        &mut costs.miscellaneous,
    ] {
        *line *= assumptions.cost_multiplier;
    }
    for custom in &mut costs.custom {
        custom.amount *= assumptions.cost_multiplier;
    }

    adjusted
}

pub fn run_scenario(
    intake: &BusinessIntake,
    benchmarks: &BenchmarkSet,
    horizon: ProjectionHorizon,
    assumptions: ScenarioAssumptions,
) -> Scenario {
    let adjusted = adjust_intake(intake, assumptions);
    Scenario {
        assumptions,
        model: generate_financial_model_with_horizon(&adjusted, benchmarks, horizon),
    }
}

/// Best case, realistic and worst case projections plus a sensitivity ranking.
pub fn build_scenarios(
    intake: &BusinessIntake,
    benchmarks: &BenchmarkSet,
    horizon: ProjectionHorizon,
) -> ScenarioSet {
    let realistic = run_scenario(intake, benchmarks, horizon, ScenarioAssumptions::REALISTIC);
    let sensitivity = sensitivity_analysis(intake, &realistic.model);

    ScenarioSet {
        best_case: run_scenario(intake, benchmarks, horizon, ScenarioAssumptions::BEST_CASE),
        worst_case: run_scenario(intake, benchmarks, horizon, ScenarioAssumptions::WORST_CASE),
        realistic,
        sensitivity,
    }
}

/// Rank the intake figures by how strongly they move profitability.
/// Factors whose input is zero are left out.
pub fn sensitivity_analysis(intake: &BusinessIntake, model: &FinancialModel) -> Vec<SensitivityFactor> {
    let mut factors = Vec::new();

    if intake.monthly_revenue_estimate > 0.0 {
        let monthly_revenue = model.first_year().map(|y| y.revenue / 12.0).unwrap_or_default();
        let impact = monthly_revenue * 0.2 / intake.monthly_revenue_estimate * 100.0;
        factors.push(factor(
            "Monthly Revenue",
            impact,
            if impact > 0.0 { Effect::Positive } else { Effect::Negative },
            "20% change in revenue affects profitability significantly",
        ));
    }

    if model.first_year().is_some_and(|y| y.total_opex > 0.0) {
        factors.push(factor(
            "Operating Costs",
            15.0,
            Effect::Negative,
            "15% change in costs has significant impact on profitability",
        ));
    }

    if intake.price_per_unit > 0.0 {
        factors.push(factor(
            "Price per Unit",
            75.0,
            Effect::Positive,
            "Price changes directly affect revenue and margins",
        ));
    }

    if intake.units_per_month > 0 {
        factors.push(factor(
            "Units per Month",
            80.0,
            Effect::Positive,
            "Volume changes significantly impact total revenue",
        ));
    }

    factors.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
    factors
}

fn factor(name: &str, impact: f64, effect: Effect, description: &str) -> SensitivityFactor {
    SensitivityFactor {
        name: name.to_string(),
        impact_score: impact.abs().min(100.0),
        effect,
        description: description.to_string(),
    }
}
