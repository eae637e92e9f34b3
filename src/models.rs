//! Core data models: the business intake handed to every generation run

use crate::error::PipelineError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

/// Declared purpose of the plan; selects section and compliance templates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanPurpose {
    #[default]
    Generic,
    Loan,
    VisaStartup,
    VisaInnovator,
    Investor,
}

impl PlanPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanPurpose::Generic => "generic",
            PlanPurpose::Loan => "loan",
            PlanPurpose::VisaStartup => "visa_startup",
            PlanPurpose::VisaInnovator => "visa_innovator",
            PlanPurpose::Investor => "investor",
        }
    }

    /// Lenient parse; anything unrecognised is a generic plan.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "loan" => PlanPurpose::Loan,
            "visa_startup" | "visa-startup" => PlanPurpose::VisaStartup,
            "visa_innovator" | "visa-innovator" => PlanPurpose::VisaInnovator,
            "investor" => PlanPurpose::Investor,
            _ => PlanPurpose::Generic,
        }
    }
}

impl fmt::Display for PlanPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ================= Operating Expenses =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomExpense {
    pub name: String,
    pub amount: f64,
}

/// Monthly operating expense breakdown declared by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OperatingExpenses {
    pub salaries: f64,
    pub software_tools: f64,
    pub hosting_domain: f64,
    pub marketing: f64,
    pub workspace_utilities: f64,
    pub miscellaneous: f64,
    pub custom: Vec<CustomExpense>,
}

impl OperatingExpenses {
    pub fn named_total(&self) -> f64 {
        self.salaries
            + self.software_tools
            + self.hosting_domain
            + self.marketing
            + self.workspace_utilities
            + self.miscellaneous
    }

    pub fn custom_total(&self) -> f64 {
        self.custom.iter().map(|c| c.amount).sum()
    }

    /// Base monthly fixed cost: named categories plus custom lines.
    pub fn monthly_total(&self) -> f64 {
        self.named_total() + self.custom_total()
    }

    fn amounts(&self) -> impl Iterator<Item = (&str, f64)> {
        [
            ("salaries", self.salaries),
            ("software_tools", self.software_tools),
            ("hosting_domain", self.hosting_domain),
            ("marketing", self.marketing),
            ("workspace_utilities", self.workspace_utilities),
            ("miscellaneous", self.miscellaneous),
        ]
        .into_iter()
        .chain(self.custom.iter().map(|c| (c.name.as_str(), c.amount)))
    }
}

//
// ================= Intake =================
//

fn default_price_per_unit() -> f64 {
    10.0
}

/// User-declared facts about the business. Immutable once a run starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessIntake {
    pub business_name: String,
    pub industry: String,
    #[serde(default)]
    pub location_city: String,
    #[serde(default = "default_country")]
    pub location_country: String,
    #[serde(default)]
    pub business_description: String,
    #[serde(default)]
    pub unique_value_proposition: String,
    #[serde(default)]
    pub target_customers: String,
    #[serde(default)]
    pub revenue_model: Vec<String>,

    pub starting_capital: f64,
    #[serde(default)]
    pub monthly_revenue_estimate: f64,
    #[serde(default = "default_price_per_unit")]
    pub price_per_unit: f64,
    #[serde(default)]
    pub units_per_month: u64,

    #[serde(default)]
    pub operating_expenses: OperatingExpenses,
    #[serde(default)]
    pub team_size: u32,
    #[serde(default)]
    pub plan_purpose: PlanPurpose,
}

fn default_country() -> String {
    "UK".to_string()
}

impl BusinessIntake {
    /// Reject malformed values before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if self.industry.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "industry must not be empty".to_string(),
            ));
        }

        let scalars: [(&str, f64); 3] = [
            ("starting_capital", self.starting_capital),
            ("monthly_revenue_estimate", self.monthly_revenue_estimate),
            ("price_per_unit", self.price_per_unit),
        ];

        for (field, value) in scalars
            .into_iter()
            .chain(self.operating_expenses.amounts())
        {
            if !value.is_finite() {
                return Err(PipelineError::InvalidInput(format!(
                    "{} must be a finite number",
                    field
                )));
            }
            if value < 0.0 {
                return Err(PipelineError::InvalidInput(format!(
                    "{} must not be negative (got {})",
                    field, value
                )));
            }
        }

        Ok(())
    }

    pub fn location(&self) -> String {
        if self.location_city.is_empty() {
            self.location_country.clone()
        } else {
            format!("{}, {}", self.location_city, self.location_country)
        }
    }
}
