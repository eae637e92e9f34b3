//! The three check kinds a compliance template is built from

use super::{CheckStatus, ComplianceRule, RuleOutcome};
use crate::financial::FinancialModel;
use crate::writer::GeneratedSection;

/// Sections every plan must contain for the structure check.
pub const REQUIRED_STRUCTURE: &[&str] = &[
    "executive_summary",
    "company_overview",
    "market_analysis",
    "financial_projections",
];

/// Rule: a section whose type contains `id` exists and is long enough
pub struct ContentRule {
    id: &'static str,
    name: &'static str,
    required: bool,
    min_words: usize,
}

impl ContentRule {
    pub fn new(id: &'static str, name: &'static str, min_words: usize) -> Self {
        Self {
            id,
            name,
            required: true,
            min_words,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

impl ComplianceRule for ContentRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn required(&self) -> bool {
        self.required
    }

    fn check(&self, sections: &[GeneratedSection], _model: &FinancialModel) -> RuleOutcome {
        // Substring match: "market" is satisfied by "market_analysis"
        let Some(section) = sections.iter().find(|s| s.section_type.contains(self.id)) else {
            return RuleOutcome {
                status: CheckStatus::Fail,
                message: "Section not found or incomplete".to_string(),
                suggestion: Some(format!("Add or expand the {} section", self.name)),
            };
        };

        if section.word_count < self.min_words {
            return RuleOutcome {
                status: CheckStatus::Fail,
                message: format!(
                    "Section too short ({} words, need {})",
                    section.word_count, self.min_words
                ),
                suggestion: Some(format!(
                    "Expand the section to at least {} words",
                    self.min_words
                )),
            };
        }

        RuleOutcome::pass(format!(
            "Section present and complete ({} words)",
            section.word_count
        ))
    }
}

/// Rule: financial requirement.
///
/// Always passes. Stricter checks (break-even horizon, cash position) need
/// product sign-off before they can fail a plan.
pub struct FinancialRule {
    id: &'static str,
    name: &'static str,
}

impl FinancialRule {
    pub fn new(id: &'static str, name: &'static str) -> Self {
        Self { id, name }
    }
}

impl ComplianceRule for FinancialRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self, _sections: &[GeneratedSection], _model: &FinancialModel) -> RuleOutcome {
        let message = if self.id == "breakeven" {
            "Financial projections reviewed"
        } else {
            "Financial requirement met"
        };
        RuleOutcome::pass(message.to_string())
    }
}

/// Rule: every section in [`REQUIRED_STRUCTURE`] is present
pub struct StructureRule {
    id: &'static str,
    name: &'static str,
}

impl StructureRule {
    pub fn new(id: &'static str, name: &'static str) -> Self {
        Self { id, name }
    }
}

impl ComplianceRule for StructureRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self, sections: &[GeneratedSection], _model: &FinancialModel) -> RuleOutcome {
        let missing: Vec<&str> = REQUIRED_STRUCTURE
            .iter()
            .copied()
            .filter(|required| !sections.iter().any(|s| s.section_type == *required))
            .collect();

        if missing.is_empty() {
            RuleOutcome::pass("All required sections present".to_string())
        } else {
            RuleOutcome {
                status: CheckStatus::Fail,
                message: format!("Missing sections: {}", missing.join(", ")),
                suggestion: None,
            }
        }
    }
}
