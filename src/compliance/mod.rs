//! Compliance checker
//!
//! Rules-based scoring of a finished plan against a named template.
//! Deterministic and synchronous.

use crate::financial::FinancialModel;
use crate::models::PlanPurpose;
use crate::writer::GeneratedSection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

pub mod boilerplate;
pub mod rules;

pub use boilerplate::inject_boilerplate;
use rules::{ContentRule, FinancialRule, StructureRule};

//
// ================= Templates =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceTemplateId {
    UkStartupVisa,
    UkStartupLoan,
    InvestorReady,
    Generic,
}

impl ComplianceTemplateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UkStartupVisa => "UK_STARTUP_VISA",
            Self::UkStartupLoan => "UK_STARTUP_LOAN",
            Self::InvestorReady => "INVESTOR_READY",
            Self::Generic => "GENERIC",
        }
    }

    /// Unknown template ids fall back to the generic template.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "UK_STARTUP_VISA" => Self::UkStartupVisa,
            "UK_STARTUP_LOAN" => Self::UkStartupLoan,
            "INVESTOR_READY" => Self::InvestorReady,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for ComplianceTemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn map_purpose_to_template(purpose: PlanPurpose) -> ComplianceTemplateId {
    match purpose {
        PlanPurpose::VisaStartup | PlanPurpose::VisaInnovator => ComplianceTemplateId::UkStartupVisa,
        PlanPurpose::Loan => ComplianceTemplateId::UkStartupLoan,
        PlanPurpose::Investor => ComplianceTemplateId::InvestorReady,
        PlanPurpose::Generic => ComplianceTemplateId::Generic,
    }
}

//
// ================= Report =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NeedsAttention,
    NonCompliant,
}

impl ComplianceStatus {
    pub fn from_failures(failed: usize) -> Self {
        match failed {
            0 => Self::Compliant,
            1..=2 => Self::NeedsAttention,
            _ => Self::NonCompliant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub rule_id: String,
    pub name: String,
    pub required: bool,
    pub status: CheckStatus,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub id: Uuid,
    pub template_id: ComplianceTemplateId,
    pub overall_status: ComplianceStatus,
    pub checks: Vec<CheckResult>,
    pub passed_count: usize,
    pub failed_count: usize,
    /// round(passed / total × 100); 0 when the template has no checks
    pub score: u32,
    pub generated_at: DateTime<Utc>,
}

//
// ================= Rules =================
//

/// What a single rule concluded
pub struct RuleOutcome {
    pub status: CheckStatus,
    pub message: String,
    pub suggestion: Option<String>,
}

impl RuleOutcome {
    pub fn pass(message: String) -> Self {
        Self {
            status: CheckStatus::Pass,
            message,
            suggestion: None,
        }
    }
}

/// Trait for compliance rules
pub trait ComplianceRule: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn required(&self) -> bool {
        true
    }

    fn check(&self, sections: &[GeneratedSection], model: &FinancialModel) -> RuleOutcome;
}

/// Ordered rule list for one template
pub struct ComplianceChecker {
    template_id: ComplianceTemplateId,
    rules: Vec<Box<dyn ComplianceRule>>,
}

impl ComplianceChecker {
    pub fn new(template_id: ComplianceTemplateId) -> Self {
        Self {
            template_id,
            rules: Vec::new(),
        }
    }

    pub fn add_rule(&mut self, rule: Box<dyn ComplianceRule>) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: impl ComplianceRule + 'static) -> Self {
        self.add_rule(Box::new(rule));
        self
    }

    /// The registered rule set for a template.
    pub fn for_template(template_id: ComplianceTemplateId) -> Self {
        let checker = Self::new(template_id);

        match template_id {
            ComplianceTemplateId::UkStartupVisa => checker
                .with_rule(ContentRule::new("innovation", "Innovation Description", 200))
                .with_rule(FinancialRule::new("viability", "Viability (2-year plan)"))
                .with_rule(ContentRule::new("market", "UK Market Opportunity", 150))
                .with_rule(ContentRule::new("team", "Team Capability", 100)),
            ComplianceTemplateId::UkStartupLoan => checker
                .with_rule(FinancialRule::new("repayment", "Loan Repayment Plan"))
                .with_rule(FinancialRule::new("breakeven", "Break-even within 24 months"))
                .with_rule(FinancialRule::new("cashflow", "Positive Cash Flow")),
            ComplianceTemplateId::InvestorReady => checker
                .with_rule(ContentRule::new("market_size", "TAM/SAM/SOM Analysis", 200))
                .with_rule(ContentRule::new("traction", "Traction/Milestones", 100).optional())
                .with_rule(ContentRule::new("team", "Team Experience", 150)),
            ComplianceTemplateId::Generic => {
                checker.with_rule(StructureRule::new("completeness", "All Sections Present"))
            }
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run every rule in order (SYNC)
    pub fn check(&self, sections: &[GeneratedSection], model: &FinancialModel) -> ComplianceReport {
        let mut checks = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let outcome = rule.check(sections, model);
            checks.push(CheckResult {
                rule_id: rule.id().to_string(),
                name: rule.name().to_string(),
                required: rule.required(),
                status: outcome.status,
                message: outcome.message,
                suggestion: outcome.suggestion,
            });
        }

        let passed_count = checks.iter().filter(|c| c.status == CheckStatus::Pass).count();
        let failed_count = checks.len() - passed_count;

        let score = if checks.is_empty() {
            0
        } else {
            (passed_count as f64 / checks.len() as f64 * 100.0).round() as u32
        };

        let overall_status = ComplianceStatus::from_failures(failed_count);

        info!(
            template = %self.template_id,
            rule_count = checks.len(),
            passed = passed_count,
            failed = failed_count,
            score,
            "Compliance check completed"
        );

        ComplianceReport {
            id: Uuid::new_v4(),
            template_id: self.template_id,
            overall_status,
            checks,
            passed_count,
            failed_count,
            score,
            generated_at: Utc::now(),
        }
    }
}

pub fn check_compliance(
    sections: &[GeneratedSection],
    model: &FinancialModel,
    template_id: ComplianceTemplateId,
) -> ComplianceReport {
    ComplianceChecker::for_template(template_id).check(sections, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::BenchmarkSet;
    use crate::financial::generate_financial_model;
    use crate::models::fixtures::coffee_shop;
    use crate::writer::SectionSource;

    fn section(section_type: &str, words: usize) -> GeneratedSection {
        GeneratedSection {
            section_type: section_type.to_string(),
            title: section_type.to_string(),
            order_index: 0,
            content: vec!["word"; words].join(" "),
            word_count: words,
            source: SectionSource::Generated,
            placeholders_detected: false,
            generated_at: Utc::now(),
        }
    }

    fn model() -> FinancialModel {
        generate_financial_model(&coffee_shop(), &BenchmarkSet::default())
    }

    fn five_content_checks() -> ComplianceChecker {
        ComplianceChecker::new(ComplianceTemplateId::Generic)
            .with_rule(ContentRule::new("alpha", "Alpha", 10))
            .with_rule(ContentRule::new("beta", "Beta", 10))
            .with_rule(ContentRule::new("gamma", "Gamma", 10))
            .with_rule(ContentRule::new("delta", "Delta", 10))
            .with_rule(ContentRule::new("epsilon", "Epsilon", 10))
    }

    #[test]
    fn test_status_boundaries_with_five_checks() {
        let checker = five_content_checks();
        let model = model();
        let all = ["alpha", "beta", "gamma", "delta", "epsilon"];

        let present = |n: usize| -> Vec<GeneratedSection> {
            all.iter().take(n).map(|t| section(t, 20)).collect()
        };

        let compliant = checker.check(&present(5), &model);
        assert_eq!(compliant.overall_status, ComplianceStatus::Compliant);
        assert_eq!(compliant.score, 100);

        let two_failed = checker.check(&present(3), &model);
        assert_eq!(two_failed.failed_count, 2);
        assert_eq!(two_failed.overall_status, ComplianceStatus::NeedsAttention);
        assert_eq!(two_failed.score, 60);

        let three_failed = checker.check(&present(2), &model);
        assert_eq!(three_failed.failed_count, 3);
        assert_eq!(three_failed.overall_status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_content_rule_substring_and_word_count() {
        let model = model();
        let rule = ContentRule::new("innovation", "Innovation Description", 200);

        let short = rule.check(&[section("innovation_section", 120)], &model);
        assert_eq!(short.status, CheckStatus::Fail);
        assert_eq!(short.message, "Section too short (120 words, need 200)");

        let ok = rule.check(&[section("innovation_ip_strategy", 320)], &model);
        assert_eq!(ok.status, CheckStatus::Pass);

        let missing = rule.check(&[section("team", 300)], &model);
        assert_eq!(
            missing.suggestion.as_deref(),
            Some("Add or expand the Innovation Description section")
        );
    }

    #[test]
    fn test_structure_rule_lists_missing_sections() {
        let sections = vec![section("executive_summary", 250), section("market_analysis", 250)];
        let report = check_compliance(&sections, &model(), ComplianceTemplateId::Generic);

        assert_eq!(report.checks.len(), 1);
        assert_eq!(
            report.checks[0].message,
            "Missing sections: company_overview, financial_projections"
        );
        assert_eq!(report.overall_status, ComplianceStatus::NeedsAttention);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn test_loan_template_financial_checks_pass() {
        let report = check_compliance(&[], &model(), ComplianceTemplateId::UkStartupLoan);

        assert_eq!(report.passed_count, 3);
        assert_eq!(report.overall_status, ComplianceStatus::Compliant);
        assert_eq!(report.checks[1].message, "Financial projections reviewed");
    }

    #[test]
    fn test_investor_template_marks_traction_optional() {
        let checker = ComplianceChecker::for_template(ComplianceTemplateId::InvestorReady);
        let report = checker.check(&[section("tam_sam_som", 10)], &model());

        assert_eq!(checker.rule_count(), 3);
        assert!(!report.checks[1].required);
        // "market_size" does not match "tam_sam_som"
        assert_eq!(report.failed_count, 3);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn test_template_mapping_and_parse() {
        assert_eq!(
            map_purpose_to_template(PlanPurpose::VisaInnovator),
            ComplianceTemplateId::UkStartupVisa
        );
        assert_eq!(map_purpose_to_template(PlanPurpose::Loan), ComplianceTemplateId::UkStartupLoan);
        assert_eq!(ComplianceTemplateId::parse("UK_INNOVATOR_VISA"), ComplianceTemplateId::Generic);
        assert_eq!(ComplianceTemplateId::parse("investor_ready"), ComplianceTemplateId::InvestorReady);

        let json = serde_json::to_string(&ComplianceTemplateId::UkStartupVisa).unwrap();
        assert_eq!(json, "\"UK_STARTUP_VISA\"");
    }
}
