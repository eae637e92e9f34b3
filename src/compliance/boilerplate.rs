//! Deterministic compliance sections
//!
//! Loan and visa plans carry a legally significant compliance section. Its
//! text is rendered from the intake and the financial model and replaces
//! whatever the generator produced, so two runs over the same intake carry
//! the same wording.

use crate::financial::FinancialModel;
use crate::models::{BusinessIntake, PlanPurpose};
use crate::templates;
use crate::writer::{gbp, word_count, GeneratedSection, SectionSource};
use chrono::Utc;
use tracing::debug;

/// Innovator Founder route investment expectation
const INNOVATOR_FUNDING_GBP: f64 = 50_000.0;

/// Section type that carries boilerplate for a plan purpose, if any.
pub fn boilerplate_section_type(purpose: PlanPurpose) -> Option<&'static str> {
    match purpose {
        PlanPurpose::Loan => Some("loan_eligibility"),
        PlanPurpose::VisaStartup => Some("visa_compliance_checklist"),
        PlanPurpose::VisaInnovator => Some("home_office_compliance"),
        PlanPurpose::Generic | PlanPurpose::Investor => None,
    }
}

/// Replace (or add) the compliance section for the intake's purpose.
/// Returns the injected section type.
pub fn inject_boilerplate(
    sections: &mut Vec<GeneratedSection>,
    intake: &BusinessIntake,
    model: &FinancialModel,
) -> Option<&'static str> {
    let section_type = boilerplate_section_type(intake.plan_purpose)?;
    let def = templates::section_definition(intake.plan_purpose, section_type)?;

    let content = match intake.plan_purpose {
        PlanPurpose::Loan => loan_eligibility(intake, model),
        PlanPurpose::VisaStartup => visa_startup_checklist(intake, model),
        PlanPurpose::VisaInnovator => innovator_compliance(intake, model),
        PlanPurpose::Generic | PlanPurpose::Investor => return None,
    };

    let injected = GeneratedSection {
        section_type: def.section_type,
        title: def.title,
        order_index: def.order_index,
        word_count: word_count(&content),
        content,
        source: SectionSource::Boilerplate,
        placeholders_detected: false,
        generated_at: Utc::now(),
    };

    match sections.iter_mut().find(|s| s.section_type == section_type) {
        Some(existing) => *existing = injected,
        None => {
            sections.push(injected);
            sections.sort_by_key(|s| s.order_index);
        }
    }

    debug!(section = section_type, purpose = %intake.plan_purpose, "Injected compliance boilerplate");
    Some(section_type)
}

fn break_even_line(model: &FinancialModel) -> String {
    let be = &model.break_even;
    if be.break_even_units_monthly > 0.0 {
        format!(
            "Break-even is projected at {} units per month, equal to £{} of monthly revenue.",
            be.break_even_units_monthly,
            gbp(be.break_even_revenue_monthly)
        )
    } else {
        "Break-even could not be projected because the unit contribution margin is not positive.".to_string()
    }
}

fn year_one_line(model: &FinancialModel) -> String {
    match model.first_year() {
        Some(y1) => format!(
            "Year 1 projections show revenue of £{} and net profit of £{}.",
            gbp(y1.revenue),
            gbp(y1.net_profit)
        ),
        None => String::new(),
    }
}

fn loan_eligibility(intake: &BusinessIntake, model: &FinancialModel) -> String {
    format!(
        "{name} confirms the following against the Start-Up Loan eligibility criteria.

- Location: the business operates from {location}.
- Sector: {industry}.
- Funding position: the founders have declared starting capital of £{capital}.
- Affordability: {year_one} {break_even}
- Guidance: repayments are planned against the projected cash flows in the Repayment Plan section, following published Start-Up Loan guidance.",
        name = intake.business_name,
        location = intake.location(),
        industry = intake.industry,
        capital = gbp(intake.starting_capital),
        year_one = year_one_line(model),
        break_even = break_even_line(model),
    )
}

fn visa_startup_checklist(intake: &BusinessIntake, model: &FinancialModel) -> String {
    format!(
        "{name} has prepared this plan against the three Start-Up visa endorsement criteria published in Home Office guidance.

- Innovation: the innovation claim is set out in the Innovation section and rests on the stated value proposition: {uvp}
- Viability: {year_one} {break_even} The Viability Assessment section covers the first two years of trading.
- Scalability: the Scalability Roadmap and UK Job Creation Plan sections describe growth from a current team of {team}.

Location of operation: {location}. Endorsement remains at the discretion of the endorsing body.",
        name = intake.business_name,
        uvp = or_stated(&intake.unique_value_proposition),
        year_one = year_one_line(model),
        break_even = break_even_line(model),
        team = intake.team_size,
        location = intake.location(),
    )
}

fn innovator_compliance(intake: &BusinessIntake, model: &FinancialModel) -> String {
    let funding = if intake.starting_capital >= INNOVATOR_FUNDING_GBP {
        format!(
            "declared starting capital of £{} meets the £{} investment expectation.",
            gbp(intake.starting_capital),
            gbp(INNOVATOR_FUNDING_GBP)
        )
    } else {
        format!(
            "declared starting capital of £{} is below the £{} investment expectation; additional funding evidence will be required.",
            gbp(intake.starting_capital),
            gbp(INNOVATOR_FUNDING_GBP)
        )
    };

    format!(
        "{name} has prepared this plan against the Innovator Founder visa criteria in Home Office guidance.

- Innovation: covered in the Innovation & IP Strategy section, based on the stated value proposition: {uvp}
- Viability: {year_one} {break_even}
- Scalability: the High-Growth Roadmap and Job Creation & National Benefit sections set out growth from a current team of {team}.
- Funding: {funding}
- Endorsement: the plan is structured for review by an approved endorsing body.",
        name = intake.business_name,
        uvp = or_stated(&intake.unique_value_proposition),
        year_one = year_one_line(model),
        break_even = break_even_line(model),
        team = intake.team_size,
        funding = funding,
    )
}

fn or_stated(value: &str) -> &str {
    if value.trim().is_empty() {
        "to be stated by the founders."
    } else {
        value
    }
}
