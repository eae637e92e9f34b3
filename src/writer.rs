//! Content writer
//!
//! Turns template section definitions into narrative text. The prompt carries
//! only user-declared facts, engine figures and cited research; anything the
//! generator adds on top is cleaned out before the section is returned.

use crate::financial::FinancialModel;
use crate::generation::{GenerationPurpose, GenerationRequest, TextGenerator};
use crate::models::BusinessIntake;
use crate::research::ResearchPack;
use crate::templates::{self, SectionDefinition, TemplateConfig};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

const ZERO_HALLUCINATION_PROMPT: &str = "You are a professional business plan writer.

ABSOLUTE RULES:
1. NEVER invent statistics, market sizes, growth rates, or any numbers
2. ONLY use data from the information provided below
3. Cite all statistics: \"According to [SOURCE], ...\" or \"Our financial projections show...\"
4. If data is missing, write \"Further research required\" or omit the claim
5. NO placeholder text like DATA_PACK, INTAKE_DATA, [NAME], etc. - write complete content
6. Use exact numbers from the data provided
7. Write in professional business English
8. Reference the ACTUAL business name provided, not generic placeholders

FORMAT: Professional, clear, suitable for business plan readers";

const SYSTEM_INSTRUCTION: &str = "You are a professional business plan writer. Write using ONLY the provided data. NO placeholders, NO generic examples, NO hard-coded content.";

lazy_static! {
    static ref REMOVAL_PATTERNS: Vec<Regex> = [
        r"(?i)\[(INTAKE_DATA|DATA_PACK|FINANCIAL_PACK|FOUNDERS_NAME|BUSINESS_NAME|LOCATION|BUSINESS_DESCRIPTION|INDUSTRY)\]",
        r"(?i)\{[^{}\n]*?_(DATA|PACK)\}",
        r"(?i)INTAKE_DATA|DATA_PACK|FINANCIAL_PACK",
        r"(?i)Budget has been exceeded.*",
        r"(?i)exceeded budget.*",
        r"(?i)API error.*",
        r"(?i)Error:.*",
        r"\[[A-Z_\s]+\]",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();
}

/// Tokens that should never survive cleaning.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "DATA_PACK",
    "FINANCIAL_PACK",
    "INTAKE_DATA",
    "[BUSINESS_NAME]",
    "[FOUNDERS_NAME]",
    "[LOCATION]",
    "BUDGET HAS BEEN EXCEEDED",
    "API ERROR",
    "EXCEEDED BUDGET",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    GenerationFailed,
    EmptyOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionSource {
    Generated,
    Fallback { reason: FallbackReason },
    Boilerplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSection {
    pub section_type: String,
    pub title: String,
    pub order_index: u32,
    pub content: String,
    pub word_count: usize,
    pub source: SectionSource,
    pub placeholders_detected: bool,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedSection {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, SectionSource::Fallback { .. })
    }
}

/// Everything a section prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct WriterContext<'a> {
    pub intake: &'a BusinessIntake,
    pub model: &'a FinancialModel,
    pub research: &'a ResearchPack,
}

pub struct ContentWriter {
    generator: Arc<dyn TextGenerator>,
}

impl ContentWriter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// All sections for the intake's plan purpose, in order.
    pub async fn generate_all_sections(&self, ctx: WriterContext<'_>) -> Vec<GeneratedSection> {
        let purpose = ctx.intake.plan_purpose;
        let definitions = templates::all_sections(purpose);

        info!(
            purpose = %purpose,
            sections = definitions.len(),
            generator = self.generator.name(),
            "Generating plan sections"
        );

        let mut sections = Vec::with_capacity(definitions.len());
        for def in &definitions {
            sections.push(self.generate_section(def, ctx).await);
        }

        let fallbacks = sections.iter().filter(|s| s.is_fallback()).count();
        if fallbacks > 0 {
            warn!(fallbacks, "Some sections fell back to placeholder content");
        }

        sections
    }

    /// One section. Never fails: generator errors become a fallback section.
    pub async fn generate_section(
        &self,
        def: &SectionDefinition,
        ctx: WriterContext<'_>,
    ) -> GeneratedSection {
        let template = templates::template_for(ctx.intake.plan_purpose);
        let request = GenerationRequest {
            purpose: GenerationPurpose::Section(def.section_type.clone()),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(def, template, ctx),
        };

        match self.generator.generate(&request).await {
            Ok(generated) => {
                let cleaned = clean_output(&generated.content);
                if cleaned.is_empty() {
                    warn!(section = %def.section_type, "Generator returned no usable text");
                    return fallback_section(def, FallbackReason::EmptyOutput);
                }

                let placeholders_detected = contains_placeholders(&cleaned);
                if placeholders_detected {
                    warn!(section = %def.section_type, "Section contains placeholders after cleaning");
                }

                GeneratedSection {
                    section_type: def.section_type.clone(),
                    title: def.title.clone(),
                    order_index: def.order_index,
                    word_count: word_count(&cleaned),
                    content: cleaned,
                    source: SectionSource::Generated,
                    placeholders_detected,
                    generated_at: Utc::now(),
                }
            }
            Err(e) => {
                error!(section = %def.section_type, error = %e, "Section generation failed");
                fallback_section(def, FallbackReason::GenerationFailed)
            }
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn fallback_section(def: &SectionDefinition, reason: FallbackReason) -> GeneratedSection {
    let content = format!(
        "This section could not be generated automatically.\n\nTo complete your {}, please provide additional details or regenerate this section from the plan editor.",
        def.title
    );

    GeneratedSection {
        section_type: def.section_type.clone(),
        title: def.title.clone(),
        order_index: def.order_index,
        word_count: word_count(&content),
        content,
        source: SectionSource::Fallback { reason },
        placeholders_detected: false,
        generated_at: Utc::now(),
    }
}

/// Strip placeholder tokens and leaked error text; keep paragraph breaks.
pub fn clean_output(text: &str) -> String {
    let mut cleaned = text.replace("\r\n", "\n");

    for pattern in REMOVAL_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    let mut lines: Vec<String> = Vec::new();
    for line in cleaned.lines() {
        let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
        // At most one blank line between paragraphs
        if normalized.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(normalized);
    }

    lines.join("\n").trim().to_string()
}

pub fn contains_placeholders(text: &str) -> bool {
    let upper = text.to_uppercase();
    PLACEHOLDER_MARKERS.iter().any(|m| upper.contains(m))
}

fn build_prompt(def: &SectionDefinition, template: &TemplateConfig, ctx: WriterContext<'_>) -> String {
    let intake = ctx.intake;
    let model = ctx.model;
    let market = &ctx.research.market_data;
    let opex = &intake.operating_expenses;

    let guidance = templates::plan_guidance(intake.plan_purpose, &def.section_type);
    let name = &intake.business_name;
    let source = market.market_size_source.as_deref().unwrap_or("market research");

    let net_profit = |year: u32| model.year(year).map(|p| p.net_profit).unwrap_or(0.0);
    let (gross_profit_y1, opex_y1) = model
        .first_year()
        .map(|p| (p.gross_profit, p.total_opex))
        .unwrap_or((0.0, 0.0));

    let revenue_lines: String = model
        .pnl_annual
        .iter()
        .map(|p| format!("• Year {}: £{}\n", p.year, gbp(p.revenue)))
        .collect();

    let custom_lines: String = opex
        .custom
        .iter()
        .map(|c| format!("• {}: £{}\n", c.name, gbp(c.amount)))
        .collect();

    let roi = match model.kpis.roi_year1_percent {
        Some(roi) => format!("{:.1}%", roi),
        None => "not applicable (no starting capital)".to_string(),
    };

    format!(
        "{rules}

CRITICAL INSTRUCTIONS:
1. Use ONLY the data provided below - NO hard-coded examples or generic companies
2. Reference \"{name}\" specifically throughout (not \"the business\" or \"the company\")
3. Use EXACT numbers from financial projections - verify every figure
4. Write for {template_name} with {tone} tone
5. Emphasize: {emphasis}
6. Apply plan-specific framing: {guidance}

TASK: {instructions}

Target: {min}-{max} words.

===== BUSINESS DATA =====

BUSINESS IDENTITY:
• Business Name: {name}
• Industry/Sector: {industry}
• Location: {location}
• Business Description: {description}
• Unique Value Proposition: {uvp}
• Target Customers: {customers}

REVENUE MODEL:
• Revenue Streams: {streams}
• Pricing: £{price:.2} per unit
• Volume: {units} units/month
• Starting Capital: £{capital}

MARKET INTELLIGENCE:
• Market Size: £{market_size} ({source}, {market_date})
• Market Growth Rate: {growth:.1}% annually ({growth_source})

FINANCIAL PROJECTIONS (deterministic engine):
Revenue Trajectory:
{revenue_lines}
Profitability:
• Gross Profit Y1: £{gross_profit_y1}
• Net Profit Y1: £{net_profit_y1}
• Net Profit Y3: £{net_profit_y3}

Key Metrics:
• Gross Margin: {gross_margin:.1}%
• Net Margin: {net_margin:.1}%
• ROI Year 1: {roi}
• Break-even: {be_units} units / £{be_revenue} revenue per month

OPERATING EXPENSES (Monthly, user-declared):
• Salaries/Wages: £{salaries}
• Marketing/Advertising: £{marketing}
• Software/Tools: £{software}
• Hosting/Domain: £{hosting}
• Workspace/Utilities: £{workspace}
• Miscellaneous: £{misc}
{custom_lines}• TOTAL Annual OpEx Y1: £{opex_y1}

TEAM:
• Team Size: {team} people

===== END BUSINESS DATA =====

MANDATORY RULES:
- Use these EXACT numbers in your narrative
- Cite data sources where mentioned (e.g., \"According to {source}...\")
- NO PLACEHOLDERS like [NAME]
- ALL figures must come from the data above
",
        rules = ZERO_HALLUCINATION_PROMPT,
        name = name,
        template_name = template.template_name,
        tone = template.tone,
        emphasis = template.emphasis,
        guidance = guidance,
        instructions = def.instructions,
        min = def.min_words,
        max = def.max_words,
        industry = intake.industry,
        location = intake.location(),
        description = or_na(&intake.business_description),
        uvp = or_na(&intake.unique_value_proposition),
        customers = or_na(&intake.target_customers),
        streams = if intake.revenue_model.is_empty() {
            "N/A".to_string()
        } else {
            intake.revenue_model.join(", ")
        },
        price = intake.price_per_unit,
        units = intake.units_per_month,
        capital = gbp(intake.starting_capital),
        market_size = gbp(market.market_size_gbp),
        source = source,
        market_date = market.market_size_timestamp.as_deref().unwrap_or("recent"),
        growth = market.growth_rate_percent,
        growth_source = market.growth_rate_source.as_deref().unwrap_or("N/A"),
        revenue_lines = revenue_lines,
        gross_profit_y1 = gbp(gross_profit_y1),
        net_profit_y1 = gbp(net_profit(1)),
        net_profit_y3 = gbp(net_profit(3)),
        gross_margin = model.kpis.gross_margin_percent,
        net_margin = model.kpis.net_margin_percent,
        roi = roi,
        be_units = model.break_even.break_even_units_monthly,
        be_revenue = gbp(model.break_even.break_even_revenue_monthly),
        salaries = gbp(opex.salaries),
        marketing = gbp(opex.marketing),
        software = gbp(opex.software_tools),
        hosting = gbp(opex.hosting_domain),
        workspace = gbp(opex.workspace_utilities),
        misc = gbp(opex.miscellaneous),
        custom_lines = custom_lines,
        opex_y1 = gbp(opex_y1),
        team = intake.team_size,
    )
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Whole pounds with thousands separators, e.g. `1,234,567`.
pub(crate) fn gbp(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::BenchmarkSet;
    use crate::error::PipelineError;
    use crate::financial::generate_financial_model;
    use crate::generation::{GeneratedText, StaticTextGenerator};
    use crate::models::fixtures::coffee_shop;
    use crate::models::PlanPurpose;
    use crate::research::FixtureResearchSource;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> crate::Result<GeneratedText> {
            Err(PipelineError::LlmError("quota exhausted".to_string()))
        }
    }

    /// Returns canned text and remembers the prompts it saw.
    struct RecordingGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> crate::Result<GeneratedText> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(GeneratedText {
                content: self.reply.clone(),
                confidence: 0.9,
            })
        }
    }

    fn fixtures() -> (BusinessIntake, FinancialModel, ResearchPack) {
        let intake = coffee_shop();
        let model = generate_financial_model(&intake, &BenchmarkSet::default());
        let pack = FixtureResearchSource::build_pack("food_beverage_cafe", "GB", Utc::now());
        (intake, model, pack)
    }

    #[test]
    fn test_clean_output_strips_placeholders_and_errors() {
        let raw = "Welcome to [BUSINESS_NAME].\n\n\n\nWe   use DATA_PACK figures.\nError: upstream timeout\nRevenue is {FINANCIAL_DATA} strong.";
        let cleaned = clean_output(raw);

        assert_eq!(cleaned, "Welcome to .\n\nWe use figures.\n\nRevenue is strong.");
        assert!(!contains_placeholders(&cleaned));
    }

    #[test]
    fn test_contains_placeholders_is_case_insensitive() {
        assert!(contains_placeholders("see intake_data above"));
        assert!(!contains_placeholders("A clean paragraph."));
    }

    #[test]
    fn test_gbp_grouping() {
        assert_eq!(gbp(0.0), "0");
        assert_eq!(gbp(999.4), "999");
        assert_eq!(gbp(207_000.0), "207,000");
        assert_eq!(gbp(-1_234_567.0), "-1,234,567");
    }

    #[tokio::test]
    async fn test_generator_failure_becomes_fallback() {
        let (intake, model, pack) = fixtures();
        let writer = ContentWriter::new(Arc::new(FailingGenerator));
        let ctx = WriterContext { intake: &intake, model: &model, research: &pack };

        let def = templates::section_definition(PlanPurpose::Loan, "repayment_plan").unwrap();
        let section = writer.generate_section(&def, ctx).await;

        assert_eq!(
            section.source,
            SectionSource::Fallback { reason: FallbackReason::GenerationFailed }
        );
        assert!(section.content.contains("Repayment Plan & Affordability"));
        assert_eq!(section.order_index, 13);
    }

    #[tokio::test]
    async fn test_empty_output_becomes_fallback() {
        let (intake, model, pack) = fixtures();
        let generator = RecordingGenerator {
            reply: "  [DATA_PACK]  ".to_string(),
            prompts: Mutex::new(vec![]),
        };
        let writer = ContentWriter::new(Arc::new(generator));
        let ctx = WriterContext { intake: &intake, model: &model, research: &pack };

        let def = templates::section_definition(PlanPurpose::Loan, "team").unwrap();
        let section = writer.generate_section(&def, ctx).await;

        assert_eq!(
            section.source,
            SectionSource::Fallback { reason: FallbackReason::EmptyOutput }
        );
    }

    #[tokio::test]
    async fn test_prompt_carries_engine_figures() {
        let (intake, model, pack) = fixtures();
        let generator = Arc::new(RecordingGenerator {
            reply: "Sarah's Coffee House projects steady growth.".to_string(),
            prompts: Mutex::new(vec![]),
        });
        let writer = ContentWriter::new(generator.clone());
        let ctx = WriterContext { intake: &intake, model: &model, research: &pack };

        let def = templates::section_definition(PlanPurpose::Loan, "financial_projections").unwrap();
        let section = writer.generate_section(&def, ctx).await;

        assert_eq!(section.source, SectionSource::Generated);
        assert_eq!(section.word_count, 6);

        let prompts = generator.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("Sarah's Coffee House"));
        assert!(prompt.contains("• Year 1: £180,000"));
        assert!(prompt.contains("• insurance: £150"));
        assert!(prompt.contains("UK Start-Up Loan Application"));
        assert!(prompt.contains("loan repayment schedule"));
    }

    #[tokio::test]
    async fn test_all_sections_in_template_order() {
        let (intake, model, pack) = fixtures();
        let writer = ContentWriter::new(Arc::new(StaticTextGenerator::new()));
        let ctx = WriterContext { intake: &intake, model: &model, research: &pack };

        let sections = writer.generate_all_sections(ctx).await;

        assert_eq!(sections.len(), 15);
        assert!(sections.windows(2).all(|w| w[0].order_index < w[1].order_index));
        assert!(sections.iter().all(|s| s.source == SectionSource::Generated));
    }
}
