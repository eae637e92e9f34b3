//! Optional enrichment: SWOT and competitor analysis
//!
//! Both analyses are best-effort. A failure or timeout degrades to empty data
//! with the reason recorded and never fails the run.

use crate::error::PipelineError;
use crate::financial::FinancialModel;
use crate::generation::{GenerationPurpose, GenerationRequest, TextGenerator};
use crate::models::BusinessIntake;
use crate::research::ResearchPack;
use crate::writer::gbp;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const ANALYST_INSTRUCTION: &str =
    "You are a business analyst. Respond with JSON only. Base the analysis on the provided data only.";

//
// ================= Records =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwotAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompetitorProfile {
    pub name: String,
    pub description: Option<String>,
    pub market_position: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub pricing_strategy: Option<String>,
    pub market_share: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompetitorAnalysis {
    pub competitors: Vec<CompetitorProfile>,
    pub competitive_advantages: Vec<String>,
    pub market_positioning: String,
    pub competitive_threats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DegradeReason {
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Complete,
    Degraded { reason: DegradeReason },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentOutcome<T> {
    pub data: T,
    pub status: EnrichmentStatus,
}

impl<T: Default> EnrichmentOutcome<T> {
    pub fn complete(data: T) -> Self {
        Self {
            data,
            status: EnrichmentStatus::Complete,
        }
    }

    pub fn degraded(reason: DegradeReason) -> Self {
        Self {
            data: T::default(),
            status: EnrichmentStatus::Degraded { reason },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, EnrichmentStatus::Degraded { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentData {
    pub swot: EnrichmentOutcome<SwotAnalysis>,
    pub competitors: EnrichmentOutcome<CompetitorAnalysis>,
}

//
// ================= Markdown =================
//

fn numbered(out: &mut String, items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item);
    }
}

impl SwotAnalysis {
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.opportunities.is_empty()
            && self.threats.is_empty()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## SWOT Analysis\n");

        for (heading, items) in [
            ("Strengths", &self.strengths),
            ("Weaknesses", &self.weaknesses),
            ("Opportunities", &self.opportunities),
            ("Threats", &self.threats),
        ] {
            let _ = writeln!(out, "\n### {}", heading);
            numbered(&mut out, items);
        }

        out
    }
}

impl CompetitorAnalysis {
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Competitor Analysis\n\n### Main Competitors\n\n");

        for (i, c) in self.competitors.iter().enumerate() {
            let _ = writeln!(out, "#### {}. {}", i + 1, c.name);
            let position = if c.market_position.is_empty() { "N/A" } else { c.market_position.as_str() };
            let _ = writeln!(out, "**Market Position:** {}\n", position);

            for (label, items) in [("Strengths", &c.strengths), ("Weaknesses", &c.weaknesses)] {
                if items.is_empty() {
                    continue;
                }
                let _ = writeln!(out, "**{}:**", label);
                for item in items {
                    let _ = writeln!(out, "- {}", item);
                }
                out.push('\n');
            }

            if let Some(pricing) = &c.pricing_strategy {
                let _ = writeln!(out, "**Pricing Strategy:** {}\n", pricing);
            }
            if let Some(share) = &c.market_share {
                let _ = writeln!(out, "**Market Share:** {}\n", share);
            }
        }

        out.push_str("### Our Competitive Advantages\n\n");
        numbered(&mut out, &self.competitive_advantages);

        if !self.market_positioning.is_empty() {
            let _ = write!(out, "\n### Market Positioning\n\n{}\n", self.market_positioning);
        }

        out.push_str("\n### Competitive Threats\n\n");
        numbered(&mut out, &self.competitive_threats);

        out
    }
}

//
// ================= Analyzers =================
//

pub struct SwotAnalyzer {
    generator: Arc<dyn TextGenerator>,
}

impl SwotAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn analyze(
        &self,
        intake: &BusinessIntake,
        model: &FinancialModel,
        research: &ResearchPack,
    ) -> Result<SwotAnalysis> {
        let financial = model
            .first_year()
            .map(|y1| {
                format!(
                    "Year 1 Revenue: £{}, Net Profit: £{}.",
                    gbp(y1.revenue),
                    gbp(y1.net_profit)
                )
            })
            .unwrap_or_default();

        let prompt = format!(
            "Analyze the following business and generate a SWOT analysis.

{business}

FINANCIAL DATA:
{financial}

MARKET DATA:
{market}

Generate 4-6 items for each of STRENGTHS (internal), WEAKNESSES (internal),
OPPORTUNITIES (external) and THREATS (external).

Format the response as JSON with this exact structure:
{{
  \"strengths\": [\"...\"],
  \"weaknesses\": [\"...\"],
  \"opportunities\": [\"...\"],
  \"threats\": [\"...\"]
}}

Each item should be a concise statement specific to this business.",
            business = business_block(intake),
            financial = financial,
            market = market_block(research),
        );

        let request = GenerationRequest {
            purpose: GenerationPurpose::Swot,
            system_instruction: ANALYST_INSTRUCTION.to_string(),
            prompt,
        };

        let generated = self.generator.generate(&request).await?;
        let swot: SwotAnalysis = parse_json_payload(&generated.content)?;

        info!(business = %intake.business_name, "Generated SWOT analysis");
        Ok(swot)
    }
}

pub struct CompetitorAnalyzer {
    generator: Arc<dyn TextGenerator>,
}

impl CompetitorAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn analyze(
        &self,
        intake: &BusinessIntake,
        research: &ResearchPack,
    ) -> Result<CompetitorAnalysis> {
        let known: Vec<&str> = research
            .competitor_data
            .top_competitors
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        let known_line = if known.is_empty() {
            String::new()
        } else {
            format!("\nKnown competitors: {}", known.join(", "))
        };

        let prompt = format!(
            "Analyze the competitive landscape for the following business.

{business}

MARKET DATA:
{market}{known}

Generate:
1. COMPETITORS: 3-5 main competitors with name, market_position, strengths,
   weaknesses, pricing_strategy and market_share where known
2. COMPETITIVE ADVANTAGES: 3-5 ways this business differentiates
3. MARKET POSITIONING: how this business positions itself
4. COMPETITIVE THREATS: 3-4 main threats

Format the response as JSON with this exact structure:
{{
  \"competitors\": [{{ \"name\": \"...\", \"market_position\": \"...\", \"strengths\": [], \"weaknesses\": [], \"pricing_strategy\": \"...\", \"market_share\": \"...\" }}],
  \"competitive_advantages\": [\"...\"],
  \"market_positioning\": \"...\",
  \"competitive_threats\": [\"...\"]
}}",
            business = business_block(intake),
            market = market_block(research),
            known = known_line,
        );

        let request = GenerationRequest {
            purpose: GenerationPurpose::Competitors,
            system_instruction: ANALYST_INSTRUCTION.to_string(),
            prompt,
        };

        let generated = self.generator.generate(&request).await?;
        let analysis: CompetitorAnalysis = parse_json_payload(&generated.content)?;

        info!(
            business = %intake.business_name,
            competitors = analysis.competitors.len(),
            "Generated competitor analysis"
        );
        Ok(analysis)
    }
}

fn business_block(intake: &BusinessIntake) -> String {
    format!(
        "BUSINESS INFORMATION:
- Business Name: {}
- Industry: {}
- Location: {}
- Description: {}
- Unique Value Proposition: {}
- Target Customers: {}",
        intake.business_name,
        intake.industry,
        intake.location(),
        intake.business_description,
        intake.unique_value_proposition,
        intake.target_customers,
    )
}

fn market_block(research: &ResearchPack) -> String {
    let market = &research.market_data;
    format!(
        "Market size: £{} ({}); Growth rate: {:.1}%; Estimated competitors: {}",
        gbp(market.market_size_gbp),
        market.market_size_source.as_deref().unwrap_or("unsourced"),
        market.growth_rate_percent,
        research.competitor_data.competitor_count_estimate,
    )
}

/// Parse a JSON object, tolerating a surrounding ``` fence with an
/// optional `json` language tag. Missing keys take their defaults.
pub fn parse_json_payload<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let mut content = raw.trim();

    if content.starts_with("```") {
        content = content.split("```").nth(1).unwrap_or_default();
        content = content.strip_prefix("json").unwrap_or(content);
        content = content.trim();
    }

    serde_json::from_str(content)
        .map_err(|e| PipelineError::EnrichmentError(format!("Invalid analysis JSON: {}", e)))
}

//
// ================= Runner =================
//

/// Await an analysis under its budget, degrading on error or timeout.
pub async fn run_bounded<T, F>(label: &str, budget: Duration, fut: F) -> EnrichmentOutcome<T>
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(Ok(data)) => EnrichmentOutcome::complete(data),
        Ok(Err(e)) => {
            warn!(analysis = label, error = %e, "Enrichment failed, continuing without it");
            EnrichmentOutcome::degraded(DegradeReason::Failed(e.to_string()))
        }
        Err(_) => {
            warn!(analysis = label, budget_secs = budget.as_secs_f64(), "Enrichment timed out, continuing without it");
            EnrichmentOutcome::degraded(DegradeReason::TimedOut)
        }
    }
}

/// Run SWOT and competitor analysis concurrently, each under its own budget.
pub async fn enrich(
    swot: &SwotAnalyzer,
    competitors: &CompetitorAnalyzer,
    intake: &BusinessIntake,
    model: &FinancialModel,
    research: &ResearchPack,
    swot_budget: Duration,
    competitor_budget: Duration,
) -> EnrichmentData {
    let (swot, competitors) = tokio::join!(
        run_bounded("swot", swot_budget, swot.analyze(intake, model, research)),
        run_bounded(
            "competitors",
            competitor_budget,
            competitors.analyze(intake, research)
        ),
    );

    EnrichmentData { swot, competitors }
}
