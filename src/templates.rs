//! Section template registry
//!
//! Every plan shares 11 base sections. Each plan purpose layers instruction
//! overrides and purpose-specific additional sections on top.

use crate::models::PlanPurpose;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionDefinition {
    pub section_type: String,
    pub title: String,
    pub order_index: u32,
    pub instructions: String,
    pub min_words: u32,
    pub max_words: u32,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub template_id: String,
    pub template_name: String,
    pub tone: String,
    pub emphasis: String,
    pub base_sections: Vec<SectionDefinition>,
    pub additional_sections: Vec<SectionDefinition>,
    /// section_type → replacement instructions
    pub section_overrides: HashMap<String, String>,
}

fn section(
    section_type: &str,
    title: &str,
    order_index: u32,
    instructions: &str,
    min_words: u32,
    max_words: u32,
) -> SectionDefinition {
    SectionDefinition {
        section_type: section_type.to_string(),
        title: title.to_string(),
        order_index,
        instructions: instructions.to_string(),
        min_words,
        max_words,
        required: true,
    }
}

fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn base_sections() -> Vec<SectionDefinition> {
    vec![
        section("executive_summary", "Executive Summary", 0,
            "Concise overview of business, market opportunity, financial highlights, and key strengths.", 200, 300),
        section("company_overview", "Company Overview", 1,
            "Company description, mission, vision, legal structure, location, and founding story.", 200, 300),
        section("market_analysis", "Market Analysis", 2,
            "Market size, growth trends, target market segments, and market opportunity.", 200, 300),
        section("products_services", "Products & Services", 3,
            "Detailed description of products/services, features, benefits, and unique value proposition.", 200, 300),
        section("business_model", "Business Model", 4,
            "Revenue streams, pricing strategy, cost structure, and how the business makes money.", 200, 300),
        section("marketing_strategy", "Marketing & Sales Strategy", 5,
            "Customer acquisition channels, marketing tactics, sales process, and growth strategy.", 200, 300),
        section("operations_plan", "Operations Plan", 6,
            "Day-to-day operations, key processes, technology stack, suppliers, and operational infrastructure.", 200, 300),
        section("team", "Team & Roles", 7,
            "Founder and team backgrounds, roles, relevant experience, and organizational structure.", 200, 300),
        section("financial_projections", "Financial Forecasts", 8,
            "Revenue projections, operating expenses, profitability timeline, and key financial metrics.", 200, 300),
        section("risk_analysis", "Risk Analysis", 9,
            "Key business risks, market risks, competitive risks, and mitigation strategies.", 200, 250),
        section("appendix", "Appendix", 10,
            "Data sources, assumptions, supporting documents, and references.", 100, 200),
    ]
}

fn generic_template() -> TemplateConfig {
    TemplateConfig {
        template_id: "generic".to_string(),
        template_name: "General Business Plan".to_string(),
        tone: "neutral, professional".to_string(),
        emphasis: "clear business model, market opportunity, realistic projections".to_string(),
        base_sections: base_sections(),
        additional_sections: vec![],
        section_overrides: HashMap::new(),
    }
}

fn loan_template() -> TemplateConfig {
    TemplateConfig {
        template_id: "loan".to_string(),
        template_name: "UK Start-Up Loan Application".to_string(),
        tone: "pragmatic, cashflow-focused, viability-driven".to_string(),
        emphasis: "repayment capacity, cash flow, break-even timeline, low risk, business viability".to_string(),
        base_sections: base_sections(),
        section_overrides: overrides(&[
            ("executive_summary", "Overview highlighting loan request amount, business viability, and repayment capacity. Emphasize cashflow sustainability and break-even timeline."),
            ("financial_projections", "Detailed financial projections emphasizing positive cash flow, break-even analysis, and loan repayment schedule. Show affordability of repayments."),
        ]),
        additional_sections: vec![
            section("loan_request", "Loan Request & Funding Breakdown", 11,
                "Exact loan amount requested, detailed breakdown of how funds will be used (equipment, marketing, working capital, etc.). Be specific with amounts.", 150, 250),
            section("survival_budget", "12-Month Survival Budget", 12,
                "Founder's personal living costs and how they will be covered during the first 12 months. Show business can sustain founder.", 150, 200),
            section("repayment_plan", "Repayment Plan & Affordability", 13,
                "Detailed loan repayment schedule based on projected cash flows. Demonstrate affordability and ability to meet repayment obligations.", 200, 300),
            section("loan_eligibility", "Loan Eligibility & Compliance", 14,
                "Confirmation of eligibility criteria: UK-based business, business age, sector alignment. Reference Start-Up Loan guidance compliance.", 100, 150),
        ],
    }
}

fn visa_startup_template() -> TemplateConfig {
    TemplateConfig {
        template_id: "visa_startup".to_string(),
        template_name: "UK Start-Up Visa Plan".to_string(),
        tone: "innovation-focused, sustainable growth oriented, endorsement-aligned".to_string(),
        emphasis: "innovation, UK market opportunity, scalability, job creation, viability".to_string(),
        base_sections: base_sections(),
        section_overrides: overrides(&[
            ("executive_summary", "Emphasize the innovative concept, UK market viability, and scalability potential. Highlight how this business meets Start-Up Visa innovation criteria."),
            ("business_model", "Focus on UK market viability and sustainable revenue model. Demonstrate the business can operate successfully in the UK."),
            ("market_analysis", "Deep dive into UK market opportunity specifically. Show understanding of UK market dynamics and customer needs."),
        ]),
        additional_sections: vec![
            section("innovation_section", "Innovation", 11,
                "Detailed description of what makes this business innovative. Explain the novel approach, technology, process, or business model. Reference specific innovations.", 250, 350),
            section("viability_assessment", "Viability Assessment", 12,
                "Evidence that the business is viable in the UK market for at least 2 years. Include financial sustainability, market demand, and operational feasibility.", 200, 300),
            section("scalability_roadmap", "Scalability Roadmap", 13,
                "Clear plan for how the business will scale over time. Include growth milestones, expansion strategy, and long-term vision.", 200, 300),
            section("uk_job_creation", "UK Job Creation Plan", 14,
                "Projected job creation over 2-3 years. Include roles, timing, and contribution to UK economy.", 150, 250),
            section("visa_compliance_checklist", "Visa Compliance Checklist", 15,
                "Confirmation that the business meets all Start-Up Visa criteria: innovation, viability, scalability. Reference Home Office guidance.", 150, 200),
        ],
    }
}

fn visa_innovator_template() -> TemplateConfig {
    TemplateConfig {
        template_id: "visa_innovator".to_string(),
        template_name: "UK Innovator Founder Visa Plan".to_string(),
        tone: "high-growth oriented, investment-ready, innovation-leading".to_string(),
        emphasis: "significant innovation, scalability, viability, high-growth trajectory, UK job creation, IP strategy".to_string(),
        base_sections: base_sections(),
        section_overrides: overrides(&[
            ("executive_summary", "Strong innovation claim with high-growth narrative. Position as investment-ready opportunity with significant UK economic contribution potential."),
            ("business_model", "Demonstrate defensible business model with IP protection, technology moat, and long-term competitive advantage. Show path to market leadership."),
            ("market_analysis", "Include internationalization potential beyond UK. Show large addressable market and path to market dominance."),
            ("team", "Emphasize founder credentials, relevant expertise, track record, and capability to execute at scale. Highlight why this team can succeed."),
        ]),
        additional_sections: vec![
            section("innovation_ip_strategy", "Innovation & IP Strategy", 11,
                "Detailed innovation claim with IP protection strategy (patents, trademarks, trade secrets). Explain technology differentiation and defensibility.", 300, 400),
            section("high_growth_roadmap", "High-Growth Roadmap (3–5 Years)", 12,
                "Aggressive growth plan with clear milestones. Include scaling strategy, market expansion (UK and international), and path to significant revenue.", 250, 350),
            section("investment_readiness", "Investment Readiness Section", 13,
                "Demonstrate readiness for institutional investment. Include funding requirements, use of funds, traction achieved, and investor value proposition.", 250, 350),
            section("founder_credentials", "Founder Credentials & Capability", 14,
                "Deep dive into founder background, relevant experience, achievements, education, and why this team has the capability to execute successfully.", 250, 350),
            section("uk_job_creation_plan", "Job Creation & National Benefit", 15,
                "Detailed UK job creation projections (3-5 years). Include economic contribution, skills transfer, and benefits to UK economy beyond direct employment.", 200, 300),
            section("home_office_compliance", "Home Office Compliance Notes", 16,
                "Confirmation of meeting all Innovator Founder Visa criteria: innovation, viability, scalability, £50k+ funding requirement, endorsement alignment.", 150, 200),
        ],
    }
}

fn investor_template() -> TemplateConfig {
    TemplateConfig {
        template_id: "investor".to_string(),
        template_name: "Investor Pitch / Fundraising Plan".to_string(),
        tone: "investor-focused, traction-driven, return-oriented, aggressive growth".to_string(),
        emphasis: "TAM/SAM/SOM, traction, competitive moat, returns, exit strategy, unit economics".to_string(),
        base_sections: base_sections(),
        section_overrides: overrides(&[
            ("executive_summary", "Written as an investor pitch. Lead with problem/opportunity, solution, market size, traction, and investment ask. Make it compelling."),
            ("market_analysis", "Include detailed TAM/SAM/SOM analysis with market sizing. Show large, growing market with clear path to capture meaningful share."),
            ("products_services", "Focus on competitive advantage, moat, defensibility, and why customers will choose this solution. Include proof points if available."),
            ("business_model", "Emphasize unit economics, scalability, and path to profitability. Show attractive margins and capital efficiency."),
            ("team", "Highlight founder-market fit, relevant experience, advisory board, and why this team will win. Investors bet on teams."),
        ]),
        additional_sections: vec![
            section("problem_opportunity", "Problem & Opportunity", 11,
                "Clearly articulate the problem being solved and the market opportunity. Make it compelling and urgent. Show why now is the right time.", 200, 300),
            section("tam_sam_som", "TAM / SAM / SOM", 12,
                "Detailed market sizing: Total Addressable Market, Serviceable Addressable Market, Serviceable Obtainable Market. Include sources and assumptions.", 200, 300),
            section("traction_metrics", "Traction & Metrics", 13,
                "Current traction: users, revenue, partnerships, milestones achieved. If pre-revenue, show projected milestones and proof of concept.", 200, 300),
            section("go_to_market", "Go-To-Market Strategy", 14,
                "Detailed customer acquisition strategy with CAC analysis. Show clear, repeatable path to growth. Include key channels and tactics.", 200, 300),
            section("unit_economics", "Unit Economics", 15,
                "Breakdown of unit economics: CAC, LTV, LTV:CAC ratio, payback period, gross margins. Show business economics are attractive.", 200, 300),
            section("funding_ask", "Funding Ask + Use of Funds", 16,
                "Specific funding amount requested, use of funds breakdown (product, marketing, team, etc.), and milestones to be achieved with this capital.", 200, 300),
            section("exit_strategy", "Exit Strategy", 17,
                "Potential exit opportunities: acquisition targets, IPO potential, comparable exits. Show investor return opportunity.", 150, 250),
            section("investment_risks", "Investment Risk & Mitigation", 18,
                "Key investment risks (market, execution, competition) and mitigation strategies. Be honest but confident.", 200, 300),
        ],
    }
}

lazy_static! {
    static ref TEMPLATES: HashMap<PlanPurpose, TemplateConfig> = {
        let mut m = HashMap::new();
        m.insert(PlanPurpose::Generic, generic_template());
        m.insert(PlanPurpose::Loan, loan_template());
        m.insert(PlanPurpose::VisaStartup, visa_startup_template());
        m.insert(PlanPurpose::VisaInnovator, visa_innovator_template());
        m.insert(PlanPurpose::Investor, investor_template());
        m
    };

    static ref GENERIC: TemplateConfig = generic_template();
}

pub fn template_for(purpose: PlanPurpose) -> &'static TemplateConfig {
    TEMPLATES.get(&purpose).unwrap_or(&*GENERIC)
}

/// All sections for a plan purpose, overrides applied, sorted by order_index.
pub fn all_sections(purpose: PlanPurpose) -> Vec<SectionDefinition> {
    let config = template_for(purpose);

    let mut sections: Vec<SectionDefinition> = config
        .base_sections
        .iter()
        .chain(config.additional_sections.iter())
        .map(|s| apply_override(config, s))
        .collect();

    sections.sort_by_key(|s| s.order_index);
    sections
}

pub fn section_definition(purpose: PlanPurpose, section_type: &str) -> Option<SectionDefinition> {
    all_sections(purpose)
        .into_iter()
        .find(|s| s.section_type == section_type)
}

fn apply_override(config: &TemplateConfig, def: &SectionDefinition) -> SectionDefinition {
    match config.section_overrides.get(&def.section_type) {
        Some(instructions) => SectionDefinition {
            instructions: instructions.clone(),
            ..def.clone()
        },
        None => def.clone(),
    }
}

/// Plan-type framing appended to each section prompt.
pub fn plan_guidance(purpose: PlanPurpose, section_type: &str) -> &'static str {
    match purpose {
        PlanPurpose::Loan => match section_type {
            "executive_summary" => "Emphasize loan viability: repayment capacity, break-even timeline, and low-risk nature of the business.",
            "financial_projections" => "Focus on cash flow sustainability, loan repayment schedule, and affordability. Show clear path to profitability.",
            "business_model" => "Explain how the business generates consistent cash flow to meet loan obligations.",
            "market_analysis" => "Demonstrate stable market with predictable revenue opportunities.",
            "risk_analysis" => "Address financial risks and show mitigation strategies that protect loan repayment ability.",
            _ => "Frame content to demonstrate business viability and loan repayment capacity.",
        },
        PlanPurpose::VisaStartup => match section_type {
            "executive_summary" => "Lead with innovation claim, UK market opportunity, and scalability potential.",
            "business_model" => "Emphasize viability in the UK market and sustainable revenue generation over 2+ years.",
            "market_analysis" => "Deep focus on UK market specifically - size, trends, customer needs in UK context.",
            "products_services" => "Highlight what makes this innovative and how it meets UK market needs.",
            "operations_plan" => "Show practical feasibility of operating in the UK.",
            "team" => "Demonstrate capability to execute in the UK market.",
            "risk_analysis" => "Address UK-specific risks and mitigation.",
            _ => "Frame content to demonstrate innovation, UK viability, and scalability for visa endorsement.",
        },
        PlanPurpose::VisaInnovator => match section_type {
            "executive_summary" => "Strong innovation narrative with high-growth trajectory and investment readiness.",
            "business_model" => "Show defensible model with IP protection and path to market leadership.",
            "market_analysis" => "Large addressable market with internationalization potential beyond UK.",
            "products_services" => "Emphasize significant innovation, IP strategy, and competitive moat.",
            "operations_plan" => "Show scalable operations capable of high-growth execution.",
            "team" => "Deep focus on founder credentials, track record, and capability to execute at scale.",
            "financial_projections" => "Show aggressive but achievable growth trajectory suitable for institutional investment.",
            "risk_analysis" => "Address scaling risks with clear mitigation strategies.",
            _ => "Frame content for high-growth, investment-ready business with significant innovation.",
        },
        PlanPurpose::Investor => match section_type {
            "executive_summary" => "Write as compelling investor pitch: problem, solution, market size, traction, ask.",
            "market_analysis" => "Include TAM/SAM/SOM analysis, show large growing market with clear path to capture.",
            "business_model" => "Focus on unit economics, scalability, capital efficiency, and attractive margins.",
            "products_services" => "Emphasize competitive advantage, moat, and why customers will choose this solution.",
            "marketing_strategy" => "Show CAC analysis, clear GTM strategy, and repeatable customer acquisition.",
            "team" => "Highlight founder-market fit and why THIS team will win.",
            "financial_projections" => "Show path to profitability, attractive returns, and efficient use of capital.",
            "risk_analysis" => "Frame risks as manageable with clear mitigation - investors expect honesty.",
            _ => "Frame content for investor audience: emphasize returns, traction, and competitive moat.",
        },
        PlanPurpose::Generic => {
            "Write in neutral, professional tone suitable for general business planning purposes."
        }
    }
}
