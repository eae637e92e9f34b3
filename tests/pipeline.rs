use async_trait::async_trait;
use business_plan_pipeline::{
    config::StageTimeouts,
    enrichment::{DegradeReason, EnrichmentStatus},
    generation::{GeneratedText, GenerationPurpose, GenerationRequest, StaticTextGenerator, TextGenerator},
    models::{CustomExpense, OperatingExpenses},
    pipeline::{FailureCode, PipelineStage},
    research::{FixtureResearchSource, ResearchPack, ResearchSource},
    validation::ValidationStatus,
    BusinessIntake, PipelineConfig, PipelineError, PipelineOrchestrator, PipelineStatus,
    PlanPurpose,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

//
// ================= Test doubles =================
//

struct FailingResearch;

#[async_trait]
impl ResearchSource for FailingResearch {
    async fn fetch_market_data(
        &self,
        _industry: &str,
        _location: &str,
        _intake: &BusinessIntake,
    ) -> business_plan_pipeline::Result<ResearchPack> {
        Err(PipelineError::ResearchError("statistics API returned 503".to_string()))
    }
}

struct SlowResearch(Duration);

#[async_trait]
impl ResearchSource for SlowResearch {
    async fn fetch_market_data(
        &self,
        industry: &str,
        location: &str,
        _intake: &BusinessIntake,
    ) -> business_plan_pipeline::Result<ResearchPack> {
        tokio::time::sleep(self.0).await;
        Ok(FixtureResearchSource::build_pack(industry, location, Utc::now()))
    }
}

/// Market data dated two years ago.
struct StaleResearch;

#[async_trait]
impl ResearchSource for StaleResearch {
    async fn fetch_market_data(
        &self,
        industry: &str,
        location: &str,
        _intake: &BusinessIntake,
    ) -> business_plan_pipeline::Result<ResearchPack> {
        let mut pack = FixtureResearchSource::build_pack(industry, location, Utc::now());
        let old = (Utc::now() - ChronoDuration::days(730)).format("%Y-%m-%d").to_string();
        pack.market_data.market_size_timestamp = Some(old);
        Ok(pack)
    }
}

/// Fails every SWOT / competitor request; answers sections normally.
struct BrokenEnrichment;

#[async_trait]
impl TextGenerator for BrokenEnrichment {
    async fn generate(&self, request: &GenerationRequest) -> business_plan_pipeline::Result<GeneratedText> {
        match request.purpose {
            GenerationPurpose::Section(_) => StaticTextGenerator::new().generate(request).await,
            _ => Err(PipelineError::LlmError("rate limited".to_string())),
        }
    }
}

struct SlowGenerator(Duration);

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, request: &GenerationRequest) -> business_plan_pipeline::Result<GeneratedText> {
        tokio::time::sleep(self.0).await;
        StaticTextGenerator::new().generate(request).await
    }
}

/// Every call fails.
struct DownGenerator;

#[async_trait]
impl TextGenerator for DownGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> business_plan_pipeline::Result<GeneratedText> {
        Err(PipelineError::LlmError("connection refused".to_string()))
    }
}

//
// ================= Fixtures =================
//

fn intake(purpose: PlanPurpose) -> BusinessIntake {
    BusinessIntake {
        business_name: "Sarah's Coffee House".to_string(),
        industry: "food_beverage_cafe".to_string(),
        location_city: "London".to_string(),
        location_country: "GB".to_string(),
        business_description: "Specialty coffee shop with ethically sourced beans".to_string(),
        unique_value_proposition: "Direct trade relationships with farmers".to_string(),
        target_customers: "Young professionals, students, remote workers".to_string(),
        revenue_model: vec!["product_sales".to_string()],
        starting_capital: 50_000.0,
        monthly_revenue_estimate: 15_000.0,
        price_per_unit: 4.50,
        units_per_month: 3_000,
        operating_expenses: OperatingExpenses {
            salaries: 4_000.0,
            software_tools: 100.0,
            hosting_domain: 20.0,
            marketing: 500.0,
            workspace_utilities: 2_000.0,
            miscellaneous: 380.0,
            custom: vec![CustomExpense {
                name: "insurance".to_string(),
                amount: 150.0,
            }],
        },
        team_size: 3,
        plan_purpose: purpose,
    }
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        timeouts: StageTimeouts {
            research: Duration::from_millis(100),
            swot: Duration::from_millis(100),
            competitors: Duration::from_millis(100),
            content: Duration::from_millis(500),
            ..StageTimeouts::default()
        },
        ..PipelineConfig::default()
    }
}

fn static_generator() -> Arc<dyn TextGenerator> {
    Arc::new(StaticTextGenerator::new())
}

//
// ================= Mandatory stages =================
//

#[tokio::test]
async fn research_failure_fails_the_run() {
    let orchestrator =
        PipelineOrchestrator::new(Arc::new(FailingResearch), static_generator(), fast_config());

    let result = orchestrator.run(&intake(PlanPurpose::Generic)).await;

    assert_eq!(result.status, PipelineStatus::Failed);
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.code, FailureCode::StageFailed);
    assert_eq!(failure.stage, PipelineStage::Research);
    assert_eq!(failure.error, "Pipeline execution failed");
    assert!(failure.details.contains("503"));
    assert!(result.financial_model.is_none());
}

#[tokio::test]
async fn research_timeout_reports_pipeline_timeout() {
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(SlowResearch(Duration::from_secs(2))),
        static_generator(),
        fast_config(),
    );

    let result = orchestrator.run(&intake(PlanPurpose::Generic)).await;

    assert_eq!(result.status, PipelineStatus::Failed);
    assert_eq!(result.failure_code(), Some(FailureCode::Timeout));
    assert_eq!(result.failure.as_ref().unwrap().error, "Pipeline timeout");
    assert!(result.research_pack.is_none());
}

#[tokio::test]
async fn stale_research_stops_at_validation_with_report() {
    let orchestrator =
        PipelineOrchestrator::new(Arc::new(StaleResearch), static_generator(), fast_config());

    let result = orchestrator.run(&intake(PlanPurpose::Loan)).await;

    assert_eq!(result.status, PipelineStatus::Failed);
    assert_eq!(result.failure_code(), Some(FailureCode::ValidationFailed));
    assert_eq!(result.failure.as_ref().unwrap().error, "Data validation failed");

    let report = result.validation_report.as_ref().unwrap();
    assert_eq!(report.status, ValidationStatus::Failed);
    assert_eq!(report.errors[0].field, "market_size_timestamp");

    assert!(result.research_pack.is_some());
    assert!(result.financial_model.is_none());
    assert!(result.sections.is_none());
}

#[tokio::test]
async fn content_timeout_fails_the_run() {
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FixtureResearchSource),
        Arc::new(SlowGenerator(Duration::from_millis(200))),
        fast_config(),
    )
    .with_enrichment_generator(static_generator());

    let result = orchestrator.run(&intake(PlanPurpose::Generic)).await;

    assert_eq!(result.status, PipelineStatus::Failed);
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.code, FailureCode::Timeout);
    assert_eq!(failure.stage, PipelineStage::Content);
    // Earlier stages keep their output
    assert!(result.financial_model.is_some());
    assert!(result.enrichment.is_some());
    assert!(result.compliance_report.is_none());
}

#[tokio::test]
async fn generator_outage_falls_back_per_section() {
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FixtureResearchSource),
        Arc::new(DownGenerator),
        fast_config(),
    );

    let result = orchestrator.run(&intake(PlanPurpose::Investor)).await;

    assert_eq!(result.status, PipelineStatus::Complete);
    let sections = result.sections.as_ref().unwrap();
    assert_eq!(sections.len(), 19);
    assert!(sections.iter().all(|s| s.is_fallback()));

    let report = result.compliance_report.as_ref().unwrap();
    assert_eq!(report.failed_count, 3);
}

//
// ================= Optional stages =================
//

#[tokio::test]
async fn enrichment_failure_keeps_run_complete() {
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FixtureResearchSource),
        Arc::new(BrokenEnrichment),
        fast_config(),
    );

    let result = orchestrator.run(&intake(PlanPurpose::Loan)).await;

    assert_eq!(result.status, PipelineStatus::Complete);
    assert!(result.failure.is_none());

    let enrichment = result.enrichment.as_ref().unwrap();
    assert!(enrichment.swot.is_degraded());
    assert!(enrichment.swot.data.is_empty());
    assert!(matches!(
        &enrichment.competitors.status,
        EnrichmentStatus::Degraded { reason: DegradeReason::Failed(msg) } if msg.contains("rate limited")
    ));
    assert!(enrichment.competitors.data.competitors.is_empty());
}

#[tokio::test]
async fn enrichment_timeout_keeps_run_complete() {
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FixtureResearchSource),
        static_generator(),
        fast_config(),
    )
    .with_enrichment_generator(Arc::new(SlowGenerator(Duration::from_secs(2))));

    let result = orchestrator.run(&intake(PlanPurpose::VisaStartup)).await;

    assert_eq!(result.status, PipelineStatus::Complete);
    let enrichment = result.enrichment.unwrap();
    assert_eq!(
        enrichment.swot.status,
        EnrichmentStatus::Degraded { reason: DegradeReason::TimedOut }
    );
    assert_eq!(
        enrichment.competitors.status,
        EnrichmentStatus::Degraded { reason: DegradeReason::TimedOut }
    );
}

//
// ================= Reproducibility =================
//

#[tokio::test]
async fn identical_intake_gives_identical_model() {
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FixtureResearchSource),
        static_generator(),
        PipelineConfig::default(),
    );
    let intake = intake(PlanPurpose::VisaInnovator);

    let (a, b) = tokio::join!(orchestrator.run(&intake), orchestrator.run(&intake));

    assert_ne!(a.generation_metadata.run_id, b.generation_metadata.run_id);
    assert_eq!(a.financial_model, b.financial_model);
    assert!(a.generation_metadata.input_fingerprint.is_some());
    assert_eq!(
        a.generation_metadata.input_fingerprint,
        b.generation_metadata.input_fingerprint
    );
    assert_eq!(
        a.generation_metadata.model_fingerprint,
        b.generation_metadata.model_fingerprint
    );

    let model = a.financial_model.unwrap();
    assert_eq!(model.pnl_annual.len(), 5);
    assert_eq!(model.pnl_annual[0].revenue, 180_000.0);
    assert_eq!(model.pnl_annual[1].revenue, 207_000.0);
}

#[tokio::test]
async fn envelope_round_trips_through_json() {
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(FixtureResearchSource),
        static_generator(),
        PipelineConfig::default(),
    );

    let result = orchestrator.run(&intake(PlanPurpose::Loan)).await;
    let json = tokio_test::assert_ok!(serde_json::to_string(&result));
    let parsed: serde_json::Value = tokio_test::assert_ok!(serde_json::from_str(&json));

    assert_eq!(parsed["status"], "complete");
    assert_eq!(parsed["compliance_report"]["template_id"], "UK_STARTUP_LOAN");
    assert_eq!(parsed["compliance_report"]["overall_status"], "compliant");
    assert!(parsed["failure"].is_null());
}
