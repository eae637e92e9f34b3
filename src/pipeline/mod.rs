//! Pipeline orchestrator
//!
//! RESEARCH → VALIDATE → FINANCIAL → ENRICH (optional) → CONTENT → COMPLIANCE
//!
//! Mandatory stages abort the run on error or timeout; enrichment degrades.
//! `run` never returns an error: every outcome is a [`PipelineResult`].

use crate::audit::{intake_fingerprint, model_fingerprint};
use crate::benchmarks::BenchmarkProvider;
use crate::compliance::{check_compliance, inject_boilerplate, map_purpose_to_template};
use crate::config::PipelineConfig;
use crate::enrichment::{self, CompetitorAnalyzer, SwotAnalyzer};
use crate::error::PipelineError;
use crate::financial::generate_financial_model_with_horizon;
use crate::generation::TextGenerator;
use crate::models::BusinessIntake;
use crate::research::ResearchSource;
use crate::validation::DataValidator;
use crate::writer::{ContentWriter, WriterContext};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub mod result;

pub use result::{
    FailureCode, GenerationMetadata, PipelineFailure, PipelineResult, PipelineStage,
    PipelineStatus, PIPELINE_VERSION,
};

type StageResult = std::result::Result<(), PipelineFailure>;

/// Coordinates one plan generation per `run` call. Holds no per-run state,
/// so a single orchestrator can serve concurrent runs.
pub struct PipelineOrchestrator {
    research: Arc<dyn ResearchSource>,
    writer: ContentWriter,
    swot: SwotAnalyzer,
    competitors: CompetitorAnalyzer,
    benchmarks: BenchmarkProvider,
    validator: DataValidator,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    pub fn new(
        research: Arc<dyn ResearchSource>,
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            research,
            writer: ContentWriter::new(generator.clone()),
            swot: SwotAnalyzer::new(generator.clone()),
            competitors: CompetitorAnalyzer::new(generator),
            benchmarks: BenchmarkProvider::new(),
            validator: DataValidator::new(),
            config,
        }
    }

    /// Use a separate generator for SWOT and competitor analysis.
    pub fn with_enrichment_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.swot = SwotAnalyzer::new(generator.clone());
        self.competitors = CompetitorAnalyzer::new(generator);
        self
    }

    pub fn with_benchmarks(mut self, benchmarks: BenchmarkProvider) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline for one intake.
    pub async fn run(&self, intake: &BusinessIntake) -> PipelineResult {
        let clock = Instant::now();
        let run_id = Uuid::new_v4();
        let mut result = PipelineResult::started(run_id, Utc::now(), intake_fingerprint(intake));

        info!(
            run_id = %run_id,
            business = %intake.business_name,
            purpose = %intake.plan_purpose,
            "Pipeline: starting generation"
        );
        result.stage_log.push(format!(
            "INPUT: {} ({} plan)",
            intake.business_name, intake.plan_purpose
        ));

        match self.execute(intake, &mut result).await {
            Ok(()) => {
                result.status = PipelineStatus::Complete;
                result.stage_log.push("COMPLETE: all mandatory stages succeeded".to_string());
            }
            Err(failure) => {
                error!(
                    run_id = %run_id,
                    stage = %failure.stage,
                    code = ?failure.code,
                    details = %failure.details,
                    "Pipeline failed"
                );
                result.stage_log.push(format!(
                    "FAILED: {} at {} stage ({})",
                    failure.error, failure.stage, failure.details
                ));
                result.status = PipelineStatus::Failed;
                result.failure = Some(failure);
            }
        }

        let meta = &mut result.generation_metadata;
        meta.completed_at = Utc::now();
        meta.duration_seconds = clock.elapsed().as_secs_f64();

        info!(
            run_id = %run_id,
            status = ?result.status,
            duration_secs = meta.duration_seconds,
            "Pipeline finished"
        );

        result
    }

    async fn execute(&self, intake: &BusinessIntake, result: &mut PipelineResult) -> StageResult {
        let timeouts = self.config.timeouts;

        // === INTAKE ===
        intake
            .validate()
            .map_err(|e| PipelineFailure::new(FailureCode::InvalidInput, PipelineStage::Intake, e.to_string()))?;

        // === RESEARCH ===
        debug!("Stage 1: research");
        let pack = bounded(
            PipelineStage::Research,
            timeouts.research,
            self.research
                .fetch_market_data(&intake.industry, &intake.location_country, intake),
        )
        .await?;
        result.stage_log.push(format!(
            "RESEARCH: market data for {} in {} ({} fetch errors)",
            pack.industry,
            pack.location,
            pack.fetch_errors.len()
        ));
        let pack = &*result.research_pack.insert(pack);

        // === VALIDATE ===
        debug!("Stage 2: validation");
        let started = Instant::now();
        let report = self.validator.validate(pack);
        check_budget(PipelineStage::Validation, timeouts.validation, started, &mut result.stage_log);

        result.stage_log.push(format!(
            "VALIDATE: {:?} ({} errors, {} warnings)",
            report.status,
            report.errors.len(),
            report.warnings.len()
        ));

        if report.is_failed() {
            let details = report
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            result.validation_report = Some(report);
            return Err(PipelineFailure::new(
                FailureCode::ValidationFailed,
                PipelineStage::Validation,
                details,
            ));
        }
        result.validation_report = Some(report);

        // === FINANCIAL ===
        debug!("Stage 3: financial engine");
        let started = Instant::now();
        let benchmarks = self.benchmarks.get(&intake.industry);
        let model =
            generate_financial_model_with_horizon(intake, &benchmarks, self.config.projection_horizon);
        check_budget(PipelineStage::Financial, timeouts.financial, started, &mut result.stage_log);

        result.generation_metadata.model_fingerprint = model_fingerprint(&model);
        result.stage_log.push(format!(
            "FINANCIAL: {}-year model, break-even {} units/month",
            model.pnl_annual.len(),
            model.break_even.break_even_units_monthly
        ));
        let model = &*result.financial_model.insert(model);

        // === ENRICH (optional) ===
        debug!("Stage 4: enrichment");
        let enrichment = enrichment::enrich(
            &self.swot,
            &self.competitors,
            intake,
            model,
            pack,
            timeouts.swot,
            timeouts.competitors,
        )
        .await;
        result.stage_log.push(format!(
            "ENRICH: swot {}, competitors {}",
            if enrichment.swot.is_degraded() { "degraded" } else { "complete" },
            if enrichment.competitors.is_degraded() { "degraded" } else { "complete" },
        ));
        result.enrichment = Some(enrichment);

        // === CONTENT ===
        debug!("Stage 5: content generation");
        let ctx = WriterContext {
            intake,
            model,
            research: pack,
        };
        let sections = bounded_infallible(
            PipelineStage::Content,
            timeouts.content,
            self.writer.generate_all_sections(ctx),
        )
        .await?;

        let fallbacks = sections.iter().filter(|s| s.is_fallback()).count();
        result.stage_log.push(format!(
            "CONTENT: {} sections ({} fallback)",
            sections.len(),
            fallbacks
        ));
        let sections = result.sections.insert(sections);

        // === COMPLIANCE ===
        debug!("Stage 6: compliance");
        let started = Instant::now();
        if let Some(injected) = inject_boilerplate(sections, intake, model) {
            result.stage_log.push(format!("COMPLIANCE: injected {} boilerplate", injected));
        }

        let template_id = map_purpose_to_template(intake.plan_purpose);
        let report = check_compliance(sections, model, template_id);
        check_budget(PipelineStage::Compliance, timeouts.compliance, started, &mut result.stage_log);

        result.stage_log.push(format!(
            "COMPLIANCE: {} {:?} ({}/{} checks passed, score {})",
            template_id,
            report.overall_status,
            report.passed_count,
            report.checks.len(),
            report.score
        ));
        result.compliance_report = Some(report);

        Ok(())
    }
}

/// Await a fallible stage under its budget.
async fn bounded<T, F>(stage: PipelineStage, budget: Duration, fut: F) -> Result<T, PipelineFailure>
where
    F: Future<Output = crate::Result<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(stage_failure(stage, e)),
        Err(_) => Err(stage_failure(stage, PipelineError::timeout(stage.as_str(), budget))),
    }
}

/// Await a stage that cannot fail except by running out of time.
async fn bounded_infallible<T, F>(stage: PipelineStage, budget: Duration, fut: F) -> Result<T, PipelineFailure>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(budget, fut)
        .await
        .map_err(|_| stage_failure(stage, PipelineError::timeout(stage.as_str(), budget)))
}

fn stage_failure(stage: PipelineStage, err: PipelineError) -> PipelineFailure {
    let code = if err.is_timeout() {
        FailureCode::Timeout
    } else {
        FailureCode::StageFailed
    };
    PipelineFailure::new(code, stage, err.to_string())
}

/// Synchronous stages are not preempted; an overrun is only reported.
fn check_budget(stage: PipelineStage, budget: Duration, started: Instant, log: &mut Vec<String>) {
    let elapsed = started.elapsed();
    if elapsed > budget {
        warn!(
            stage = %stage,
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = budget.as_millis() as u64,
            "Stage exceeded its time budget"
        );
        log.push(format!(
            "WARN: {} took {} ms (budget {} ms)",
            stage,
            elapsed.as_millis(),
            budget.as_millis()
        ));
    }
}
