//! The result envelope for one generation run

use crate::compliance::ComplianceReport;
use crate::enrichment::EnrichmentData;
use crate::financial::FinancialModel;
use crate::research::ResearchPack;
use crate::validation::ValidationReport;
use crate::writer::GeneratedSection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const PIPELINE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Intake,
    Research,
    Validation,
    Financial,
    Enrichment,
    Content,
    Compliance,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Intake => "intake",
            PipelineStage::Research => "research",
            PipelineStage::Validation => "validation",
            PipelineStage::Financial => "financial",
            PipelineStage::Enrichment => "enrichment",
            PipelineStage::Content => "content",
            PipelineStage::Compliance => "compliance",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    Timeout,
    ValidationFailed,
    StageFailed,
    InvalidInput,
}

impl FailureCode {
    /// Caller-facing error string for each failure kind.
    pub fn message(&self) -> &'static str {
        match self {
            FailureCode::Timeout => "Pipeline timeout",
            FailureCode::ValidationFailed => "Data validation failed",
            FailureCode::StageFailed => "Pipeline execution failed",
            FailureCode::InvalidInput => "Invalid intake",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineFailure {
    pub code: FailureCode,
    pub stage: PipelineStage,
    pub error: String,
    pub details: String,
}

impl PipelineFailure {
    pub fn new(code: FailureCode, stage: PipelineStage, details: impl Into<String>) -> Self {
        Self {
            code,
            stage,
            error: code.message().to_string(),
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub pipeline_version: String,
    pub input_fingerprint: Option<String>,
    pub model_fingerprint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: PipelineStatus,
    pub failure: Option<PipelineFailure>,
    pub research_pack: Option<ResearchPack>,
    pub validation_report: Option<ValidationReport>,
    pub financial_model: Option<FinancialModel>,
    pub enrichment: Option<EnrichmentData>,
    pub sections: Option<Vec<GeneratedSection>>,
    pub compliance_report: Option<ComplianceReport>,
    pub generation_metadata: GenerationMetadata,
    /// Ordered, human-readable trace of the run
    pub stage_log: Vec<String>,
}

impl PipelineResult {
    pub(crate) fn started(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        input_fingerprint: Option<String>,
    ) -> Self {
        Self {
            status: PipelineStatus::Failed,
            failure: None,
            research_pack: None,
            validation_report: None,
            financial_model: None,
            enrichment: None,
            sections: None,
            compliance_report: None,
            generation_metadata: GenerationMetadata {
                run_id,
                started_at,
                completed_at: started_at,
                duration_seconds: 0.0,
                pipeline_version: PIPELINE_VERSION.to_string(),
                input_fingerprint,
                model_fingerprint: None,
            },
            stage_log: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == PipelineStatus::Complete
    }

    pub fn failure_code(&self) -> Option<FailureCode> {
        self.failure.as_ref().map(|f| f.code)
    }
}
