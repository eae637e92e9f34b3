//! Business Plan Pipeline
//!
//! Generates a business plan from a structured intake:
//! - Deterministic, reproducible financial projections (no LLM involved)
//! - Research data validated for freshness and provenance
//! - Narrative sections from an injected text generator, with explicit fallbacks
//! - Optional SWOT / competitor enrichment that degrades instead of failing
//! - Template-driven compliance scoring
//!
//! PIPELINE:
//! RESEARCH → VALIDATE → FINANCIAL → ENRICH? → CONTENT → COMPLIANCE

pub mod audit;
pub mod benchmarks;
pub mod compliance;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod financial;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod research;
pub mod templates;
pub mod validation;
pub mod writer;

pub use error::{PipelineError, Result};

// Re-export common types
pub use config::PipelineConfig;
pub use financial::{generate_financial_model, FinancialModel};
pub use models::{BusinessIntake, OperatingExpenses, PlanPurpose};
pub use pipeline::{PipelineOrchestrator, PipelineResult, PipelineStatus};
