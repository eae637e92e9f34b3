//! Research collaborator interface
//!
//! Market data is fetched by an external source with a fixed schema.
//! This crate ships a fixture source and a caching decorator only.

use crate::models::BusinessIntake;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub mod cache;
pub use cache::{CachingResearchSource, ResearchCache};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketData {
    pub market_size_gbp: f64,
    pub market_size_source: Option<String>,
    pub market_size_url: Option<String>,
    /// ISO date (`YYYY-MM-DD`) or RFC 3339 timestamp
    pub market_size_timestamp: Option<String>,
    pub growth_rate_percent: f64,
    pub growth_rate_source: Option<String>,
    pub growth_rate_url: Option<String>,
    pub growth_rate_timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitorRef {
    pub name: String,
    pub source: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompetitorData {
    pub top_competitors: Vec<CompetitorRef>,
    pub competitor_count_estimate: u64,
    pub competitor_count_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchPack {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub industry: String,
    pub location: String,
    pub market_data: MarketData,
    pub competitor_data: CompetitorData,
    #[serde(default)]
    pub missing_data: Vec<String>,
    #[serde(default)]
    pub stale_data: Vec<String>,
    #[serde(default)]
    pub fetch_errors: Vec<String>,
}

/// External market-data collaborator
#[async_trait]
pub trait ResearchSource: Send + Sync {
    async fn fetch_market_data(
        &self,
        industry: &str,
        location: &str,
        intake: &BusinessIntake,
    ) -> Result<ResearchPack>;
}

/// Fixture source standing in for the statistics APIs.
/// Timestamps are always 30 days old so freshness checks pass.
pub struct FixtureResearchSource;

impl FixtureResearchSource {
    pub fn build_pack(industry: &str, location: &str, now: DateTime<Utc>) -> ResearchPack {
        let recent = (now - Duration::days(30)).format("%Y-%m-%d").to_string();
        let ons_url = "https://www.ons.gov.uk/businessindustryandtrade/retailindustry".to_string();

        ResearchPack {
            id: Uuid::new_v4(),
            created_at: now,
            industry: industry.to_string(),
            location: location.to_string(),
            market_data: MarketData {
                market_size_gbp: 4_500_000_000.0,
                market_size_source: Some("ONS".to_string()),
                market_size_url: Some(ons_url.clone()),
                market_size_timestamp: Some(recent.clone()),
                growth_rate_percent: 8.2,
                growth_rate_source: Some("ONS".to_string()),
                growth_rate_url: Some(ons_url),
                growth_rate_timestamp: Some(recent),
            },
            competitor_data: CompetitorData {
                top_competitors: vec![],
                competitor_count_estimate: 1250,
                competitor_count_source: Some("SERP API".to_string()),
            },
            missing_data: vec![],
            stale_data: vec![],
            fetch_errors: vec![],
        }
    }
}

#[async_trait]
impl ResearchSource for FixtureResearchSource {
    async fn fetch_market_data(
        &self,
        industry: &str,
        location: &str,
        _intake: &BusinessIntake,
    ) -> Result<ResearchPack> {
        info!(industry = %industry, location = %location, "Fetching market data (fixture)");
        Ok(Self::build_pack(industry, location, Utc::now()))
    }
}
