//! Text generation collaborator
//!
//! Every LLM call in the pipeline goes through [`TextGenerator`], so the
//! writer and the enrichment analyzers never see a concrete provider.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod gemini;
pub use gemini::GeminiClient;

/// What a request is for; lets offline generators answer sensibly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "section_type", rename_all = "snake_case")]
pub enum GenerationPurpose {
    Section(String),
    Swot,
    Competitors,
}

impl fmt::Display for GenerationPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationPurpose::Section(section_type) => write!(f, "section:{}", section_type),
            GenerationPurpose::Swot => write!(f, "swot"),
            GenerationPurpose::Competitors => write!(f, "competitors"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub purpose: GenerationPurpose,
    pub system_instruction: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedText {
    pub content: String,
    pub confidence: f32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText>;

    fn name(&self) -> &str {
        "generator"
    }
}

/// Deterministic offline generator for demos and tests.
///
/// Section prompts get a paragraph naming the section, SWOT and competitor
/// prompts get well-formed JSON.
#[derive(Debug, Default, Clone)]
pub struct StaticTextGenerator;

impl StaticTextGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for StaticTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText> {
        let content = match &request.purpose {
            GenerationPurpose::Section(section_type) => static_section(section_type),
            GenerationPurpose::Swot => STATIC_SWOT.to_string(),
            GenerationPurpose::Competitors => STATIC_COMPETITORS.to_string(),
        };

        Ok(GeneratedText {
            content,
            confidence: 0.9,
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}

fn static_section(section_type: &str) -> String {
    let heading = section_type.replace('_', " ");
    let sentence = format!(
        "This {} draws only on the figures supplied in the intake and the financial model. ",
        heading
    );

    // Long enough to clear every word-count threshold in the compliance templates.
    sentence.repeat(24).trim_end().to_string()
}

const STATIC_SWOT: &str = r#"```json
{
  "strengths": ["Clear value proposition stated by the founder", "Lean starting cost base"],
  "weaknesses": ["No trading history yet"],
  "opportunities": ["Growing local demand reported by market research"],
  "threats": ["Established competitors in the same location"]
}
```"#;

const STATIC_COMPETITORS: &str = r#"{
  "competitors": [
    {
      "name": "Established local operator",
      "description": "Incumbent serving the same customer segment",
      "strengths": ["Brand recognition"],
      "weaknesses": ["Slower to adapt"],
      "market_position": "Market leader",
      "pricing_strategy": "Premium"
    }
  ],
  "competitive_advantages": ["Focused offering for the target customers"],
  "market_positioning": "Specialist alternative to the incumbents",
  "competitive_threats": ["Price competition from larger chains"]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn request(purpose: GenerationPurpose) -> GenerationRequest {
        GenerationRequest {
            purpose,
            system_instruction: String::new(),
            prompt: "prompt".to_string(),
        }
    }

    #[tokio::test]
    async fn test_static_generator_is_deterministic() {
        let generator = StaticTextGenerator::new();
        let req = request(GenerationPurpose::Section("market_analysis".to_string()));

        let a = generator.generate(&req).await.unwrap();
        let b = generator.generate(&req).await.unwrap();

        assert_eq!(a.content, b.content);
        assert!(a.content.contains("market analysis"));
        assert!(a.content.split_whitespace().count() >= 200);
    }

    #[tokio::test]
    async fn test_static_generator_json_purposes() {
        let generator = StaticTextGenerator::new();
        let swot = generator.generate(&request(GenerationPurpose::Swot)).await.unwrap();
        let competitors = generator
            .generate(&request(GenerationPurpose::Competitors))
            .await
            .unwrap();

        assert!(swot.content.contains("\"strengths\""));
        let parsed: serde_json::Value = serde_json::from_str(&competitors.content).unwrap();
        assert!(parsed["competitors"].is_array());
    }

    #[test]
    fn test_purpose_display() {
        assert_eq!(
            GenerationPurpose::Section("team".to_string()).to_string(),
            "section:team"
        );
        assert_eq!(GenerationPurpose::Swot.to_string(), "swot");
    }
}
