use business_plan_pipeline::{
    benchmarks::get_benchmarks,
    financial::build_scenarios,
    generation::{GeminiClient, StaticTextGenerator, TextGenerator},
    models::{CustomExpense, OperatingExpenses},
    research::{CachingResearchSource, FixtureResearchSource, ResearchCache},
    BusinessIntake, PipelineConfig, PipelineOrchestrator, PlanPurpose,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from_env()?;

    info!("Business Plan Pipeline starting");

    // Intake from a JSON file if given, otherwise the demo business
    let intake = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str::<BusinessIntake>(&raw)?
        }
        None => demo_intake(),
    };

    let generator: Arc<dyn TextGenerator> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiClient::new(key.clone())?),
        None => {
            warn!("GEMINI_API_KEY not set, using the offline static generator");
            Arc::new(StaticTextGenerator::new())
        }
    };

    let research = Arc::new(CachingResearchSource::new(
        Arc::new(FixtureResearchSource),
        ResearchCache::new(config.research_cache_capacity, config.research_cache_ttl),
    ));

    let orchestrator = PipelineOrchestrator::new(research, generator, config);

    info!(
        business = %intake.business_name,
        purpose = %intake.plan_purpose,
        "Running pipeline"
    );

    let result = orchestrator.run(&intake).await;

    println!("\n=== PIPELINE RESULT ===");
    println!("Run ID: {}", result.generation_metadata.run_id);
    println!("Status: {:?}", result.status);
    println!("Duration: {:.2}s", result.generation_metadata.duration_seconds);

    if let Some(failure) = &result.failure {
        println!("Error: {} ({})", failure.error, failure.details);
    }
    if let Some(model) = &result.financial_model {
        println!("\nYear | Revenue | Net profit");
        for year in &model.pnl_annual {
            println!("{:>4} | {:>10.2} | {:>10.2}", year.year, year.revenue, year.net_profit);
        }
    }
    if result.financial_model.is_some() {
        let horizon = orchestrator.config().projection_horizon;
        let scenarios = build_scenarios(&intake, &get_benchmarks(&intake.industry), horizon);
        println!("\nScenario | Year 1 revenue | Year 1 net profit");
        for (label, scenario) in [
            ("best", &scenarios.best_case),
            ("realistic", &scenarios.realistic),
            ("worst", &scenarios.worst_case),
        ] {
            if let Some(y1) = scenario.model.first_year() {
                println!("{:>9} | {:>14.2} | {:>17.2}", label, y1.revenue, y1.net_profit);
            }
        }
    }
    if let Some(report) = &result.compliance_report {
        println!(
            "\nCompliance: {} {:?} (score {})",
            report.template_id, report.overall_status, report.score
        );
    }

    println!("\nStage log:");
    for (i, line) in result.stage_log.iter().enumerate() {
        println!("  {}: {}", i + 1, line);
    }

    if std::env::var("PRINT_JSON").is_ok() {
        println!("\n{}", serde_json::to_string_pretty(&result)?);
    }

    if result.is_complete() {
        Ok(())
    } else {
        Err("pipeline failed".into())
    }
}

fn demo_intake() -> BusinessIntake {
    BusinessIntake {
        business_name: "Northbank Coffee Roasters".to_string(),
        industry: "food_beverage_cafe".to_string(),
        location_city: "Manchester".to_string(),
        location_country: "UK".to_string(),
        business_description: "Neighbourhood café roasting its own single-origin beans".to_string(),
        unique_value_proposition: "Beans roasted on site the same week they are served".to_string(),
        target_customers: "Local office workers and weekend visitors".to_string(),
        revenue_model: vec!["product_sales".to_string(), "wholesale".to_string()],
        starting_capital: 40_000.0,
        monthly_revenue_estimate: 12_000.0,
        price_per_unit: 3.80,
        units_per_month: 3_200,
        operating_expenses: OperatingExpenses {
            salaries: 3_500.0,
            software_tools: 80.0,
            hosting_domain: 15.0,
            marketing: 400.0,
            workspace_utilities: 1_800.0,
            miscellaneous: 250.0,
            custom: vec![CustomExpense {
                name: "equipment lease".to_string(),
                amount: 220.0,
            }],
        },
        team_size: 2,
        plan_purpose: PlanPurpose::Loan,
    }
}
