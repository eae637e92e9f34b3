//! Individual projection steps
//!
//! Every function is pure. Business edge cases (zero revenue, zero margin,
//! zero capital) produce well-typed zeros, never errors.

use super::{BreakEven, Kpis, ProjectionHorizon, YearCogs, YearOpex, YearPnl, YearRevenue};
use crate::benchmarks::{BenchmarkSet, CORPORATION_TAX_RATE};
use crate::models::BusinessIntake;

/// Year-over-year revenue growth ceiling regardless of benchmark input.
pub const MAX_GROWTH_RATE: f64 = 0.20;

/// Wage inflation applied to the salary line, linear per year.
pub const SALARY_ESCALATION_RATE: f64 = 0.075;

/// Opex grows at this fraction of the benchmark growth rate.
const OPEX_GROWTH_FACTOR: f64 = 0.5;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn project_revenue(
    intake: &BusinessIntake,
    benchmarks: &BenchmarkSet,
    horizon: ProjectionHorizon,
) -> Vec<YearRevenue> {
    let mut year1 = intake.monthly_revenue_estimate * 12.0;
    if year1 == 0.0 {
        year1 = intake.starting_capital * benchmarks.revenue_to_capital_ratio;
    }

    let growth = benchmarks.growth_rate.min(MAX_GROWTH_RATE);
    let mut series = Vec::with_capacity(horizon.years() as usize);
    series.push(YearRevenue {
        year: 1,
        revenue: year1,
    });

    for year in 2..=horizon.years() {
        let previous = series[series.len() - 1].revenue;
        series.push(YearRevenue {
            year,
            revenue: round2(previous * (1.0 + growth)),
        });
    }

    series
}

pub fn compute_cogs(revenue: &[YearRevenue], benchmarks: &BenchmarkSet) -> Vec<YearCogs> {
    revenue
        .iter()
        .map(|r| YearCogs {
            year: r.year,
            cogs: round2(r.revenue * benchmarks.cogs_percentage),
        })
        .collect()
}

pub fn compute_operating_expenses(
    revenue: &[YearRevenue],
    intake: &BusinessIntake,
    benchmarks: &BenchmarkSet,
) -> Vec<YearOpex> {
    let expenses = &intake.operating_expenses;
    let annual_base = expenses.monthly_total() * 12.0;
    let opex_growth = benchmarks.growth_rate * OPEX_GROWTH_FACTOR;

    let mut series: Vec<YearOpex> = Vec::with_capacity(revenue.len());

    for row in revenue {
        let year = row.year;
        let total_opex = match series.last() {
            None => annual_base,
            Some(previous) => previous.total_opex * (1.0 + opex_growth),
        };

        let escalation = 1.0 + f64::from(year.saturating_sub(1)) * SALARY_ESCALATION_RATE;

        series.push(YearOpex {
            year,
            salaries: round2(expenses.salaries * 12.0 * escalation),
            software_tools: round2(expenses.software_tools * 12.0),
            hosting_domain: round2(expenses.hosting_domain * 12.0),
            marketing: round2(expenses.marketing * 12.0),
            workspace_utilities: round2(expenses.workspace_utilities * 12.0),
            miscellaneous: round2(expenses.miscellaneous * 12.0),
            custom: round2(expenses.custom_total() * 12.0),
            total_opex: round2(total_opex),
        });
    }

    series
}

/// Per-year P&L. No loss carry-forward: each year is taxed on its own.
pub fn compute_pnl(revenue: &[YearRevenue], cogs: &[YearCogs], opex: &[YearOpex]) -> Vec<YearPnl> {
    revenue
        .iter()
        .zip(cogs)
        .zip(opex)
        .map(|((r, c), o)| {
            let gross_profit = r.revenue - c.cogs;
            let operating_profit = gross_profit - o.total_opex;
            let tax = operating_profit.max(0.0) * CORPORATION_TAX_RATE;
            let net_profit = operating_profit - tax;

            YearPnl {
                year: r.year,
                revenue: round2(r.revenue),
                cogs: round2(c.cogs),
                gross_profit: round2(gross_profit),
                total_opex: round2(o.total_opex),
                operating_profit: round2(operating_profit),
                tax: round2(tax),
                net_profit: round2(net_profit),
            }
        })
        .collect()
}

pub fn compute_break_even(intake: &BusinessIntake, benchmarks: &BenchmarkSet) -> BreakEven {
    let fixed_costs_monthly = intake.operating_expenses.monthly_total();
    let price = intake.price_per_unit;
    let variable_cost_per_unit = price * benchmarks.cogs_percentage;
    let contribution_margin = price - variable_cost_per_unit;

    let units = if contribution_margin > 0.0 {
        fixed_costs_monthly / contribution_margin
    } else {
        0.0
    };

    BreakEven {
        fixed_costs_monthly: round2(fixed_costs_monthly),
        contribution_margin_per_unit: round2(contribution_margin),
        break_even_units_monthly: units.round(),
        break_even_revenue_monthly: round2(units * price),
    }
}

/// Year-1 KPIs. Margins are 0 without revenue; ROI is undefined without capital.
pub fn compute_kpis(pnl: &[YearPnl], starting_capital: f64) -> Kpis {
    let Some(year1) = pnl.first() else {
        return Kpis::default();
    };

    let margin = |profit: f64| {
        if year1.revenue > 0.0 {
            round2(profit / year1.revenue * 100.0)
        } else {
            0.0
        }
    };

    let roi_year1_percent = if starting_capital > 0.0 {
        Some(round2(year1.net_profit / starting_capital * 100.0))
    } else {
        None
    };

    Kpis {
        gross_margin_percent: margin(year1.gross_profit),
        net_margin_percent: margin(year1.net_profit),
        roi_year1_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::coffee_shop;
    use crate::models::OperatingExpenses;

    fn benchmarks(cogs: f64, growth: f64) -> BenchmarkSet {
        BenchmarkSet {
            cogs_percentage: cogs,
            growth_rate: growth,
            ..BenchmarkSet::default()
        }
    }

    #[test]
    fn test_revenue_example_scenario() {
        let series = project_revenue(&coffee_shop(), &benchmarks(0.35, 0.15), ProjectionHorizon::default());

        assert_eq!(series.len(), 5);
        assert_eq!(series[0].revenue, 180_000.0);
        assert_eq!(series[1].revenue, 207_000.0);
        assert_eq!(series[2].revenue, 238_050.0);
    }

    #[test]
    fn test_revenue_falls_back_to_capital_ratio() {
        let mut intake = coffee_shop();
        intake.monthly_revenue_estimate = 0.0;

        let series = project_revenue(&intake, &BenchmarkSet::default(), ProjectionHorizon::default());
        assert_eq!(series[0].revenue, 15_000.0);
    }

    #[test]
    fn test_zero_revenue_stays_zero() {
        let mut intake = coffee_shop();
        intake.monthly_revenue_estimate = 0.0;
        intake.starting_capital = 0.0;

        let series = project_revenue(&intake, &BenchmarkSet::default(), ProjectionHorizon::default());
        assert!(series.iter().all(|r| r.revenue == 0.0));
        assert_eq!(series.len(), 5);
    }

    #[test]
    fn test_growth_is_capped() {
        for growth in [0.21, 0.35, 1.0, 5.0] {
            let series = project_revenue(&coffee_shop(), &benchmarks(0.35, growth), ProjectionHorizon::default());
            for pair in series.windows(2) {
                let ratio = pair[1].revenue / pair[0].revenue;
                assert!(ratio <= 1.20 + 1e-9, "growth {} produced ratio {}", growth, ratio);
            }
            assert_eq!(series[1].revenue, 216_000.0);
        }
    }

    #[test]
    fn test_cogs_rounded_per_year() {
        let revenue = vec![
            YearRevenue { year: 1, revenue: 100.005 },
            YearRevenue { year: 2, revenue: 333.33 },
        ];
        let cogs = compute_cogs(&revenue, &benchmarks(0.35, 0.15));

        assert_eq!(cogs[0].year, 1);
        assert_eq!(cogs[1].cogs, 116.67);
    }

    #[test]
    fn test_opex_growth_and_salary_escalation() {
        let intake = coffee_shop();
        let bm = BenchmarkSet::default();
        let revenue = project_revenue(&intake, &bm, ProjectionHorizon::default());
        let opex = compute_operating_expenses(&revenue, &intake, &bm);

        assert_eq!(opex[0].total_opex, 85_800.0);
        // half of the 15% benchmark growth
        assert_eq!(opex[1].total_opex, 92_235.0);

        assert_eq!(opex[0].salaries, 48_000.0);
        assert_eq!(opex[1].salaries, 51_600.0);
        assert_eq!(opex[4].salaries, 62_400.0);

        assert_eq!(opex[0].custom, 1_800.0);
        assert_eq!(opex[3].marketing, 6_000.0);
    }

    #[test]
    fn test_opex_growth_uses_uncapped_benchmark() {
        let intake = coffee_shop();
        let bm = benchmarks(0.35, 0.60);
        let revenue = project_revenue(&intake, &bm, ProjectionHorizon::default());
        let opex = compute_operating_expenses(&revenue, &intake, &bm);

        assert_eq!(opex[1].total_opex, 111_540.0);
    }

    #[test]
    fn test_tax_never_negative() {
        let mut intake = coffee_shop();
        intake.monthly_revenue_estimate = 1_000.0;
        let bm = BenchmarkSet::default();

        let revenue = project_revenue(&intake, &bm, ProjectionHorizon::default());
        let cogs = compute_cogs(&revenue, &bm);
        let opex = compute_operating_expenses(&revenue, &intake, &bm);
        let pnl = compute_pnl(&revenue, &cogs, &opex);

        for year in &pnl {
            assert!(year.operating_profit < 0.0);
            assert_eq!(year.tax, 0.0);
            assert_eq!(year.net_profit, year.operating_profit);
        }
    }

    #[test]
    fn test_pnl_positive_year_taxed() {
        let revenue = vec![YearRevenue { year: 1, revenue: 200_000.0 }];
        let cogs = vec![YearCogs { year: 1, cogs: 70_000.0 }];
        let opex = vec![YearOpex {
            year: 1,
            salaries: 0.0,
            software_tools: 0.0,
            hosting_domain: 0.0,
            marketing: 0.0,
            workspace_utilities: 0.0,
            miscellaneous: 0.0,
            custom: 0.0,
            total_opex: 30_000.0,
        }];

        let pnl = compute_pnl(&revenue, &cogs, &opex);
        assert_eq!(pnl[0].gross_profit, 130_000.0);
        assert_eq!(pnl[0].operating_profit, 100_000.0);
        assert_eq!(pnl[0].tax, 19_000.0);
        assert_eq!(pnl[0].net_profit, 81_000.0);
    }

    #[test]
    fn test_break_even() {
        let mut intake = coffee_shop();
        intake.price_per_unit = 10.0;
        intake.operating_expenses = OperatingExpenses {
            salaries: 6_500.0,
            ..OperatingExpenses::default()
        };

        let be = compute_break_even(&intake, &BenchmarkSet::default());
        assert_eq!(be.fixed_costs_monthly, 6_500.0);
        assert_eq!(be.contribution_margin_per_unit, 6.5);
        assert_eq!(be.break_even_units_monthly, 1_000.0);
        assert_eq!(be.break_even_revenue_monthly, 10_000.0);
    }

    #[test]
    fn test_break_even_zero_margin_is_safe() {
        let intake = coffee_shop();

        for (price, cogs) in [(0.0, 0.35), (4.5, 1.0), (4.5, 1.5)] {
            let mut intake = intake.clone();
            intake.price_per_unit = price;
            let be = compute_break_even(&intake, &benchmarks(cogs, 0.15));

            assert_eq!(be.break_even_units_monthly, 0.0);
            assert_eq!(be.break_even_revenue_monthly, 0.0);
            assert!(!be.break_even_units_monthly.is_nan());
        }
    }

    #[test]
    fn test_kpis() {
        let pnl = vec![YearPnl {
            year: 1,
            revenue: 200_000.0,
            cogs: 70_000.0,
            gross_profit: 130_000.0,
            total_opex: 30_000.0,
            operating_profit: 100_000.0,
            tax: 19_000.0,
            net_profit: 81_000.0,
        }];

        let kpis = compute_kpis(&pnl, 50_000.0);
        assert_eq!(kpis.gross_margin_percent, 65.0);
        assert_eq!(kpis.net_margin_percent, 40.5);
        assert_eq!(kpis.roi_year1_percent, Some(162.0));
    }

    #[test]
    fn test_kpis_degenerate_inputs() {
        let pnl = vec![YearPnl {
            year: 1,
            revenue: 0.0,
            cogs: 0.0,
            gross_profit: 0.0,
            total_opex: 1_200.0,
            operating_profit: -1_200.0,
            tax: 0.0,
            net_profit: -1_200.0,
        }];

        let kpis = compute_kpis(&pnl, 0.0);
        assert_eq!(kpis.gross_margin_percent, 0.0);
        assert_eq!(kpis.net_margin_percent, 0.0);
        assert_eq!(kpis.roi_year1_percent, None);

        assert_eq!(compute_kpis(&[], 1_000.0), Kpis::default());
    }
}
