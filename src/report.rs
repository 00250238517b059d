use std::fmt::Write;

use serde::Serialize;

use crate::aggregate;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{
    AggregateResult, ColumnSummary, CorrelationMatrix, DailyRevenue, Dimension, EnrichedRecord,
    GroupDistribution, Kpis, Metric,
};
use crate::stats;

const NOTHING_TO_DISPLAY: &str = "Nothing to display.";

/// Every section the dashboard shows, computed from one enriched load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub by_category: AggregateResult,
    pub by_region: AggregateResult,
    pub by_payment_method: AggregateResult,
    pub by_category_region: AggregateResult,
    pub monthly: AggregateResult,
    pub daily: Vec<DailyRevenue>,
    pub payment_usage: Vec<GroupDistribution>,
    pub summaries: Vec<ColumnSummary>,
    pub correlation: CorrelationMatrix,
}

impl Dashboard {
    pub fn build(records: &[EnrichedRecord], config: &PipelineConfig) -> Result<Self> {
        let by = |group_by: &[Dimension]| aggregate::aggregate(records, group_by, Metric::SumRevenue);

        Ok(Self {
            kpis: stats::kpis(records),
            by_category: by(&[Dimension::Category])?,
            by_region: by(&[Dimension::Region])?,
            by_payment_method: by(&[Dimension::PaymentMethod])?,
            by_category_region: by(&[Dimension::Category, Dimension::Region])?,
            monthly: aggregate::monthly_trend(records)?,
            daily: aggregate::daily_trend(records, config.rolling_window)?,
            payment_usage: stats::distribution_by(records, Dimension::PaymentMethod),
            summaries: stats::describe(records),
            correlation: stats::correlation_matrix(records),
        })
    }
}

pub fn build_report(source: &str, dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# E-commerce Revenue Dashboard");
    let _ = writeln!(output, "Generated from {source}");
    let _ = writeln!(output);

    let kpis = &dashboard.kpis;
    let _ = writeln!(output, "## Key Performance Indicators");
    let _ = writeln!(output, "- Total revenue: {:.2}", kpis.total_revenue);
    let _ = writeln!(output, "- Total orders: {}", kpis.total_orders);
    let _ = writeln!(output, "- Avg order value: {:.2}", kpis.avg_order_value);
    let _ = writeln!(output, "- Avg discount: {:.1}%", kpis.avg_discount_pct);
    let _ = writeln!(output, "- Line items: {}", kpis.line_count);

    write_aggregate(&mut output, "Revenue by Category", &dashboard.by_category);
    write_aggregate(&mut output, "Revenue by Region", &dashboard.by_region);
    write_aggregate(&mut output, "Revenue by Payment Method", &dashboard.by_payment_method);
    write_aggregate(
        &mut output,
        "Revenue by Category and Region",
        &dashboard.by_category_region,
    );
    write_aggregate(&mut output, "Monthly Revenue Trend", &dashboard.monthly);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Payment Method Usage");
    if dashboard.payment_usage.is_empty() {
        let _ = writeln!(output, "{NOTHING_TO_DISPLAY}");
    } else {
        for group in &dashboard.payment_usage {
            let _ = writeln!(
                output,
                "- {}: {} line items, median revenue {}",
                group.key,
                group.summary.count,
                cell(group.summary.median)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Revenue");
    if dashboard.daily.is_empty() {
        let _ = writeln!(output, "{NOTHING_TO_DISPLAY}");
    } else {
        let _ = writeln!(output, "| date | revenue | rolling mean |");
        let _ = writeln!(output, "|---|---:|---:|");
        for day in &dashboard.daily {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {} |",
                day.date,
                day.revenue,
                cell(day.rolling_mean)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Column Summaries");
    if dashboard.kpis.line_count == 0 {
        let _ = writeln!(output, "{NOTHING_TO_DISPLAY}");
    } else {
        let _ = writeln!(output, "| column | count | mean | std | min | 25% | 50% | 75% | max |");
        let _ = writeln!(output, "|---|---:|---:|---:|---:|---:|---:|---:|---:|");
        for summary in &dashboard.summaries {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                summary.column.as_str(),
                summary.count,
                cell(summary.mean),
                cell(summary.std),
                cell(summary.min),
                cell(summary.q25),
                cell(summary.median),
                cell(summary.q75),
                cell(summary.max)
            );
        }
    }

    let correlation = &dashboard.correlation;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Correlation");
    let names: Vec<&str> = correlation.columns.iter().map(|column| column.as_str()).collect();
    let _ = writeln!(output, "| | {} |", names.join(" | "));
    let _ = writeln!(output, "|---|{}", "---:|".repeat(names.len()));
    for (name, values) in names.iter().zip(&correlation.values) {
        let cells: Vec<String> = values.iter().map(|value| cell(*value)).collect();
        let _ = writeln!(output, "| {} | {} |", name, cells.join(" | "));
    }

    output
}

fn write_aggregate(output: &mut String, title: &str, result: &AggregateResult) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    if result.is_empty() {
        let _ = writeln!(output, "{NOTHING_TO_DISPLAY}");
        return;
    }

    let headers: Vec<&str> = result.dimensions.iter().map(|dimension| dimension.as_str()).collect();
    let _ = writeln!(output, "| {} | revenue |", headers.join(" | "));
    let _ = writeln!(output, "|{}---:|", "---|".repeat(headers.len()));
    for row in &result.rows {
        let _ = writeln!(output, "| {} | {:.2} |", row.keys.join(" | "), row.revenue);
    }
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_table_from;
    use crate::pipeline::load_and_enrich;

    const ORDERS: &str = "\
order_id,order_date,category,region,payment_method,quantity,price,discount
1,2024-02-03,Books,North,card,2,10,10
2,2024-01-15,Toys,South,cash,1,20,0
";

    fn dashboard() -> Dashboard {
        let config = PipelineConfig::default();
        let table = read_table_from(ORDERS.as_bytes()).unwrap();
        let records = load_and_enrich(&table, &config).unwrap();
        Dashboard::build(&records, &config).unwrap()
    }

    #[test]
    fn report_has_every_section() {
        let report = build_report("orders.csv", &dashboard());
        for heading in [
            "# E-commerce Revenue Dashboard",
            "## Key Performance Indicators",
            "## Revenue by Category",
            "## Revenue by Region",
            "## Revenue by Payment Method",
            "## Revenue by Category and Region",
            "## Monthly Revenue Trend",
            "## Payment Method Usage",
            "## Daily Revenue",
            "## Column Summaries",
            "## Correlation",
        ] {
            assert!(report.contains(heading), "missing {heading}");
        }
        assert!(report.contains("Generated from orders.csv"));
    }

    #[test]
    fn report_lists_aggregates() {
        let report = build_report("orders.csv", &dashboard());
        assert!(report.contains("- Total revenue: 38.00"));
        assert!(report.contains("| Books | 18.00 |"));
        assert!(report.contains("| Books | North | 18.00 |"));
        assert!(report.contains("- cash: 1 line items, median revenue 20.00"));
    }

    #[test]
    fn monthly_section_is_chronological() {
        let report = build_report("orders.csv", &dashboard());
        let january = report.find("| 2024-01 | 20.00 |").unwrap();
        let february = report.find("| 2024-02 | 18.00 |").unwrap();
        assert!(january < february);
    }

    #[test]
    fn empty_dashboard_says_nothing_to_display() {
        let dashboard = Dashboard::build(&[], &PipelineConfig::default()).unwrap();
        let report = build_report("empty.csv", &dashboard);
        assert!(report.contains(NOTHING_TO_DISPLAY));
        assert!(report.contains("- Total orders: 0"));
    }
}
