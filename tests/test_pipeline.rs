//! End-to-end tests: CSV file on disk through enrichment, aggregation and the
//! markdown dashboard.

use std::io::Write;

use ecommerce_revenue_pipeline::report::{build_report, Dashboard};
use ecommerce_revenue_pipeline::{
    aggregate, ingest, pipeline, stats, Dimension, DiscountUnit, EnrichedRecord, Metric,
    PipelineConfig, PipelineError, Result,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

const HEADER: &str = "order_id,order_date,category,region,payment_method,quantity,price,discount";

fn csv_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn load(file: &NamedTempFile, config: &PipelineConfig) -> Result<Vec<EnrichedRecord>> {
    let table = ingest::read_table(file.path())?;
    pipeline::load_and_enrich(&table, config)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn percent_dataset_from_disk() {
    let file = csv_file(&["1,2024-04-01,Books,North,card,3,15,20"]);
    let records = load(&file, &PipelineConfig::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert!((records[0].revenue - 36.0).abs() < 1e-9);
    assert_eq!(records[0].period, "2024-04");
    assert_eq!(records[0].transaction.row, 1);
}

#[test]
fn missing_column_is_named() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "order_id,order_date,category,region,quantity,price,discount").unwrap();
    writeln!(file, "1,2024-04-01,Books,North,3,15,20").unwrap();
    file.flush().unwrap();

    let err = load(&file, &PipelineConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "missing required column `payment_method`");
}

#[test]
fn bad_date_names_the_row() {
    let file = csv_file(&[
        "1,2024-04-01,Books,North,card,3,15,0",
        "2,yesterday,Books,North,card,3,15,0",
    ]);
    let err = load(&file, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Parse { row: 2, field: "order_date", .. }));
    assert!(err.to_string().contains("yesterday"));
}

#[test]
fn header_only_file_is_empty_dataset() {
    let file = csv_file(&[]);
    let err = load(&file, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyDataset));
}

#[test]
fn explicit_fraction_unit_rejects_percent_values() {
    let file = csv_file(&["1,2024-04-01,Books,North,card,3,15,20"]);
    let config = PipelineConfig::default().with_discount_unit(DiscountUnit::Fraction);
    let err = load(&file, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Validation { row: 1, field: "discount", .. }));
}

// ---------------------------------------------------------------------------
// Aggregation and dashboard
// ---------------------------------------------------------------------------

#[test]
fn aggregates_and_report_agree() {
    let file = csv_file(&[
        "1,2024-02-01,Books,North,card,1,100,0.25",
        "1,2024-02-01,Games,North,card,2,50,0",
        "2,2024-01-20,Books,South,upi,4,10,0.5",
        "3,2024-03-11,Games,South,cash,1,60,0",
    ]);
    let config = PipelineConfig::default();
    let records = load(&file, &config).unwrap();

    let by_category = aggregate::aggregate(&records, &[Dimension::Category], Metric::SumRevenue).unwrap();
    let totals: Vec<(String, f64)> = by_category
        .rows
        .iter()
        .map(|row| (row.keys[0].clone(), row.revenue))
        .collect();
    assert_eq!(
        totals,
        vec![("Books".to_string(), 95.0), ("Games".to_string(), 160.0)]
    );

    let kpis = stats::kpis(&records);
    assert_eq!(kpis.total_orders, 3);
    assert!((kpis.total_revenue - by_category.total()).abs() < 1e-9);

    let dashboard = Dashboard::build(&records, &config).unwrap();
    let months: Vec<&str> = dashboard
        .monthly
        .rows
        .iter()
        .map(|row| row.keys[0].as_str())
        .collect();
    assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);

    let markdown = build_report("orders.csv", &dashboard);
    assert!(markdown.contains("| Games | 160.00 |"));
    assert!(markdown.contains("- Total orders: 3"));
}

#[test]
fn dashboard_serializes_to_json() {
    let file = csv_file(&["1,2024-02-01,Books,North,card,1,100,0.25"]);
    let config = PipelineConfig::default();
    let records = load(&file, &config).unwrap();
    let dashboard = Dashboard::build(&records, &config).unwrap();

    let json = serde_json::to_value(&dashboard).unwrap();
    assert_eq!(json["by_region"]["dimensions"][0], "region");
    assert_eq!(json["by_region"]["metric"], "sum_revenue");
    assert_eq!(json["by_region"]["rows"][0]["revenue"], 75.0);
    // One row leaves the standard deviation undefined.
    assert!(json["summaries"][0]["std"].is_null());
}
