use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "order_id",
    "order_date",
    "category",
    "region",
    "payment_method",
    "quantity",
    "price",
    "discount",
];

/// One source row before any conversion. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTransaction {
    pub order_id: Option<String>,
    pub order_date: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub payment_method: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub discount: Option<String>,
}

/// A fully loaded source file: its header and its rows, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawTransaction>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// 1-based data row in the source table.
    pub row: usize,
    pub order_id: String,
    pub order_date: NaiveDate,
    pub category: String,
    pub region: String,
    pub payment_method: String,
    pub quantity: i64,
    pub price: f64,
    /// Discount exactly as it appeared in the source, unit not yet resolved.
    pub discount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub transaction: TransactionRecord,
    pub discount_fraction: f64,
    pub revenue: f64,
    pub period: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    Region,
    #[value(name = "payment_method", alias = "payment-method")]
    PaymentMethod,
    #[value(alias = "month")]
    Period,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Category => "category",
            Dimension::Region => "region",
            Dimension::PaymentMethod => "payment_method",
            Dimension::Period => "period",
        }
    }

    pub fn key_of<'a>(&self, record: &'a EnrichedRecord) -> &'a str {
        match self {
            Dimension::Category => &record.transaction.category,
            Dimension::Region => &record.transaction.region,
            Dimension::PaymentMethod => &record.transaction.payment_method,
            Dimension::Period => &record.period,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only revenue summation is part of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    SumRevenue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// One value per grouping dimension, in `group_by` order.
    pub keys: Vec<String>,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub dimensions: Vec<Dimension>,
    pub metric: Metric,
    pub rows: Vec<AggregateRow>,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.revenue).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
    pub rolling_mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub line_count: usize,
    pub total_revenue: f64,
    pub total_orders: usize,
    pub avg_order_value: f64,
    pub avg_discount_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    Quantity,
    Price,
    Discount,
    Revenue,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::Quantity,
        NumericColumn::Price,
        NumericColumn::Discount,
        NumericColumn::Revenue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NumericColumn::Quantity => "quantity",
            NumericColumn::Price => "price",
            NumericColumn::Discount => "discount",
            NumericColumn::Revenue => "revenue",
        }
    }

    /// Discount is read as the effective fraction, not the raw cell.
    pub fn value_of(&self, record: &EnrichedRecord) -> f64 {
        match self {
            NumericColumn::Quantity => record.transaction.quantity as f64,
            NumericColumn::Price => record.transaction.price,
            NumericColumn::Discount => record.discount_fraction,
            NumericColumn::Revenue => record.revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: NumericColumn,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDistribution {
    pub key: String,
    pub summary: ColumnSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    /// Row-major, `None` where the coefficient is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericColumn, b: NumericColumn) -> Option<f64> {
        let i = self.columns.iter().position(|column| *column == a)?;
        let j = self.columns.iter().position(|column| *column == b)?;
        self.values[i][j]
    }
}
