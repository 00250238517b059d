use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};

use crate::config::{DiscountUnit, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::models::{EnrichedRecord, RawTable, RawTransaction, TransactionRecord, REQUIRED_COLUMNS};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Dataset-wide unit policy: a column maximum above 1 means every value is a
/// percentage. A column of only 0s and 1s therefore resolves to fractions.
pub fn resolve_discount_unit(raw: &[f64]) -> DiscountUnit {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 1.0 {
        DiscountUnit::Percent
    } else {
        DiscountUnit::Fraction
    }
}

/// Normalize a whole discount column to fractions using the max heuristic.
pub fn normalize_discount(raw: &[f64]) -> Vec<f64> {
    normalize_discount_with(raw, DiscountUnit::Auto).1
}

/// Normalize with an explicit unit, or fall back to `resolve_discount_unit`
/// for `Auto`. Returns the unit actually applied.
pub fn normalize_discount_with(raw: &[f64], unit: DiscountUnit) -> (DiscountUnit, Vec<f64>) {
    let applied = match unit {
        DiscountUnit::Auto => {
            let resolved = resolve_discount_unit(raw);
            let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            warn!(
                "discount unit not configured; column max {} across {} rows, treating discounts as {}",
                max,
                raw.len(),
                resolved.as_str()
            );
            resolved
        }
        explicit => explicit,
    };

    let normalized = match applied {
        DiscountUnit::Percent => raw.iter().map(|value| value / 100.0).collect(),
        _ => raw.to_vec(),
    };

    (applied, normalized)
}

pub fn compute_revenue(row: usize, quantity: i64, price: f64, discount_fraction: f64) -> Result<f64> {
    check_amounts(row, quantity, price)?;
    if !(0.0..=1.0).contains(&discount_fraction) {
        return Err(PipelineError::Validation {
            row,
            field: "discount",
            reason: format!("{discount_fraction} is outside [0, 1] after normalization"),
        });
    }

    let revenue = quantity as f64 * price * (1.0 - discount_fraction);
    if !revenue.is_finite() {
        return Err(PipelineError::Validation {
            row,
            field: "revenue",
            reason: format!("{quantity} x {price} overflows"),
        });
    }
    Ok(revenue)
}

/// Month key, `YYYY-MM`. Zero padding keeps string order chronological.
pub fn derive_period(order_date: NaiveDate) -> String {
    order_date.format("%Y-%m").to_string()
}

pub fn parse_order_date(row: usize, value: &str) -> Result<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }

    Err(PipelineError::Parse {
        row,
        field: "order_date",
        value: value.to_string(),
        reason: "not a calendar date".to_string(),
    })
}

pub fn parse_record(row: usize, raw: &RawTransaction) -> Result<TransactionRecord> {
    let order_id = required(row, "order_id", &raw.order_id)?;
    let order_date = required(row, "order_date", &raw.order_date)?;
    let quantity = parse_quantity(row, required(row, "quantity", &raw.quantity)?)?;
    let price = parse_decimal(row, "price", required(row, "price", &raw.price)?)?;
    check_amounts(row, quantity, price)?;

    Ok(TransactionRecord {
        row,
        order_id: order_id.to_string(),
        order_date: parse_order_date(row, order_date)?,
        category: required(row, "category", &raw.category)?.to_string(),
        region: required(row, "region", &raw.region)?.to_string(),
        payment_method: required(row, "payment_method", &raw.payment_method)?.to_string(),
        quantity,
        price,
        discount: parse_decimal(row, "discount", required(row, "discount", &raw.discount)?)?,
    })
}

/// Parse, normalize and enrich every row. The first row with a parse error or
/// a negative quantity/price aborts the whole load. Discount range and revenue
/// are checked afterwards, once the dataset-wide discount unit is known.
pub fn load_and_enrich(table: &RawTable, config: &PipelineConfig) -> Result<Vec<EnrichedRecord>> {
    for column in REQUIRED_COLUMNS {
        if !table.has_column(column) {
            return Err(PipelineError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    if table.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_record(index + 1, raw))
        .collect::<Result<Vec<_>>>()?;

    let raw_discounts: Vec<f64> = records.iter().map(|record| record.discount).collect();
    let (unit, fractions) = normalize_discount_with(&raw_discounts, config.discount_unit);
    debug!("applying discount unit {}", unit.as_str());

    let enriched = records
        .into_iter()
        .zip(fractions)
        .map(|(transaction, discount_fraction)| {
            let revenue = compute_revenue(
                transaction.row,
                transaction.quantity,
                transaction.price,
                discount_fraction,
            )?;
            let period = derive_period(transaction.order_date);
            Ok(EnrichedRecord {
                transaction,
                discount_fraction,
                revenue,
                period,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        "enriched {} rows (discount unit {})",
        enriched.len(),
        unit.as_str()
    );
    Ok(enriched)
}

fn check_amounts(row: usize, quantity: i64, price: f64) -> Result<()> {
    if quantity < 0 {
        return Err(PipelineError::Validation {
            row,
            field: "quantity",
            reason: format!("{quantity} is negative"),
        });
    }
    if !price.is_finite() || price < 0.0 {
        return Err(PipelineError::Validation {
            row,
            field: "price",
            reason: format!("{price} is not a non-negative amount"),
        });
    }
    Ok(())
}

fn required<'a>(row: usize, field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(PipelineError::Parse {
            row,
            field,
            value: String::new(),
            reason: "missing value".to_string(),
        }),
    }
}

// Integral floats ("3.0") are accepted since exported sheets often write them.
fn parse_quantity(row: usize, value: &str) -> Result<i64> {
    if let Ok(quantity) = value.parse::<i64>() {
        return Ok(quantity);
    }
    match value.parse::<f64>() {
        Ok(quantity) if quantity.is_finite() && quantity.fract() == 0.0 => {
            // `as` saturates, so anything at or past 2^63 has to be refused here.
            if quantity.abs() < i64::MAX as f64 {
                Ok(quantity as i64)
            } else {
                Err(PipelineError::Parse {
                    row,
                    field: "quantity",
                    value: value.to_string(),
                    reason: "out of range".to_string(),
                })
            }
        }
        _ => Err(PipelineError::Parse {
            row,
            field: "quantity",
            value: value.to_string(),
            reason: "not an integer".to_string(),
        }),
    }
}

fn parse_decimal(row: usize, field: &'static str, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(PipelineError::Parse {
            row,
            field,
            value: value.to_string(),
            reason: "not a number".to_string(),
        }),
    }
}
