use std::collections::{HashMap, HashSet};

use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::models::{
    ColumnSummary, CorrelationMatrix, Dimension, EnrichedRecord, GroupDistribution, Kpis,
    NumericColumn,
};

pub fn kpis(records: &[EnrichedRecord]) -> Kpis {
    if records.is_empty() {
        return Kpis {
            line_count: 0,
            total_revenue: 0.0,
            total_orders: 0,
            avg_order_value: 0.0,
            avg_discount_pct: 0.0,
        };
    }

    let total_orders = records
        .iter()
        .map(|record| record.transaction.order_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    Kpis {
        line_count: records.len(),
        total_revenue: records.iter().map(|record| record.revenue).sum(),
        total_orders,
        // Mean over line items, matching the dashboards' "avg order value" card.
        avg_order_value: records.iter().map(|record| record.revenue).mean(),
        avg_discount_pct: records.iter().map(|record| record.discount_fraction).mean() * 100.0,
    }
}

pub fn summarize(column: NumericColumn, values: &[f64]) -> ColumnSummary {
    let mut data = Data::new(values.to_vec());

    ColumnSummary {
        column,
        count: values.len(),
        mean: finite(values.iter().mean()),
        std: finite(values.iter().std_dev()),
        min: finite(Statistics::min(values.iter())),
        q25: linear_quantile(&mut data, values.len(), 0.25),
        median: linear_quantile(&mut data, values.len(), 0.5),
        q75: linear_quantile(&mut data, values.len(), 0.75),
        max: finite(Statistics::max(values.iter())),
    }
}

/// Summary statistics for quantity, price, effective discount and revenue.
pub fn describe(records: &[EnrichedRecord]) -> Vec<ColumnSummary> {
    NumericColumn::ALL
        .iter()
        .map(|column| summarize(*column, &column_values(records, *column)))
        .collect()
}

/// Revenue summary per distinct value of `dimension`, first-seen order.
pub fn distribution_by(records: &[EnrichedRecord], dimension: Dimension) -> Vec<GroupDistribution> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();

    for record in records {
        let key = dimension.key_of(record);
        match positions.get(key) {
            Some(&index) => groups[index].1.push(record.revenue),
            None => {
                positions.insert(key, groups.len());
                groups.push((key, vec![record.revenue]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, values)| GroupDistribution {
            key: key.to_string(),
            summary: summarize(NumericColumn::Revenue, &values),
        })
        .collect()
}

/// Pairwise Pearson correlation of the numeric columns.
pub fn correlation_matrix(records: &[EnrichedRecord]) -> CorrelationMatrix {
    let columns = NumericColumn::ALL.to_vec();
    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|column| column_values(records, *column))
        .collect();

    let values = series
        .iter()
        .map(|x| series.iter().map(|y| pearson(x, y)).collect())
        .collect();

    CorrelationMatrix { columns, values }
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }

    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if sx == 0.0 || sy == 0.0 {
        return None;
    }

    let r = x.iter().covariance(y.iter()) / (sx * sy);
    finite(r.clamp(-1.0, 1.0))
}

/// Quantile interpolated between closest ranks at `(n - 1) * p`, the same
/// definition `describe()` uses in pandas.
fn linear_quantile(data: &mut Data<Vec<f64>>, len: usize, p: f64) -> Option<f64> {
    if len == 0 {
        return None;
    }

    let h = (len - 1) as f64 * p;
    let lower = h.floor();
    let below = data.order_statistic(lower as usize + 1);
    let above = data.order_statistic(h.ceil() as usize + 1);
    finite(below + (h - lower) * (above - below))
}

fn column_values(records: &[EnrichedRecord], column: NumericColumn) -> Vec<f64> {
    records.iter().map(|record| column.value_of(record)).collect()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
