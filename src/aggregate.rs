use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use log::debug;

use crate::error::{PipelineError, Result};
use crate::models::{AggregateResult, AggregateRow, DailyRevenue, Dimension, EnrichedRecord, Metric};

/// Sum revenue per distinct key combination. Rows keep the order in which
/// each combination first appears in `records`.
pub fn aggregate(
    records: &[EnrichedRecord],
    group_by: &[Dimension],
    metric: Metric,
) -> Result<AggregateResult> {
    check_group_by(group_by)?;

    let mut positions: HashMap<Vec<String>, usize> = HashMap::new();
    let mut rows: Vec<AggregateRow> = Vec::new();

    for record in records {
        let keys: Vec<String> = group_by
            .iter()
            .map(|dimension| dimension.key_of(record).to_string())
            .collect();
        let value = match metric {
            Metric::SumRevenue => record.revenue,
        };

        match positions.get(&keys) {
            Some(&index) => rows[index].revenue += value,
            None => {
                positions.insert(keys.clone(), rows.len());
                rows.push(AggregateRow {
                    keys,
                    revenue: value,
                });
            }
        }
    }

    debug!(
        "aggregated {} records by {:?} into {} groups",
        records.len(),
        group_by,
        rows.len()
    );

    Ok(AggregateResult {
        dimensions: group_by.to_vec(),
        metric,
        rows,
    })
}

impl AggregateResult {
    /// Stable-sort rows by their period key. Results not grouped by period
    /// are returned as they are.
    pub fn into_chronological(mut self) -> Self {
        if let Some(column) = self
            .dimensions
            .iter()
            .position(|dimension| *dimension == Dimension::Period)
        {
            self.rows
                .sort_by(|a, b| a.keys[column].cmp(&b.keys[column]));
        }
        self
    }
}

/// Revenue per month, oldest first.
pub fn monthly_trend(records: &[EnrichedRecord]) -> Result<AggregateResult> {
    Ok(aggregate(records, &[Dimension::Period], Metric::SumRevenue)?.into_chronological())
}

/// Revenue per calendar day, oldest first, with a trailing mean over the
/// last `window` days that have sales.
pub fn daily_trend(records: &[EnrichedRecord], window: usize) -> Result<Vec<DailyRevenue>> {
    if window == 0 {
        return Err(PipelineError::InvalidArgument(
            "rolling window must be at least 1".to_string(),
        ));
    }

    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *by_day.entry(record.transaction.order_date).or_insert(0.0) += record.revenue;
    }

    let days: Vec<(NaiveDate, f64)> = by_day.into_iter().collect();
    let trend = days
        .iter()
        .enumerate()
        .map(|(index, &(date, revenue))| {
            let rolling_mean = (index + 1 >= window).then(|| {
                let start = index + 1 - window;
                days[start..=index].iter().map(|(_, value)| value).sum::<f64>() / window as f64
            });
            DailyRevenue {
                date,
                revenue,
                rolling_mean,
            }
        })
        .collect();

    Ok(trend)
}

fn check_group_by(group_by: &[Dimension]) -> Result<()> {
    if group_by.is_empty() {
        return Err(PipelineError::InvalidArgument(
            "group_by needs at least one dimension".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for dimension in group_by {
        if !seen.insert(dimension) {
            return Err(PipelineError::InvalidArgument(format!(
                "dimension `{dimension}` listed more than once"
            )));
        }
    }
    Ok(())
}
