//! Named views over a dataset. Everything here goes through [`crate::query`].

use crate::dataset::Dataset;
use crate::error::QueryError;
use crate::normalize::LoadReport;
use crate::query::{
    aggregate_all, cross_tab, filter, group_aggregate, rank, share_of_total, top_k, AggFn, Column,
    Direction, Filter, KeyValue, Metric,
};
use crate::types::{
    BreakdownRow, DepartmentRankRow, DepartmentShareRow, DrillDownReport, EntityCountRow,
    EntityRole, OverviewMetrics, QualityRow, RateSummary, TrendRow,
};
use crate::util::format_count;

fn distinct(ds: &Dataset, column: Column) -> usize {
    group_aggregate(ds, &[column], Metric::Amount, AggFn::Count).map_or(0, |t| t.len())
}

fn text(key: &[KeyValue], i: usize) -> String {
    key.get(i).map(ToString::to_string).unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(v: f64) -> usize {
    v.max(0.0).round() as usize
}

fn infractions(ds: &Dataset) -> Result<Dataset, QueryError> {
    filter(ds, &Filter::default().entity_role(EntityRole::Infraction))
}

pub fn overview_metrics(ds: &Dataset) -> OverviewMetrics {
    OverviewMetrics {
        total_records: ds.len(),
        regions: distinct(ds, Column::Region),
        departments: distinct(ds, Column::DepartmentCode),
        years_covered: distinct(ds, Column::Year),
        crime_types: distinct(ds, Column::CrimeType),
    }
}

/// Records per entity role, largest first.
pub fn entity_distribution(ds: &Dataset) -> Result<Vec<EntityCountRow>, QueryError> {
    let counts = group_aggregate(ds, &[Column::EntityRole], Metric::Amount, AggFn::Count)?;
    let total = aggregate_all(ds, Metric::Amount, AggFn::Count);
    Ok(top_k(&counts, counts.len())
        .rows
        .into_iter()
        .map(|row| EntityCountRow {
            entity_role: text(&row.key, 0),
            records: as_count(row.value),
            share_pct: total.map(|t| row.value / t * 100.0),
        })
        .collect())
}

/// Mean, max and median rate over `infraction` records.
pub fn rate_summary(ds: &Dataset) -> Option<RateSummary> {
    let subset = infractions(ds).ok()?;
    Some(RateSummary {
        mean: aggregate_all(&subset, Metric::RatePer1000, AggFn::Mean)?,
        max: aggregate_all(&subset, Metric::RatePer1000, AggFn::Max)?,
        median: aggregate_all(&subset, Metric::RatePer1000, AggFn::Median)?,
    })
}

/// Departments ranked by mean `infraction` rate.
pub fn department_ranking(
    ds: &Dataset,
    k: usize,
    direction: Direction,
) -> Result<Vec<DepartmentRankRow>, QueryError> {
    let subset = infractions(ds)?;
    let table = group_aggregate(
        &subset,
        &[Column::DepartmentCode, Column::Department],
        Metric::RatePer1000,
        AggFn::Mean,
    )?;
    Ok(rank(&table, k, direction)
        .rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| DepartmentRankRow {
            rank: i + 1,
            department_code: text(&row.key, 0),
            department_name: text(&row.key, 1),
            mean_rate: row.value,
        })
        .collect())
}

/// Records and total amount per year and crime type. An empty selection
/// keeps every crime type.
pub fn temporal_trends(ds: &Dataset, crime_types: &[String]) -> Result<Vec<TrendRow>, QueryError> {
    let by = [Column::Year, Column::CrimeType];
    let selected = |key: &[KeyValue]| {
        crime_types.is_empty()
            || matches!(key.get(1), Some(KeyValue::Text(c)) if crime_types.contains(c))
    };
    let counts = group_aggregate(ds, &by, Metric::Amount, AggFn::Count)?.retain_keys(selected);
    let amounts = group_aggregate(ds, &by, Metric::Amount, AggFn::Sum)?.retain_keys(selected);

    Ok(counts
        .rows
        .into_iter()
        .zip(amounts.rows)
        .map(|(count, amount)| TrendRow {
            year: match count.key.first() {
                Some(KeyValue::Year(y)) => *y,
                _ => 0,
            },
            crime_type: text(&count.key, 1),
            records: as_count(count.value),
            amount: amount.value,
        })
        .collect())
}

/// Entity role × crime type totals, one row per combination present.
pub fn entity_breakdown(ds: &Dataset, metric: Metric) -> Result<Vec<BreakdownRow>, QueryError> {
    let tab = cross_tab(ds, Column::EntityRole, Column::CrimeType, metric)?;
    Ok(tab
        .into_iter()
        .flat_map(|(role, breakdown)| {
            breakdown.into_iter().map(move |(crime, total)| BreakdownRow {
                entity_role: role.to_string(),
                crime_type: crime.to_string(),
                total,
            })
        })
        .collect())
}

/// Total amount per department of `region`, largest first, plus the region's
/// share of the national total.
pub fn region_drill_down(ds: &Dataset, region: &str, k: usize) -> Result<DrillDownReport, QueryError> {
    let subset = filter(ds, &Filter::default().region(region))?;
    let region_total = aggregate_all(&subset, Metric::Amount, AggFn::Sum).filter(|t| *t != 0.0);
    let table = group_aggregate(
        &subset,
        &[Column::DepartmentCode, Column::Department],
        Metric::Amount,
        AggFn::Sum,
    )?;
    let departments = top_k(&table, k)
        .rows
        .into_iter()
        .map(|row| DepartmentShareRow {
            department_code: text(&row.key, 0),
            department_name: text(&row.key, 1),
            total_amount: row.value,
            share_pct: region_total.map(|t| row.value / t * 100.0),
        })
        .collect();
    Ok(DrillDownReport {
        region: region.to_string(),
        national_share_pct: share_of_total(&subset, ds, Metric::Amount, AggFn::Sum),
        departments,
    })
}

pub fn data_quality(report: &LoadReport) -> Vec<QualityRow> {
    let counters = [
        ("Rows read", report.total_rows),
        ("Parse failures", report.parse_failures.count),
        ("Duplicates removed", report.duplicates_removed),
        ("Unknown departments", report.unknown_departments),
        ("Unknown regions", report.unknown_regions),
        ("Region code mismatches", report.region_mismatches),
        ("Canonical rows", report.canonical_rows),
    ];
    let mut rows: Vec<QualityRow> = counters
        .into_iter()
        .map(|(check, n)| QualityRow {
            check: check.to_string(),
            value: format_count(n),
        })
        .collect();
    rows.extend(report.missing.iter().map(|(column, n)| QualityRow {
        check: format!("Missing values: {column}"),
        value: format_count(*n),
    }));
    rows.extend(report.parse_failures.samples.iter().map(|e| QualityRow {
        check: "Sample error".to_string(),
        value: e.to_string(),
    }));
    rows
}
