//! Pure, deterministic queries over a [`Dataset`].
//!
//! Nothing here mutates its input: filters build a new dataset and
//! aggregations build new tables. Group rows come out in ascending key order,
//! and "first" means first in dataset order within the group.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::dataset::Dataset;
use crate::error::QueryError;
use crate::types::{CanonicalRecord, CorrelationPoint, EntityRole};
use crate::util::{mean, median};

/// Categorical columns a dataset can be grouped or broken down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    RegionCode,
    /// Region display name.
    #[strum(to_string = "region", serialize = "region_name")]
    Region,
    DepartmentCode,
    /// Department display name.
    #[strum(to_string = "department", serialize = "department_name")]
    Department,
    Year,
    CrimeType,
    EntityRole,
}

impl Column {
    fn key(self, r: &CanonicalRecord) -> KeyValue {
        match self {
            Self::RegionCode => KeyValue::Text(r.region_code.clone()),
            Self::Region => KeyValue::Text(r.region_name.clone()),
            Self::DepartmentCode => KeyValue::Text(r.department_code.clone()),
            Self::Department => KeyValue::Text(r.department_name.clone()),
            Self::Year => KeyValue::Year(r.year),
            Self::CrimeType => KeyValue::Text(r.crime_type.clone()),
            Self::EntityRole => KeyValue::Text(r.entity_role.to_string()),
        }
    }
}

/// Numeric columns an aggregation can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Amount,
    #[strum(to_string = "rate_per_1000")]
    #[serde(rename = "rate_per_1000")]
    RatePer1000,
    Population,
    Housing,
}

impl Metric {
    #[allow(clippy::cast_precision_loss)]
    fn value(self, r: &CanonicalRecord) -> f64 {
        match self {
            Self::Amount => r.amount as f64,
            Self::RatePer1000 => r.rate_per_1000,
            Self::Population => r.population as f64,
            Self::Housing => r.housing as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum AggFn {
    Sum,
    Mean,
    Median,
    Max,
    Min,
    /// Number of records; the metric is ignored.
    Count,
    /// Value of the first record in iteration order.
    First,
}

impl AggFn {
    /// `None` only for an empty input.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        let first = *values.first()?;
        match self {
            Self::Sum => Some(values.iter().sum()),
            Self::Mean => mean(values),
            Self::Median => median(values),
            Self::Max => Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            Self::Min => Some(values.iter().copied().fold(f64::INFINITY, f64::min)),
            Self::Count => Some(values.len() as f64),
            Self::First => Some(first),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Largest values first.
    Top,
    /// Smallest values first.
    Bottom,
}

/// One component of a group key. Years order numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Year(i32),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(y) => write!(f, "{y}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i32> for KeyValue {
    fn from(y: i32) -> Self {
        Self::Year(y)
    }
}

/// Row predicates, combined by intersection. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub entity_role: Option<EntityRole>,
    /// Inclusive `(min, max)`.
    pub years: Option<(i32, i32)>,
    pub crime_type: Option<String>,
    /// Region display name.
    pub region: Option<String>,
}

impl Filter {
    #[must_use]
    pub fn entity_role(mut self, role: EntityRole) -> Self {
        self.entity_role = Some(role);
        self
    }

    #[must_use]
    pub fn years(mut self, min: i32, max: i32) -> Self {
        self.years = Some((min, max));
        self
    }

    #[must_use]
    pub fn crime_type(mut self, crime_type: impl Into<String>) -> Self {
        self.crime_type = Some(crime_type.into());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn validate(&self) -> Result<(), QueryError> {
        match self.years {
            Some((min, max)) if min > max => Err(QueryError::InvalidYearRange { min, max }),
            _ => Ok(()),
        }
    }

    fn matches(&self, r: &CanonicalRecord) -> bool {
        self.entity_role.map_or(true, |role| r.entity_role == role)
            && self
                .years
                .map_or(true, |(min, max)| (min..=max).contains(&r.year))
            && self
                .crime_type
                .as_deref()
                .map_or(true, |c| r.crime_type == c)
            && self.region.as_deref().map_or(true, |reg| r.region_name == reg)
    }
}

/// Rows of `dataset` matching every predicate of `filter`, in order.
///
/// An empty filter returns the input itself (sharing its storage).
///
/// # Errors
///
/// [`QueryError::InvalidYearRange`] if the year range is inverted.
pub fn filter(dataset: &Dataset, filter: &Filter) -> Result<Dataset, QueryError> {
    filter.validate()?;
    if filter.is_empty() {
        return Ok(dataset.clone());
    }
    Ok(Dataset::new(
        dataset
            .records()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<KeyValue>,
    pub value: f64,
}

/// Result of a group-and-aggregate, or of ranking one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub columns: Vec<Column>,
    pub metric: Metric,
    pub func: AggFn,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value for an exact key, if that group exists.
    #[must_use]
    pub fn get(&self, key: &[KeyValue]) -> Option<f64> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.value)
    }

    /// Copy of this table keeping only the rows whose key satisfies `keep`.
    #[must_use]
    pub fn retain_keys(&self, keep: impl Fn(&[KeyValue]) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            metric: self.metric,
            func: self.func,
            rows: self.rows.iter().filter(|r| keep(&r.key)).cloned().collect(),
        }
    }
}

fn validate_group_columns(by: &[Column]) -> Result<(), QueryError> {
    match by {
        [] => Err(QueryError::EmptyGroupBy),
        [a, b] if a == b => Err(QueryError::DuplicateColumn(*a)),
        [_] | [_, _] => Ok(()),
        _ => Err(QueryError::TooManyGroupColumns { count: by.len() }),
    }
}

/// Group by one or two columns and reduce `metric` with `func` per group.
///
/// # Errors
///
/// [`QueryError`] if `by` is empty, longer than two, or repeats a column.
pub fn group_aggregate(
    dataset: &Dataset,
    by: &[Column],
    metric: Metric,
    func: AggFn,
) -> Result<AggregateTable, QueryError> {
    validate_group_columns(by)?;
    let mut groups: BTreeMap<Vec<KeyValue>, Vec<f64>> = BTreeMap::new();
    for r in dataset.records() {
        let key: Vec<KeyValue> = by.iter().map(|c| c.key(r)).collect();
        groups.entry(key).or_default().push(metric.value(r));
    }
    let rows = groups
        .into_iter()
        .filter_map(|(key, values)| func.apply(&values).map(|value| AggregateRow { key, value }))
        .collect();
    Ok(AggregateTable {
        columns: by.to_vec(),
        metric,
        func,
        rows,
    })
}

/// `func` over `metric` for the whole dataset; `None` when it is empty.
#[must_use]
pub fn aggregate_all(dataset: &Dataset, metric: Metric, func: AggFn) -> Option<f64> {
    let values: Vec<f64> = dataset.records().iter().map(|r| metric.value(r)).collect();
    func.apply(&values)
}

/// `subset` as a percentage of `full`, with the same aggregation on both
/// sides. `None` if either side is empty or the denominator is zero.
#[must_use]
pub fn share_of_total(subset: &Dataset, full: &Dataset, metric: Metric, func: AggFn) -> Option<f64> {
    let part = aggregate_all(subset, metric, func)?;
    let whole = aggregate_all(full, metric, func)?;
    if whole == 0.0 {
        return None;
    }
    Some(part / whole * 100.0)
}

/// The `k` best (or worst) groups of `table`. Ties keep key order; fewer
/// than `k` groups yields all of them.
#[must_use]
pub fn rank(table: &AggregateTable, k: usize, direction: Direction) -> AggregateTable {
    let mut rows = table.rows.clone();
    match direction {
        Direction::Top => rows.sort_by(|a, b| b.value.total_cmp(&a.value)),
        Direction::Bottom => rows.sort_by(|a, b| a.value.total_cmp(&b.value)),
    }
    rows.truncate(k);
    AggregateTable {
        columns: table.columns.clone(),
        metric: table.metric,
        func: table.func,
        rows,
    }
}

#[must_use]
pub fn top_k(table: &AggregateTable, k: usize) -> AggregateTable {
    rank(table, k, Direction::Top)
}

#[must_use]
pub fn bottom_k(table: &AggregateTable, k: usize) -> AggregateTable {
    rank(table, k, Direction::Bottom)
}

/// Group value -> breakdown value -> summed metric.
pub type CrossTab = BTreeMap<KeyValue, BTreeMap<KeyValue, f64>>;

/// Sum `metric` for each `(group, breakdown)` pair that occurs in the data.
/// Pairs with no rows are absent rather than zero.
///
/// # Errors
///
/// [`QueryError::DuplicateColumn`] if both columns are the same.
pub fn cross_tab(
    dataset: &Dataset,
    group: Column,
    breakdown: Column,
    metric: Metric,
) -> Result<CrossTab, QueryError> {
    if group == breakdown {
        return Err(QueryError::DuplicateColumn(group));
    }
    let mut out = CrossTab::new();
    for r in dataset.records() {
        *out.entry(group.key(r))
            .or_default()
            .entry(breakdown.key(r))
            .or_insert(0.0) += metric.value(r);
    }
    Ok(out)
}

/// One point per department code, ascending: total amount, first-seen
/// population and mean rate.
#[must_use]
pub fn correlation(dataset: &Dataset) -> Vec<CorrelationPoint> {
    struct Acc<'a> {
        name: &'a str,
        population: i64,
        amount: f64,
        rates: Vec<f64>,
    }
    let mut by_department: BTreeMap<&str, Acc<'_>> = BTreeMap::new();
    for r in dataset.records() {
        let acc = by_department
            .entry(r.department_code.as_str())
            .or_insert_with(|| Acc {
                name: &r.department_name,
                population: r.population,
                amount: 0.0,
                rates: Vec::new(),
            });
        acc.amount += Metric::Amount.value(r);
        acc.rates.push(r.rate_per_1000);
    }
    by_department
        .into_iter()
        .map(|(code, acc)| CorrelationPoint {
            department_code: code.to_string(),
            department_name: acc.name.to_string(),
            total_amount: acc.amount,
            population: acc.population,
            mean_rate: mean(&acc.rates).unwrap_or_default(),
        })
        .collect()
}

/// Aggregate one region at department-code granularity.
///
/// Equivalent to grouping the whole dataset by department code and keeping
/// only that region's departments.
///
/// # Errors
///
/// Never fails for a valid region name; errors come only from the inner
/// [`group_aggregate`] contract.
pub fn drill_down(
    dataset: &Dataset,
    region: &str,
    metric: Metric,
    func: AggFn,
) -> Result<AggregateTable, QueryError> {
    let subset = filter(dataset, &Filter::default().region(region))?;
    group_aggregate(&subset, &[Column::DepartmentCode], metric, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{Normalizer, RawTable, CANONICAL_COLUMNS};
    use std::str::FromStr;

    // (department, region, year, crime, role, amount, rate, population)
    const ROWS: &[(&str, &str, &str, &str, &str, &str, &str, &str)] = &[
        ("35", "53", "2016", "Vols", "victim", "100", "1,0", "1000"),
        ("35", "53", "2017", "Vols", "victim", "120", "1,2", "1100"),
        ("35", "53", "2016", "Coups", "infraction", "30", "0,3", "1000"),
        ("29", "53", "2016", "Vols", "victim", "50", "0,5", "900"),
        ("29", "53", "2017", "Coups", "infraction", "10", "0,1", "900"),
        ("75", "11", "2016", "Vols", "victim", "400", "2,0", "2000"),
        ("75", "11", "2017", "Cambriolages", "infraction", "200", "1,0", "2000"),
        ("13", "93", "2017", "Vols", "perpetrator", "80", "0,4", "1800"),
        ("2A", "94", "2016", "Homicides", "victim", "2", "0,01", "150"),
    ];

    fn dataset() -> Dataset {
        let rows: Vec<Vec<&str>> = ROWS
            .iter()
            .map(|&(dep, reg, year, crime, role, amount, rate, pop)| {
                vec![reg, dep, year, crime, role, amount, rate, pop, year, "500", year]
            })
            .collect();
        let out = Normalizer::default().normalize(RawTable::from_rows(CANONICAL_COLUMNS, &rows));
        assert_eq!(out.records.len(), ROWS.len());
        Dataset::new(out.records)
    }

    fn key(parts: &[&str]) -> Vec<KeyValue> {
        parts.iter().map(|p| KeyValue::from(*p)).collect()
    }

    fn keys(table: &AggregateTable) -> Vec<String> {
        table
            .rows
            .iter()
            .map(|r| r.key.iter().map(ToString::to_string).collect::<Vec<_>>().join("/"))
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_filter_is_identity() {
        let ds = dataset();
        let out = filter(&ds, &Filter::default()).unwrap();
        assert_eq!(out, ds);
        assert!(out.shares_records_with(&ds));
    }

    #[test]
    fn filter_intersects_predicates() {
        let ds = dataset();
        let f = Filter::default()
            .entity_role(EntityRole::Victim)
            .years(2016, 2016);
        let out = filter(&ds, &f).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.entity_roles(), [EntityRole::Victim]);
        assert_eq!(out.year_range(), Some((2016, 2016)));
        assert_eq!(ds.len(), ROWS.len());
    }

    #[test]
    fn filter_by_crime_type_and_region() {
        let ds = dataset();
        assert_eq!(filter(&ds, &Filter::default().crime_type("Coups")).unwrap().len(), 2);
        let bretagne = filter(&ds, &Filter::default().region("Bretagne")).unwrap();
        assert_eq!(bretagne.len(), 5);
        assert_eq!(bretagne.region_names(), ["Bretagne".to_string()]);
        assert!(filter(&ds, &Filter::default().crime_type("Fraude")).unwrap().is_empty());
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let err = filter(&dataset(), &Filter::default().years(2020, 2016)).unwrap_err();
        assert_eq!(err, QueryError::InvalidYearRange { min: 2020, max: 2016 });
    }

    #[test]
    fn groups_sum_in_key_order() {
        let table =
            group_aggregate(&dataset(), &[Column::DepartmentCode], Metric::Amount, AggFn::Sum)
                .unwrap();
        assert_eq!(keys(&table), vec!["13", "29", "2A", "35", "75"]);
        assert_eq!(table.get(&key(&["35"])), Some(250.0));
        assert_eq!(table.get(&key(&["75"])), Some(600.0));
        assert_eq!(table.get(&key(&["99"])), None);
    }

    #[test]
    fn groups_by_two_columns_with_numeric_year_order() {
        let table = group_aggregate(
            &dataset(),
            &[Column::Year, Column::CrimeType],
            Metric::Amount,
            AggFn::Count,
        )
        .unwrap();
        assert_eq!(
            keys(&table),
            vec![
                "2016/Coups",
                "2016/Homicides",
                "2016/Vols",
                "2017/Cambriolages",
                "2017/Coups",
                "2017/Vols",
            ]
        );
        assert_eq!(
            table.get(&[KeyValue::Year(2016), KeyValue::from("Vols")]),
            Some(3.0)
        );
    }

    #[test]
    fn descriptive_aggregates() {
        let ds = dataset();
        let get = |func| {
            group_aggregate(&ds, &[Column::DepartmentCode], Metric::RatePer1000, func)
                .unwrap()
                .get(&key(&["35"]))
                .unwrap()
        };
        assert!(close(get(AggFn::Mean), 2.5 / 3.0));
        assert!(close(get(AggFn::Median), 1.0));
        assert!(close(get(AggFn::Max), 1.2));
        assert!(close(get(AggFn::Min), 0.3));
        assert!(close(get(AggFn::Count), 3.0));
        assert!(close(get(AggFn::Sum), 2.5));
    }

    #[test]
    fn first_follows_dataset_order() {
        let table =
            group_aggregate(&dataset(), &[Column::DepartmentCode], Metric::Population, AggFn::First)
                .unwrap();
        assert_eq!(table.get(&key(&["35"])), Some(1000.0));
    }

    #[test]
    fn invalid_group_columns_are_rejected() {
        let ds = dataset();
        assert_eq!(
            group_aggregate(&ds, &[], Metric::Amount, AggFn::Sum).unwrap_err(),
            QueryError::EmptyGroupBy
        );
        assert_eq!(
            group_aggregate(
                &ds,
                &[Column::Year, Column::Region, Column::CrimeType],
                Metric::Amount,
                AggFn::Sum
            )
            .unwrap_err(),
            QueryError::TooManyGroupColumns { count: 3 }
        );
        assert_eq!(
            group_aggregate(&ds, &[Column::Year, Column::Year], Metric::Amount, AggFn::Sum)
                .unwrap_err(),
            QueryError::DuplicateColumn(Column::Year)
        );
    }

    #[test]
    fn top_k_returns_all_groups_when_fewer_than_k() {
        let table =
            group_aggregate(&dataset(), &[Column::Region], Metric::Amount, AggFn::Sum).unwrap();
        assert_eq!(table.len(), 4);
        let top = top_k(&table, 10);
        assert_eq!(
            keys(&top),
            vec!["Île-de-France", "Bretagne", "Provence-Alpes-Côte d'Azur", "Corse"]
        );
        assert!(top.rows.windows(2).all(|w| w[0].value >= w[1].value));
        assert_eq!(top.metric, Metric::Amount);
    }

    #[test]
    fn bottom_k_and_zero_k() {
        let table =
            group_aggregate(&dataset(), &[Column::Region], Metric::Amount, AggFn::Sum).unwrap();
        assert_eq!(keys(&bottom_k(&table, 2)), vec!["Corse", "Provence-Alpes-Côte d'Azur"]);
        assert!(top_k(&table, 0).is_empty());
    }

    #[test]
    fn ranking_ties_keep_key_order() {
        let table =
            group_aggregate(&dataset(), &[Column::EntityRole], Metric::Amount, AggFn::Count)
                .unwrap();
        // infraction: 3, perpetrator: 1, victim: 5
        let ranked = rank(&table, 3, Direction::Bottom);
        assert_eq!(keys(&ranked), vec!["perpetrator", "infraction", "victim"]);

        let tied = AggregateTable {
            rows: vec![
                AggregateRow { key: key(&["a"]), value: 1.0 },
                AggregateRow { key: key(&["b"]), value: 2.0 },
                AggregateRow { key: key(&["c"]), value: 1.0 },
            ],
            ..table
        };
        assert_eq!(keys(&top_k(&tied, 3)), vec!["b", "a", "c"]);
    }

    #[test]
    fn cross_tab_omits_absent_combinations() {
        let tab = cross_tab(&dataset(), Column::EntityRole, Column::CrimeType, Metric::Amount)
            .unwrap();
        let victim = &tab[&KeyValue::from("victim")];
        assert_eq!(victim[&KeyValue::from("Vols")], 670.0);
        assert_eq!(victim[&KeyValue::from("Homicides")], 2.0);
        for (role, breakdown) in &tab {
            if role != &KeyValue::from("victim") {
                assert!(!breakdown.contains_key(&KeyValue::from("Homicides")));
            }
        }
        let perpetrator = &tab[&KeyValue::from("perpetrator")];
        assert_eq!(perpetrator.len(), 1);
        assert!(!perpetrator.contains_key(&KeyValue::from("Coups")));
    }

    #[test]
    fn cross_tab_rejects_same_column() {
        assert_eq!(
            cross_tab(&dataset(), Column::Year, Column::Year, Metric::Amount).unwrap_err(),
            QueryError::DuplicateColumn(Column::Year)
        );
    }

    #[test]
    fn correlation_has_one_point_per_department() {
        let points = correlation(&dataset());
        let codes: Vec<_> = points.iter().map(|p| p.department_code.as_str()).collect();
        assert_eq!(codes, vec!["13", "29", "2A", "35", "75"]);
        let rennes = &points[3];
        assert_eq!(rennes.department_name, "Ille-et-Vilaine");
        assert!(close(rennes.total_amount, 250.0));
        assert_eq!(rennes.population, 1000);
        assert!(close(rennes.mean_rate, 2.5 / 3.0));
    }

    #[test]
    fn drill_down_commutes_with_filtering() {
        let ds = dataset();
        for func in [AggFn::Sum, AggFn::Mean, AggFn::Max, AggFn::Count] {
            let drilled = drill_down(&ds, "Bretagne", Metric::Amount, func).unwrap();
            let whole = group_aggregate(&ds, &[Column::DepartmentCode], Metric::Amount, func)
                .unwrap();
            let expected =
                whole.retain_keys(|k| matches!(k, [KeyValue::Text(code)] if code == "29" || code == "35"));
            assert_eq!(drilled, expected);
        }
        assert!(drill_down(&ds, "Normandie", Metric::Amount, AggFn::Sum)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn share_of_total_uses_same_function_on_both_sides() {
        let ds = dataset();
        let bretagne = filter(&ds, &Filter::default().region("Bretagne")).unwrap();
        let share = share_of_total(&bretagne, &ds, Metric::Amount, AggFn::Sum).unwrap();
        assert!(close(share, 310.0 / 992.0 * 100.0));
        let mean_share = share_of_total(&bretagne, &ds, Metric::Amount, AggFn::Mean).unwrap();
        assert!(close(mean_share, (310.0 / 5.0) / (992.0 / 9.0) * 100.0));
        assert_eq!(
            share_of_total(&Dataset::default(), &ds, Metric::Amount, AggFn::Sum),
            None
        );
        assert_eq!(aggregate_all(&Dataset::default(), Metric::Amount, AggFn::Count), None);
    }

    #[test]
    fn parameters_parse_from_strings() {
        assert_eq!(Column::from_str("department_code"), Ok(Column::DepartmentCode));
        assert_eq!(Column::from_str("region_name"), Ok(Column::Region));
        assert_eq!(Metric::from_str("rate_per_1000"), Ok(Metric::RatePer1000));
        assert_eq!(Metric::from_str("RATE_PER_1000"), Ok(Metric::RatePer1000));
        assert_eq!(Metric::RatePer1000.to_string(), "rate_per_1000");
        assert_eq!(
            serde_json::to_string(&Metric::RatePer1000).unwrap(),
            "\"rate_per_1000\""
        );
        assert_eq!(AggFn::from_str("MEDIAN"), Ok(AggFn::Median));
        assert_eq!(Direction::from_str("bottom"), Ok(Direction::Bottom));
        assert!(Column::from_str("postcode").is_err());
    }

    #[test]
    fn concurrent_readers_see_the_same_results() {
        let ds = dataset();
        let expected =
            group_aggregate(&ds, &[Column::Region], Metric::Amount, AggFn::Sum).unwrap();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        group_aggregate(&ds, &[Column::Region], Metric::Amount, AggFn::Sum)
                            .unwrap()
                    })
                })
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }
}
