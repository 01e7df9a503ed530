//! Raw rows to canonical records.
//!
//! The pipeline runs in a fixed order: rename headers, parse typed fields,
//! drop exact duplicates, pad administrative codes, then enrich with
//! department and region names and coordinates.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use csv::StringRecord;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::{ParseError, ParseSummary};
use crate::reference::{ReferenceTables, UNKNOWN};
use crate::types::{CanonicalRecord, EntityRole, ParsedRecord, RawRecord};
use crate::util::{format_decimal_comma, pad_code, parse_decimal_comma, parse_i32_safe, parse_i64_safe};

/// Source header label -> canonical field name.
///
/// Both department spellings seen across dataset versions are accepted.
pub const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("Code_region", "region_code"),
    ("Code_departement", "department_code"),
    ("Code_department", "department_code"),
    ("annee", "year"),
    ("indicateur", "crime_type"),
    ("unite_de_compte", "entity_role"),
    ("nombre", "amount"),
    ("taux_pour_mille", "rate_per_1000"),
    ("insee_pop", "population"),
    ("insee_pop_millesime", "population_year"),
    ("insee_log", "housing"),
    ("insee_log_millesime", "housing_year"),
];

/// Canonical field names, in output order.
pub const CANONICAL_COLUMNS: &[&str] = &[
    "region_code",
    "department_code",
    "year",
    "crime_type",
    "entity_role",
    "amount",
    "rate_per_1000",
    "population",
    "population_year",
    "housing",
    "housing_year",
];

/// Default number of parse errors kept as examples in a [`LoadReport`].
pub const DEFAULT_ERROR_SAMPLE_SIZE: usize = 5;

/// Maps a header label to its canonical name. Unknown labels pass through.
#[must_use]
pub fn canonical_column(label: &str) -> &str {
    let label = label.trim();
    COLUMN_RENAMES
        .iter()
        .find(|(source, _)| *source == label)
        .map_or(label, |(_, canonical)| *canonical)
}

#[must_use]
pub fn rename_headers(headers: &StringRecord) -> StringRecord {
    headers.iter().map(canonical_column).collect()
}

/// Renames headers and blanks every later column that maps to an already
/// seen name. The first occurrence wins; blanked columns are ignored.
#[must_use]
pub fn unique_headers(headers: &StringRecord) -> StringRecord {
    let mut seen = HashSet::new();
    rename_headers(headers)
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if seen.insert(name.to_string()) {
                name.to_string()
            } else {
                log::warn!(
                    "ignoring column {} ({:?}): duplicate of {name}",
                    i + 1,
                    headers.get(i).unwrap_or_default()
                );
                String::new()
            }
        })
        .collect()
}

/// Which lookup resolves a record's region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum RegionPath {
    /// Department code -> owning region. The canonical path.
    #[default]
    Department,
    /// The row's own region code -> region.
    RegionCode,
}

/// Header plus string cells, as read from the source file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: StringRecord,
    rows: Vec<(usize, StringRecord)>,
    rejected: Vec<ParseError>,
    next_row: usize,
}

impl RawTable {
    #[must_use]
    pub fn new(headers: StringRecord) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    /// Convenience constructor over string slices.
    #[must_use]
    pub fn from_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        let mut table = Self::new(StringRecord::from(headers.to_vec()));
        for row in rows {
            table.push(StringRecord::from(row.clone()));
        }
        table
    }

    pub fn push(&mut self, cells: StringRecord) {
        self.rows.push((self.next_row, cells));
        self.next_row += 1;
    }

    /// Records a row that could not be decoded at the CSV level.
    pub fn reject(&mut self, reason: impl Into<String>) {
        self.rejected.push(ParseError {
            row: self.next_row,
            column: "record".to_string(),
            value: reason.into(),
        });
        self.next_row += 1;
    }

    #[must_use]
    pub const fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Number of data rows seen, including rejected ones.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.next_row
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.next_row == 0
    }

    /// Cells of the data row at `index`, if it was decoded.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&StringRecord> {
        self.rows
            .iter()
            .find(|(row, _)| *row == index)
            .map(|(_, cells)| cells)
    }
}

/// Counters describing one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_failures: ParseSummary,
    pub duplicates_removed: usize,
    pub unknown_departments: usize,
    pub unknown_regions: usize,
    pub region_mismatches: usize,
    pub canonical_rows: usize,
    /// Absent or blank cells per column, counted before any row is dropped.
    /// Columns with none are left out.
    pub missing: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct NormalizeOutput {
    pub records: Vec<CanonicalRecord>,
    pub report: LoadReport,
}

/// Turns [`RawTable`]s into canonical records against a fixed set of
/// reference tables.
#[derive(Debug, Clone)]
pub struct Normalizer {
    tables: Arc<ReferenceTables>,
    region_path: RegionPath,
    error_sample_size: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ReferenceTables::builtin())
    }
}

impl Normalizer {
    #[must_use]
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self {
            tables,
            region_path: RegionPath::Department,
            error_sample_size: DEFAULT_ERROR_SAMPLE_SIZE,
        }
    }

    #[must_use]
    pub fn with_region_path(mut self, region_path: RegionPath) -> Self {
        self.region_path = region_path;
        self
    }

    #[must_use]
    pub fn with_error_sample_size(mut self, size: usize) -> Self {
        self.error_sample_size = size;
        self
    }

    #[must_use]
    pub const fn region_path(&self) -> RegionPath {
        self.region_path
    }

    pub fn normalize(&self, table: RawTable) -> NormalizeOutput {
        let mut report = LoadReport {
            total_rows: table.len(),
            ..LoadReport::default()
        };
        for error in table.rejected {
            report.parse_failures.record(error, self.error_sample_size);
        }

        let headers = unique_headers(&table.headers);
        let extra_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty() && !CANONICAL_COLUMNS.contains(name))
            .map(|(i, name)| (i, name.to_string()))
            .collect();
        let checked_columns: Vec<(Option<usize>, &str)> = CANONICAL_COLUMNS
            .iter()
            .map(|name| (headers.iter().position(|h| h == *name), *name))
            .chain(extra_columns.iter().map(|(i, name)| (Some(*i), name.as_str())))
            .collect();

        let mut parsed = Vec::with_capacity(table.rows.len());
        for (row, cells) in &table.rows {
            count_missing(cells, &checked_columns, &mut report.missing);
            match parse_row(*row, cells, &headers, &extra_columns) {
                Ok(record) => parsed.push(record),
                Err(e) => report.parse_failures.record(e, self.error_sample_size),
            }
        }
        log::debug!(
            "parsed {} of {} rows ({} failed)",
            parsed.len(),
            report.total_rows,
            report.parse_failures.count
        );

        report.duplicates_removed = dedup(&mut parsed);
        log::debug!("removed {} duplicate rows", report.duplicates_removed);

        let records: Vec<CanonicalRecord> = parsed
            .into_iter()
            .map(|r| self.pad_codes(r))
            .map(|r| self.enrich(r, &mut report))
            .collect();
        report.canonical_rows = records.len();

        if !report.parse_failures.is_empty() {
            let first = report
                .parse_failures
                .samples
                .first()
                .map(ToString::to_string)
                .unwrap_or_default();
            log::warn!(
                "dropped {} rows with unparseable values (first: {first})",
                report.parse_failures.count
            );
        }
        if report.unknown_departments > 0 || report.unknown_regions > 0 {
            log::warn!(
                "{} rows with unknown department, {} with unknown region",
                report.unknown_departments,
                report.unknown_regions
            );
        }
        if report.region_mismatches > 0 {
            log::debug!(
                "{} rows carry a region code that disagrees with their department",
                report.region_mismatches
            );
        }

        NormalizeOutput { records, report }
    }

    fn pad_codes(&self, mut r: ParsedRecord) -> ParsedRecord {
        r.department_code = pad_code(&r.department_code, |c| self.tables.is_department(c));
        r.region_code = pad_code(&r.region_code, |c| self.tables.is_region(c));
        r
    }

    fn enrich(&self, r: ParsedRecord, report: &mut LoadReport) -> CanonicalRecord {
        let department = self.tables.department(&r.department_code);
        if department.is_none() {
            report.unknown_departments += 1;
        }

        let region = match self.region_path {
            RegionPath::Department => {
                if let Some(d) = department {
                    if !r.region_code.is_empty() && d.region_code != r.region_code {
                        report.region_mismatches += 1;
                    }
                }
                self.tables.region_of_department(&r.department_code)
            }
            RegionPath::RegionCode => self.tables.region(&r.region_code),
        };
        if region.is_none() {
            report.unknown_regions += 1;
        }

        CanonicalRecord {
            department_name: department.map_or(UNKNOWN, |d| d.name).to_string(),
            department_coordinates: department.map(|d| d.seat),
            region_name: region.map_or(UNKNOWN, |reg| reg.name).to_string(),
            region_coordinates: region.map(|reg| reg.seat),
            region_code: r.region_code,
            department_code: r.department_code,
            year: r.year,
            crime_type: r.crime_type,
            entity_role: r.entity_role,
            amount: r.amount,
            rate_per_1000: r.rate_per_1000,
            population: r.population,
            population_year: r.population_year,
            housing: r.housing,
            housing_year: r.housing_year,
            extra: r.extra,
        }
    }
}

fn count_missing(
    cells: &StringRecord,
    columns: &[(Option<usize>, &str)],
    missing: &mut BTreeMap<String, usize>,
) {
    for (index, name) in columns {
        let blank = index
            .and_then(|i| cells.get(i))
            .map_or(true, |cell| cell.trim().is_empty());
        if blank {
            *missing.entry((*name).to_string()).or_default() += 1;
        }
    }
}

fn parse_row(
    row: usize,
    cells: &StringRecord,
    headers: &StringRecord,
    extra_columns: &[(usize, String)],
) -> Result<ParsedRecord, ParseError> {
    let mut raw: RawRecord = cells.deserialize(Some(headers)).map_err(|e| ParseError {
        row,
        column: "record".to_string(),
        value: e.to_string(),
    })?;
    raw.extra = extra_columns
        .iter()
        .map(|(i, name)| (name.clone(), cells.get(*i).unwrap_or_default().to_string()))
        .collect();
    parse_record(row, raw)
}

fn invalid(row: usize, column: &str, value: Option<&str>) -> ParseError {
    ParseError {
        row,
        column: column.to_string(),
        value: value.unwrap_or_default().to_string(),
    }
}

/// Types one renamed row. The rate is checked first.
pub(crate) fn parse_record(row: usize, raw: RawRecord) -> Result<ParsedRecord, ParseError> {
    let rate_per_1000 = parse_decimal_comma(raw.rate_per_1000.as_deref())
        .ok_or_else(|| invalid(row, "rate_per_1000", raw.rate_per_1000.as_deref()))?;

    let int32 = |column: &str, value: &Option<String>| {
        parse_i32_safe(value.as_deref()).ok_or_else(|| invalid(row, column, value.as_deref()))
    };
    let int64 = |column: &str, value: &Option<String>| {
        parse_i64_safe(value.as_deref()).ok_or_else(|| invalid(row, column, value.as_deref()))
    };

    let year = int32("year", &raw.year)?;
    let amount = int64("amount", &raw.amount)?;
    let population = int64("population", &raw.population)?;
    let population_year = int32("population_year", &raw.population_year)?;
    let housing = int64("housing", &raw.housing)?;
    let housing_year = int32("housing_year", &raw.housing_year)?;

    let entity_role = raw
        .entity_role
        .as_deref()
        .map(str::trim)
        .and_then(|s| EntityRole::from_str(s).ok())
        .ok_or_else(|| invalid(row, "entity_role", raw.entity_role.as_deref()))?;

    let crime_type = raw
        .crime_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(row, "crime_type", raw.crime_type.as_deref()))?
        .to_string();

    Ok(ParsedRecord {
        region_code: raw.region_code.unwrap_or_default(),
        department_code: raw.department_code.unwrap_or_default(),
        year,
        crime_type,
        entity_role,
        amount,
        rate_per_1000,
        population,
        population_year,
        housing,
        housing_year,
        extra: raw.extra,
    })
}

/// Full-row identity used for exact-duplicate detection. `0.0` and `-0.0`
/// compare equal, as they do numerically.
#[derive(PartialEq, Eq, Hash)]
struct RowIdentity<'a> {
    region_code: &'a str,
    department_code: &'a str,
    year: i32,
    crime_type: &'a str,
    entity_role: EntityRole,
    amount: i64,
    rate_bits: u64,
    population: i64,
    population_year: i32,
    housing: i64,
    housing_year: i32,
    extra: &'a [(String, String)],
}

impl<'a> RowIdentity<'a> {
    fn of(r: &'a ParsedRecord) -> Self {
        Self {
            region_code: &r.region_code,
            department_code: &r.department_code,
            year: r.year,
            crime_type: &r.crime_type,
            entity_role: r.entity_role,
            amount: r.amount,
            rate_bits: if r.rate_per_1000 == 0.0 {
                0
            } else {
                r.rate_per_1000.to_bits()
            },
            population: r.population,
            population_year: r.population_year,
            housing: r.housing,
            housing_year: r.housing_year,
            extra: &r.extra,
        }
    }
}

/// Drops rows equal to an earlier row, keeping order. Returns how many were
/// removed.
fn dedup(records: &mut Vec<ParsedRecord>) -> usize {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(records.len());
        records
            .iter()
            .map(|r| seen.insert(RowIdentity::of(r)))
            .collect()
    };
    let before = records.len();
    let mut keep = keep.into_iter();
    records.retain(|_| keep.next().unwrap_or(true));
    before - records.len()
}

/// Renders canonical records back to a [`RawTable`] with canonical headers.
///
/// Enrichment columns are left out since normalization derives them again.
#[must_use]
pub fn to_raw_table(records: &[CanonicalRecord]) -> RawTable {
    let mut headers: StringRecord = CANONICAL_COLUMNS.iter().copied().collect();
    if let Some(first) = records.first() {
        for (name, _) in &first.extra {
            headers.push_field(name);
        }
    }
    let mut table = RawTable::new(headers);
    for r in records {
        let mut cells = StringRecord::from(vec![
            r.region_code.clone(),
            r.department_code.clone(),
            r.year.to_string(),
            r.crime_type.clone(),
            r.entity_role.to_string(),
            r.amount.to_string(),
            format_decimal_comma(r.rate_per_1000),
            r.population.to_string(),
            r.population_year.to_string(),
            r.housing.to_string(),
            r.housing_year.to_string(),
        ]);
        for (_, value) in &r.extra {
            cells.push_field(value);
        }
        table.push(cells);
    }
    table
}
