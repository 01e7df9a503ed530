use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tabled::Tabled;

use crate::reference::Coordinates;
use crate::util::format_number;

/// One source row after header renaming. Every cell is kept as text so that
/// parse failures can be reported with the original value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    pub region_code: Option<String>,
    pub department_code: Option<String>,
    pub year: Option<String>,
    pub crime_type: Option<String>,
    pub entity_role: Option<String>,
    pub amount: Option<String>,
    pub rate_per_1000: Option<String>,
    pub population: Option<String>,
    pub population_year: Option<String>,
    pub housing: Option<String>,
    pub housing_year: Option<String>,
    /// Columns the rename table does not know about, in header order.
    #[serde(skip)]
    pub extra: Vec<(String, String)>,
}

/// Participant perspective a record is filed under.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityRole {
    #[strum(to_string = "victim", serialize = "victime")]
    Victim,
    Infraction,
    #[strum(to_string = "vehicle", serialize = "véhicule", serialize = "vehicule")]
    Vehicle,
    #[strum(to_string = "perpetrator", serialize = "mis en cause", serialize = "mis_en_cause")]
    Perpetrator,
}

/// A typed row before geographic enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub region_code: String,
    pub department_code: String,
    pub year: i32,
    pub crime_type: String,
    pub entity_role: EntityRole,
    pub amount: i64,
    pub rate_per_1000: f64,
    pub population: i64,
    pub population_year: i32,
    pub housing: i64,
    pub housing_year: i32,
    pub extra: Vec<(String, String)>,
}

/// A fully normalized row: typed fields plus department and region
/// enrichment. Names are never empty; unknown codes read `"Unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub region_code: String,
    pub department_code: String,
    pub year: i32,
    pub crime_type: String,
    pub entity_role: EntityRole,
    pub amount: i64,
    pub rate_per_1000: f64,
    pub population: i64,
    pub population_year: i32,
    pub housing: i64,
    pub housing_year: i32,
    pub department_name: String,
    pub department_coordinates: Option<Coordinates>,
    pub region_name: String,
    pub region_coordinates: Option<Coordinates>,
    #[serde(skip)]
    pub extra: Vec<(String, String)>,
}

fn fmt0(v: &f64) -> String {
    format_number(*v, 0)
}

fn fmt2(v: &f64) -> String {
    format_number(*v, 2)
}

fn fmt_opt_pct(v: &Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |p| format!("{}%", format_number(p, 2)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct OverviewMetrics {
    #[serde(rename = "TotalRecords")]
    #[tabled(rename = "Total Records")]
    pub total_records: usize,
    #[serde(rename = "Regions")]
    #[tabled(rename = "Regions")]
    pub regions: usize,
    #[serde(rename = "Departments")]
    #[tabled(rename = "Departments")]
    pub departments: usize,
    #[serde(rename = "YearsCovered")]
    #[tabled(rename = "Years Covered")]
    pub years_covered: usize,
    #[serde(rename = "CrimeTypes")]
    #[tabled(rename = "Crime Types")]
    pub crime_types: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct EntityCountRow {
    #[serde(rename = "EntityRole")]
    #[tabled(rename = "Entity Role")]
    pub entity_role: String,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: usize,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "Share", display_with = "fmt_opt_pct")]
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Tabled)]
pub struct RateSummary {
    #[serde(rename = "AverageRate")]
    #[tabled(rename = "Average Rate /1000", display_with = "fmt2")]
    pub mean: f64,
    #[serde(rename = "HighestRate")]
    #[tabled(rename = "Highest Rate /1000", display_with = "fmt2")]
    pub max: f64,
    #[serde(rename = "MedianRate")]
    #[tabled(rename = "Median Rate /1000", display_with = "fmt2")]
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DepartmentRankRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "DepartmentCode")]
    #[tabled(rename = "Code")]
    pub department_code: String,
    #[serde(rename = "Department")]
    #[tabled(rename = "Department")]
    pub department_name: String,
    #[serde(rename = "MeanRate")]
    #[tabled(rename = "Mean Rate /1000", display_with = "fmt2")]
    pub mean_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "CrimeType")]
    #[tabled(rename = "Crime Type")]
    pub crime_type: String,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: usize,
    #[serde(rename = "Amount")]
    #[tabled(rename = "Amount", display_with = "fmt0")]
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct BreakdownRow {
    #[serde(rename = "EntityRole")]
    #[tabled(rename = "Entity Role")]
    pub entity_role: String,
    #[serde(rename = "CrimeType")]
    #[tabled(rename = "Crime Type")]
    pub crime_type: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total", display_with = "fmt2")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DepartmentShareRow {
    #[serde(rename = "DepartmentCode")]
    #[tabled(rename = "Code")]
    pub department_code: String,
    #[serde(rename = "Department")]
    #[tabled(rename = "Department")]
    pub department_name: String,
    #[serde(rename = "TotalAmount")]
    #[tabled(rename = "Total Amount", display_with = "fmt0")]
    pub total_amount: f64,
    #[serde(rename = "RegionSharePct")]
    #[tabled(rename = "Share of Region", display_with = "fmt_opt_pct")]
    pub share_pct: Option<f64>,
}

/// One department in the rate-vs-population scatter view.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CorrelationPoint {
    #[serde(rename = "DepartmentCode")]
    #[tabled(rename = "Code")]
    pub department_code: String,
    #[serde(rename = "Department")]
    #[tabled(rename = "Department")]
    pub department_name: String,
    #[serde(rename = "TotalAmount")]
    #[tabled(rename = "Total Amount", display_with = "fmt0")]
    pub total_amount: f64,
    /// Population of the first record seen for the department.
    #[serde(rename = "Population")]
    #[tabled(rename = "Population")]
    pub population: i64,
    #[serde(rename = "MeanRate")]
    #[tabled(rename = "Mean Rate /1000", display_with = "fmt2")]
    pub mean_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillDownReport {
    pub region: String,
    /// Region total amount as a percentage of the national total amount.
    pub national_share_pct: Option<f64>,
    pub departments: Vec<DepartmentShareRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct QualityRow {
    #[serde(rename = "Check")]
    #[tabled(rename = "Check")]
    pub check: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}
