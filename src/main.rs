//! Command-line front end. Every subcommand loads the dataset through a
//! [`DatasetStore`], runs one view, prints it as markdown and optionally
//! exports it.

mod output;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use delinquency_explorer::config::{parse_delimiter, Config};
use delinquency_explorer::dataset::{Dataset, DatasetStore, LoadedDataset};
use delinquency_explorer::normalize::RegionPath;
use delinquency_explorer::query::{
    correlation, filter, group_aggregate, rank, AggFn, Column, Direction, Filter, Metric,
};
use delinquency_explorer::reference::ReferenceTables;
use delinquency_explorer::reports;
use delinquency_explorer::types::EntityRole;
use delinquency_explorer::util::{format_count, format_number};

#[derive(Parser, Debug)]
#[command(
    name = "delinquency_explorer",
    version,
    about = "Explore recorded delinquency by region, department and year"
)]
struct Cli {
    /// Source file (overrides DELINQUENCY_DATA)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Field delimiter (overrides DELINQUENCY_DELIMITER)
    #[arg(long, global = true, value_parser = parse_delimiter)]
    delimiter: Option<u8>,
    /// How regions are resolved (overrides DELINQUENCY_REGION_PATH)
    #[arg(long, global = true)]
    region_path: Option<RegionPath>,
    /// Directory to write CSV/JSON copies of each view into
    #[arg(long, global = true)]
    export: Option<PathBuf>,
    /// Rows shown per table
    #[arg(long, global = true, default_value_t = 10)]
    rows: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load report and data-quality checks
    Summary,
    /// Overview figures, entity distribution and crime-rate summary
    Kpis(FilterArgs),
    /// Departments ranked by mean infraction rate
    Ranking(RankArgs),
    /// Records and amounts per year and crime type
    Trends {
        #[arg(long = "crime-type")]
        crime_types: Vec<String>,
    },
    /// Group by one or two columns and aggregate a metric
    Aggregate(AggregateArgs),
    /// Entity role by crime type totals
    Crosstab {
        #[arg(long, default_value_t = Metric::Amount)]
        metric: Metric,
    },
    /// Total amount, population and mean rate per department
    Correlation,
    /// Departments of one region with their share of the region total
    Drilldown {
        region: String,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    entity: Option<EntityRole>,
    /// First year, inclusive
    #[arg(long)]
    from: Option<i32>,
    /// Last year, inclusive
    #[arg(long)]
    to: Option<i32>,
    #[arg(long)]
    crime_type: Option<String>,
    /// Region display name
    #[arg(long)]
    region: Option<String>,
}

impl FilterArgs {
    /// An open end of the year range takes the dataset's own bound.
    fn to_filter(&self, ds: &Dataset) -> Filter {
        let years = match (self.from, self.to, ds.year_range()) {
            (None, None, _) => None,
            (Some(from), Some(to), _) => Some((from, to)),
            (Some(from), None, Some((_, hi))) => Some((from, hi)),
            (None, Some(to), Some((lo, _))) => Some((lo, to)),
            (Some(y), None, None) | (None, Some(y), None) => Some((y, y)),
        };
        Filter {
            entity_role: self.entity,
            years,
            crime_type: self.crime_type.clone(),
            region: self.region.clone(),
        }
    }

    fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(role) = self.entity {
            parts.push(format!("entity {role}"));
        }
        match (self.from, self.to) {
            (Some(from), Some(to)) => parts.push(format!("years {from}-{to}")),
            (Some(from), None) => parts.push(format!("from {from}")),
            (None, Some(to)) => parts.push(format!("until {to}")),
            (None, None) => {}
        }
        if let Some(c) = &self.crime_type {
            parts.push(format!("crime type {c}"));
        }
        if let Some(r) = &self.region {
            parts.push(format!("region {r}"));
        }
        (!parts.is_empty()).then(|| format!("Filtered: {}", parts.join(", ")))
    }

    /// `describe` plus how many records survived the filter.
    fn note(&self, shown: usize, total: usize) -> Option<String> {
        self.describe().map(|d| {
            format!(
                "{d}. Showing {} records (filtered from {})",
                format_count(shown),
                format_count(total)
            )
        })
    }
}

#[derive(Args, Debug)]
struct RankArgs {
    /// Keep the K largest groups
    #[arg(long, conflicts_with = "bottom")]
    top: Option<usize>,
    /// Keep the K smallest groups
    #[arg(long)]
    bottom: Option<usize>,
}

impl RankArgs {
    fn resolve(&self) -> Option<(usize, Direction)> {
        match (self.top, self.bottom) {
            (Some(k), _) => Some((k, Direction::Top)),
            (None, Some(k)) => Some((k, Direction::Bottom)),
            (None, None) => None,
        }
    }
}

#[derive(Args, Debug)]
struct AggregateArgs {
    /// One or two comma-separated columns
    #[arg(long, value_delimiter = ',', required = true)]
    by: Vec<Column>,
    #[arg(long, default_value_t = Metric::Amount)]
    metric: Metric,
    #[arg(long, default_value_t = AggFn::Sum)]
    func: AggFn,
    #[command(flatten)]
    rank: RankArgs,
    #[command(flatten)]
    filter: FilterArgs,
}

fn init_logger() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG");
    builder.init();
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn config_for(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(path) = &cli.data {
        config.data_path.clone_from(path);
    }
    if let Some(d) = cli.delimiter {
        config.delimiter = d;
    }
    if let Some(p) = cli.region_path {
        config.region_path = p;
    }
    config
}

/// Writes `rows` as `<dir>/<name>.csv` when exporting is enabled.
fn export_csv<T: serde::Serialize>(
    dir: Option<&Path>,
    name: &str,
    rows: &[T],
) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = dir {
        let path = dir.join(format!("{name}.csv"));
        output::write_csv(&path, rows)?;
        println!("(Full table exported to {})\n", path.display());
    }
    Ok(())
}

fn export_json<T: serde::Serialize + ?Sized>(
    dir: Option<&Path>,
    name: &str,
    value: &T,
) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = dir {
        let path = dir.join(format!("{name}.json"));
        output::write_json(&path, value)?;
        println!("(Exported to {})\n", path.display());
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = config_for(cli);
    let store = DatasetStore::new(&config.data_path, config.load_options());
    log::debug!("region path {}, source {}", config.region_path, store.path().display());
    let loaded = store.get()?;
    let ds = &loaded.dataset;
    let export = cli.export.as_deref();
    if let Some(dir) = export {
        std::fs::create_dir_all(dir)?;
    }
    let max_rows = cli.rows;

    match &cli.command {
        Commands::Summary => summary(&loaded, export, max_rows)?,
        Commands::Kpis(args) => {
            let subset = filter(ds, &args.to_filter(ds))?;
            let note = args.note(subset.len(), ds.len());
            let overview = reports::overview_metrics(&subset);
            output::preview_table("Overview", note.as_deref(), &[overview.clone()], 1);
            export_json(export, "overview", &overview)?;

            let entities = reports::entity_distribution(&subset)?;
            output::preview_table("Entity distribution", note.as_deref(), &entities, max_rows);
            export_csv(export, "entity_distribution", &entities)?;

            match reports::rate_summary(&subset) {
                Some(rates) => {
                    output::preview_table("Crime rate (infractions)", None, &[rates], 1);
                    export_json(export, "rate_summary", &rates)?;
                }
                None => println!("\nCrime rate (infractions)\n\n(no infraction records)\n"),
            }
        }
        Commands::Ranking(args) => {
            let (k, direction) = args.resolve().unwrap_or((10, Direction::Top));
            let rows = reports::department_ranking(ds, k, direction)?;
            let note = format!("{direction} {k} by mean rate per 1000");
            output::preview_table("Department ranking", Some(&note), &rows, max_rows);
            export_csv(export, "department_ranking", &rows)?;
        }
        Commands::Trends { crime_types } => {
            let rows = reports::temporal_trends(ds, crime_types)?;
            output::preview_table("Temporal trends", None, &rows, max_rows);
            export_csv(export, "temporal_trends", &rows)?;
        }
        Commands::Aggregate(args) => {
            let subset = filter(ds, &args.filter.to_filter(ds))?;
            let mut table = group_aggregate(&subset, &args.by, args.metric, args.func)?;
            if let Some((k, direction)) = args.rank.resolve() {
                table = rank(&table, k, direction);
            }
            let title = format!("{}({}) by {}", args.func, args.metric, join(&args.by));
            let note = args.filter.note(subset.len(), ds.len());
            output::preview_aggregate(&title, note.as_deref(), &table, max_rows);
            if let Some(dir) = export {
                let path = dir.join("aggregate.csv");
                output::write_aggregate_csv(&path, &table)?;
                println!("(Full table exported to {})\n", path.display());
            }
        }
        Commands::Crosstab { metric } => {
            let rows = reports::entity_breakdown(ds, *metric)?;
            let note = format!("sum of {metric}");
            output::preview_table("Entity role by crime type", Some(&note), &rows, max_rows);
            export_csv(export, "entity_breakdown", &rows)?;
        }
        Commands::Correlation => {
            let points = correlation(ds);
            output::preview_table("Amount, population and rate", None, &points, max_rows);
            export_csv(export, "correlation", &points)?;
        }
        Commands::Drilldown { region, top } => {
            let report = reports::region_drill_down(ds, region, *top)?;
            let note = report.national_share_pct.map_or_else(
                || "no records for this region".to_string(),
                |p| format!("{}% of national amount", format_number(p, 2)),
            );
            output::preview_table(region, Some(&note), &report.departments, max_rows);
            export_json(export, "drilldown", &report)?;
        }
    }
    Ok(())
}

fn join(columns: &[Column]) -> String {
    columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn summary(loaded: &LoadedDataset, export: Option<&Path>, max_rows: usize) -> Result<(), Box<dyn Error>> {
    let report = &loaded.report;
    println!(
        "Processing dataset... ({} rows loaded, {} kept)",
        format_count(report.total_rows),
        format_count(report.canonical_rows)
    );
    println!(
        "Note: {} rows skipped due to parse errors, {} duplicates removed.",
        format_count(report.parse_failures.count),
        format_count(report.duplicates_removed)
    );
    println!(
        "Source: {} (loaded {}, reference tables {})",
        loaded.source.display(),
        loaded.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ReferenceTables::builtin().version()
    );
    let rows = reports::data_quality(report);
    output::preview_table("Data quality", None, &rows, max_rows.max(rows.len()));
    export_csv(export, "data_quality", &rows)?;
    export_json(export, "load_report", report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aggregate_flags() {
        let cli = Cli::try_parse_from([
            "delinquency_explorer",
            "aggregate",
            "--by",
            "region,year",
            "--metric",
            "rate_per_1000",
            "--func",
            "median",
            "--bottom",
            "3",
            "--entity",
            "victime",
        ])
        .unwrap();
        let Commands::Aggregate(args) = cli.command else {
            panic!("expected aggregate");
        };
        assert_eq!(args.by, vec![Column::Region, Column::Year]);
        assert_eq!(args.metric, Metric::RatePer1000);
        assert_eq!(args.func, AggFn::Median);
        assert_eq!(args.rank.resolve(), Some((3, Direction::Bottom)));
        assert_eq!(args.filter.entity, Some(EntityRole::Victim));
    }

    #[test]
    fn top_and_bottom_conflict() {
        assert!(
            Cli::try_parse_from(["delinquency_explorer", "ranking", "--top", "3", "--bottom", "2"])
                .is_err()
        );
    }

    #[test]
    fn global_flags_override_config() {
        let cli = Cli::try_parse_from([
            "delinquency_explorer",
            "--data",
            "other.csv",
            "--delimiter",
            ",",
            "--region-path",
            "region_code",
            "summary",
        ])
        .unwrap();
        let config = config_for(&cli);
        assert_eq!(config.data_path, PathBuf::from("other.csv"));
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.region_path, RegionPath::RegionCode);
    }

    #[test]
    fn open_year_bounds_use_dataset_range() {
        let args = FilterArgs {
            from: Some(2018),
            ..FilterArgs::default()
        };
        assert_eq!(args.to_filter(&Dataset::default()).years, Some((2018, 2018)));
        assert_eq!(FilterArgs::default().to_filter(&Dataset::default()), Filter::default());
        assert_eq!(
            args.describe().as_deref(),
            Some("Filtered: from 2018")
        );
    }

    #[test]
    fn filter_note_reports_shown_and_total_counts() {
        let args = FilterArgs {
            entity: Some(EntityRole::Victim),
            ..FilterArgs::default()
        };
        assert_eq!(
            args.note(1250, 98_000).as_deref(),
            Some("Filtered: entity victim. Showing 1,250 records (filtered from 98,000)")
        );
        assert_eq!(FilterArgs::default().note(10, 10), None);
    }
}
