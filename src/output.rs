use delinquency_explorer::query::AggregateTable;
use delinquency_explorer::util::format_number;
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn aggregate_header(table: &AggregateTable) -> Vec<String> {
    table
        .columns
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once(format!("{}({})", table.func, table.metric)))
        .collect()
}

/// Group tables have a runtime shape, so they are written record by record
/// rather than through serde.
pub fn write_aggregate_csv(path: &Path, table: &AggregateTable) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(aggregate_header(table))?;
    for row in &table.rows {
        let mut record: Vec<String> = row.key.iter().map(ToString::to_string).collect();
        record.push(row.value.to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn render_aggregate(table: &AggregateTable, max_rows: usize) -> Option<String> {
    if table.is_empty() || max_rows == 0 {
        return None;
    }
    let mut builder = Builder::default();
    builder.push_record(aggregate_header(table));
    for row in table.rows.iter().take(max_rows) {
        let mut record: Vec<String> = row.key.iter().map(ToString::to_string).collect();
        record.push(format_number(row.value, 2));
        builder.push_record(record);
    }
    Some(builder.build().with(Style::markdown()).to_string())
}

fn print_heading(title: &str, note: Option<&str>) {
    println!("\n{title}");
    if let Some(n) = note {
        println!("({n})");
    }
    println!();
}

fn print_body(rendered: Option<String>, total: usize, max_rows: usize) {
    match rendered {
        Some(table) => println!("{table}"),
        None => println!("(no rows)"),
    }
    if total > max_rows {
        println!("({max_rows} of {total} rows shown)");
    }
    println!();
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    print_heading(title, note);
    print_body(render_table(rows, max_rows), rows.len(), max_rows);
}

pub fn preview_aggregate(title: &str, note: Option<&str>, table: &AggregateTable, max_rows: usize) {
    print_heading(title, note);
    print_body(render_aggregate(table, max_rows), table.len(), max_rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinquency_explorer::query::{AggFn, AggregateRow, Column, KeyValue, Metric};
    use delinquency_explorer::types::QualityRow;

    fn table() -> AggregateTable {
        AggregateTable {
            columns: vec![Column::Year, Column::CrimeType],
            metric: Metric::Amount,
            func: AggFn::Sum,
            rows: vec![
                AggregateRow {
                    key: vec![KeyValue::Year(2016), KeyValue::from("Vols")],
                    value: 1234.5,
                },
                AggregateRow {
                    key: vec![KeyValue::Year(2017), KeyValue::from("Coups")],
                    value: 10.0,
                },
            ],
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("delinquency-output-{}-{name}", std::process::id()))
    }

    #[test]
    fn aggregate_renders_as_markdown() {
        let rendered = render_aggregate(&table(), 1).unwrap();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("year") && lines[0].contains("sum(amount)"));
        assert!(lines[2].contains("2016") && lines[2].contains("1,234.50"));
        assert!(render_aggregate(&table(), 0).is_none());
    }

    #[test]
    fn empty_rows_render_nothing() {
        let rows: Vec<QualityRow> = Vec::new();
        assert!(render_table(&rows, 5).is_none());
    }

    #[test]
    fn aggregate_csv_has_header_and_raw_values() {
        let path = temp_path("aggregate.csv");
        write_aggregate_csv(&path, &table()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(
            written,
            "year,crime_type,sum(amount)\n2016,Vols,1234.5\n2017,Coups,10\n"
        );
    }

    #[test]
    fn json_export_round_trips_through_serde_json() {
        let path = temp_path("quality.json");
        let rows = vec![QualityRow {
            check: "Rows read".to_string(),
            value: "3".to_string(),
        }];
        write_json(&path, &rows).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(parsed[0]["Check"], "Rows read");
    }
}
