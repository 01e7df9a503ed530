use std::path::PathBuf;

use delinquency_explorer::query::{
    cross_tab, filter, group_aggregate, top_k, AggFn, Column, Filter, KeyValue, Metric,
};
use delinquency_explorer::reports;
use delinquency_explorer::{
    load_dataset, load_dataset_with, DatasetStore, EntityRole, LoadError, LoadOptions, Normalizer,
    RegionPath,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn comma_options(region_path: RegionPath) -> LoadOptions {
    LoadOptions {
        delimiter: b',',
        normalizer: Normalizer::default().with_region_path(region_path),
    }
}

#[test]
fn six_row_fixture_keeps_four_records() {
    let loaded = load_dataset(fixture("six_rows.csv")).unwrap();
    assert_eq!(loaded.dataset.len(), 4);
    assert_eq!(loaded.report.total_rows, 6);
    assert_eq!(loaded.report.duplicates_removed, 1);
    assert_eq!(loaded.report.parse_failures.count, 1);

    let error = &loaded.report.parse_failures.samples[0];
    assert_eq!(error.row, 5);
    assert_eq!(error.column, "rate_per_1000");
    assert_eq!(error.value, "abc");
}

#[test]
fn loaded_records_are_padded_and_enriched() {
    let loaded = load_dataset(fixture("six_rows.csv")).unwrap();
    let ds = &loaded.dataset;
    assert_eq!(
        ds.region_names(),
        [
            "Auvergne-Rhône-Alpes".to_string(),
            "Bretagne".to_string(),
            "Corse".to_string(),
            "Île-de-France".to_string(),
        ]
    );
    let by_department = group_aggregate(
        ds,
        &[Column::DepartmentCode, Column::Department],
        Metric::Amount,
        AggFn::Sum,
    )
    .unwrap();
    assert_eq!(
        by_department.get(&[KeyValue::from("01"), KeyValue::from("Ain")]),
        Some(120.0)
    );
    assert_eq!(
        by_department.get(&[KeyValue::from("2A"), KeyValue::from("Corse-du-Sud")]),
        Some(3.0)
    );
    assert_eq!(loaded.report.unknown_departments, 0);
}

#[test]
fn reloading_normalized_output_changes_nothing() {
    let loaded = load_dataset(fixture("six_rows.csv")).unwrap();
    let again = Normalizer::default().normalize(loaded.dataset.to_raw_table());
    assert_eq!(again.report.duplicates_removed, 0);
    assert_eq!(again.report.parse_failures.count, 0);
    assert_eq!(
        delinquency_explorer::Dataset::new(again.records),
        loaded.dataset
    );
}

#[test]
fn victim_only_offence_is_absent_from_other_roles() {
    let loaded = load_dataset(fixture("six_rows.csv")).unwrap();
    let tab = cross_tab(&loaded.dataset, Column::EntityRole, Column::CrimeType, Metric::Amount)
        .unwrap();
    let homicides = KeyValue::from("Homicides");
    assert_eq!(tab[&KeyValue::from("victim")][&homicides], 3.0);
    assert!(!tab[&KeyValue::from("infraction")].contains_key(&homicides));
}

#[test]
fn region_path_and_delimiter_are_configurable() {
    let by_department =
        load_dataset_with(fixture("comma_delimited.csv"), &comma_options(RegionPath::Department))
            .unwrap();
    assert_eq!(by_department.dataset.len(), 3);
    assert_eq!(by_department.report.region_mismatches, 1);
    assert_eq!(
        by_department.dataset.region_names(),
        ["Bretagne".to_string(), "Guadeloupe".to_string()]
    );
    assert_eq!(reports::overview_metrics(&by_department.dataset).regions, 2);
    assert_eq!(
        by_department.dataset.entity_roles(),
        [EntityRole::Victim, EntityRole::Vehicle, EntityRole::Perpetrator]
    );

    let by_code =
        load_dataset_with(fixture("comma_delimited.csv"), &comma_options(RegionPath::RegionCode))
            .unwrap();
    assert_eq!(
        by_code.dataset.region_names(),
        [
            "Bretagne".to_string(),
            "Guadeloupe".to_string(),
            "Normandie".to_string(),
        ]
    );
    assert_eq!(reports::overview_metrics(&by_code.dataset).regions, 3);
}

#[test]
fn wrong_delimiter_loses_every_row_but_does_not_fail() {
    let loaded = load_dataset(fixture("comma_delimited.csv")).unwrap();
    assert!(loaded.dataset.is_empty());
    assert_eq!(loaded.report.parse_failures.count, 3);
}

#[test]
fn store_serves_reports() {
    let store = DatasetStore::new(fixture("six_rows.csv"), LoadOptions::default());
    let loaded = store.get().unwrap();
    let ds = &loaded.dataset;

    let overview = reports::overview_metrics(ds);
    assert_eq!(overview.total_records, 4);
    assert_eq!(overview.years_covered, 2);

    let drill = reports::region_drill_down(ds, "Île-de-France", 5).unwrap();
    assert_eq!(drill.departments.len(), 1);
    assert_eq!(drill.departments[0].department_name, "Paris");
    let share = drill.national_share_pct.unwrap();
    assert!((share - 4500.0 / 5523.0 * 100.0).abs() < 1e-9);

    let victims = filter(ds, &Filter::default().entity_role(EntityRole::Victim)).unwrap();
    let top = top_k(
        &group_aggregate(&victims, &[Column::Region], Metric::Amount, AggFn::Sum).unwrap(),
        10,
    );
    assert_eq!(top.len(), 3);
    assert_eq!(top.rows[0].key, vec![KeyValue::from("Île-de-France")]);
}

#[test]
fn missing_file_is_reported_and_not_cached() {
    let store = DatasetStore::new(fixture("nope.csv"), LoadOptions::default());
    assert!(matches!(store.get(), Err(LoadError::NotFound { .. })));
    assert!(store.cached().is_none());
}
