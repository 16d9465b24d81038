//! End-to-end runs over small on-disk sector datasets.

use std::fs;
use std::path::Path;

use emission_flex::config::{Config, DataConfig};
use emission_flex::domain::{FlexibilityTier, Scenario, Sector};
use emission_flex::runner::{RunOptions, Runner};

const INTERVALS: usize = 24;

const RESIDENTIAL_ASSUMPTIONS: &str = r#"{
    "HVAC": {"Cooling": [0.2, 0.3, 0.4, 0.5]},
    "Hot Water": {"Water Heater": [0.1, 0.2, 0.3, 0.3]},
    "Lighting": {"Lights": [0.5, 0.5, 0.5, 0.5]}
}"#;

fn write_dataset(path: &Path, end_uses: &[&str], days: usize) {
    let mut raw = format!(",date,MOER,{}\n", end_uses.join(","));
    let mut row = 0;
    for day in 0..days {
        for i in 0..INTERVALS {
            let moer = if i == 18 { 1400.0 } else { 400.0 + (i % 6) as f64 * 25.0 };
            let loads: Vec<String> = end_uses
                .iter()
                .enumerate()
                .map(|(k, _)| format!("{:.2}", 0.5 + k as f64 * 0.25))
                .collect();
            raw.push_str(&format!("{row},2021-07-{:02},{moer},{}\n", day + 1, loads.join(",")));
            row += 1;
        }
    }
    fs::write(path, raw).unwrap();
}

fn config(root: &Path) -> Config {
    Config {
        data: DataConfig {
            data_dir: root.join("data"),
            out_dir: root.join("out"),
            ..DataConfig::default()
        },
        ..Config::default()
    }
}

fn residential_fixture(root: &Path) {
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("residential_assumptions.json"), RESIDENTIAL_ASSUMPTIONS).unwrap();
    write_dataset(&data.join("residential_data.csv"), &["Cooling", "Water Heater", "Lights"], 2);
}

fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().iter().map(String::from).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_residential_run_writes_every_table() {
    let dir = tempfile::tempdir().unwrap();
    residential_fixture(dir.path());
    let cfg = config(dir.path());

    let options = RunOptions {
        sectors: vec![Sector::Residential],
        ..RunOptions::default()
    };
    let summary = Runner::new(&cfg).run(&options).await;

    assert!(summary.aborted.is_empty(), "{:?}", summary.aborted);
    assert_eq!(summary.failed_cells(), 0);
    let report = &summary.sectors[0];
    assert_eq!(report.written.len(), 4 + 3);

    let out = dir.path().join("out").join("residential");
    let (headers, rows) = read_table(&out.join("shift_daily_savings_small.csv"));
    assert_eq!(headers, vec!["day", "Cooling", "Water Heater", "Lights"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "2021-07-01");

    let (headers, _) = read_table(&out.join("shift_daily_savings_high.csv"));
    assert_eq!(headers, vec!["day", "Cooling", "Water Heater"]);

    let (headers, rows) = read_table(&out.join("shed_daily_savings_med.csv"));
    assert_eq!(headers, vec!["day", "Cooling", "Water Heater", "Lights"]);
    for row in &rows {
        for cell in &row[1..] {
            assert!(cell.parse::<f64>().unwrap() > 0.0, "{row:?}");
        }
    }
    assert!(!out.join("shed_daily_savings_small.csv").exists());
    assert!(!out.join("failures.csv").exists());
}

#[tokio::test]
async fn test_higher_tiers_save_at_least_as_much_when_shedding() {
    let dir = tempfile::tempdir().unwrap();
    residential_fixture(dir.path());
    let cfg = config(dir.path());

    let options = RunOptions {
        sectors: vec![Sector::Residential],
        scenarios: vec![Scenario::Shed],
        dry_run: true,
    };
    let summary = Runner::new(&cfg).run(&options).await;
    let shed = summary.sectors[0].report(Scenario::Shed).unwrap();

    let total = |tier| shed.table(tier).unwrap().total();
    assert!(total(FlexibilityTier::Low) > 0.0);
    assert!(total(FlexibilityTier::Medium) >= total(FlexibilityTier::Low));
    assert!(total(FlexibilityTier::High) >= total(FlexibilityTier::Medium));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    residential_fixture(dir.path());
    let cfg = config(dir.path());

    let options = RunOptions {
        sectors: vec![Sector::Residential],
        dry_run: true,
        ..RunOptions::default()
    };
    let summary = Runner::new(&cfg).run(&options).await;

    assert!(summary.aborted.is_empty());
    assert!(summary.sectors[0].written.is_empty());
    assert_eq!(summary.sectors[0].reports.len(), 2);
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_unmapped_end_use_aborts_only_its_sector() {
    let dir = tempfile::tempdir().unwrap();
    residential_fixture(dir.path());
    let data = dir.path().join("data");
    fs::write(
        data.join("commercial_assumptions.json"),
        r#"{"HVAC": {"Chiller": [0.1, 0.2, 0.3, 0.4]}}"#,
    )
    .unwrap();
    write_dataset(&data.join("commercial_data.csv"), &["Chiller", "Elevators"], 1);
    let cfg = config(dir.path());

    let summary = Runner::new(&cfg).run(&RunOptions::default()).await;

    assert_eq!(summary.sectors.len(), 1);
    assert_eq!(summary.sectors[0].sector, Sector::Residential);
    assert_eq!(summary.aborted.len(), 1);
    let (sector, reason) = &summary.aborted[0];
    assert_eq!(*sector, Sector::Commercial);
    assert!(reason.contains("Elevators"), "{reason}");
    assert!(!dir.path().join("out").join("commercial").exists());
}

#[tokio::test]
async fn test_missing_input_files_abort_the_sector() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());

    let options = RunOptions {
        sectors: vec![Sector::Commercial],
        ..RunOptions::default()
    };
    let summary = Runner::new(&cfg).run(&options).await;

    assert!(summary.sectors.is_empty());
    assert_eq!(summary.aborted[0].0, Sector::Commercial);
}
