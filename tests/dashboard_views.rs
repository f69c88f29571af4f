use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use enem_dashboard::data::loader::{
    COL_ATTENDANCE, COL_COMPLETION, COL_INCOME, COL_INTERNET, COL_MEAN_SCORE, COL_RACE, COL_SEX,
    COL_STATE, COL_YEAR,
};
use enem_dashboard::data::model::{IncomeBracket, RaceColor, Sex, INCOME_BRACKET_LABELS};
use enem_dashboard::{
    apply_filter, load_table, DashboardConfig, DashboardError, DashboardViews, FilterSelection,
};

struct Row {
    state: &'static str,
    sex: &'static str,
    race: &'static str,
    internet: &'static str,
    attendance: &'static str,
    income: usize,
    score: Option<f64>,
}

fn row(state: &'static str, sex: &'static str, internet: &'static str) -> Row {
    Row {
        state,
        sex,
        race: "Parda",
        internet,
        attendance: "Presente",
        income: 3,
        score: Some(500.0),
    }
}

fn write_year(dir: &Path, year: i64, rows: &[Row]) {
    let text = |f: fn(&Row) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let schema = Arc::new(Schema::new(vec![
        Field::new(COL_YEAR, DataType::Int64, false),
        Field::new(COL_STATE, DataType::Utf8, false),
        Field::new(COL_SEX, DataType::Utf8, false),
        Field::new(COL_RACE, DataType::Utf8, false),
        Field::new(COL_COMPLETION, DataType::Utf8, false),
        Field::new(COL_INCOME, DataType::Utf8, false),
        Field::new(COL_INTERNET, DataType::Utf8, false),
        Field::new(COL_ATTENDANCE, DataType::Utf8, false),
        Field::new(COL_MEAN_SCORE, DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![year; rows.len()])),
            text(|r| r.state),
            text(|r| r.sex),
            text(|r| r.race),
            text(|_| "Concluiu"),
            text(|r| INCOME_BRACKET_LABELS[r.income]),
            text(|r| r.internet),
            text(|r| r.attendance),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.score).collect::<Vec<_>>(),
            )),
        ],
    )
    .unwrap();

    let file = std::fs::File::create(dir.join(format!("enem_{year}.parquet"))).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn fixture() -> (tempfile::TempDir, DashboardConfig) {
    let dir = tempfile::tempdir().unwrap();

    let mut rows_2018 = Vec::new();
    for i in 0..40 {
        rows_2018.push(row("SP", if i % 2 == 0 { "F" } else { "M" }, if i < 30 { "Sim" } else { "Não" }));
    }
    for i in 0..60 {
        rows_2018.push(row("BA", "F", if i < 30 { "Sim" } else { "Não" }));
    }
    rows_2018[0].attendance = "Ausente";
    rows_2018[0].score = None;
    rows_2018[1].race = "Branca";
    rows_2018[2].income = 16;
    rows_2018[2].score = Some(700.0);
    write_year(dir.path(), 2018, &rows_2018);

    let rows_2019 = vec![
        row("RJ", "M", "Sim"),
        row("RJ", "F", "Não"),
        row("SP", "F", "Sim"),
    ];
    write_year(dir.path(), 2019, &rows_2019);

    let config = DashboardConfig {
        data_dir: dir.path().to_path_buf(),
        years: vec![2018, 2019],
        ..DashboardConfig::default()
    };
    (dir, config)
}

#[test]
fn loads_all_batches_into_one_table() {
    let (_dir, config) = fixture();
    let table = load_table(&config).unwrap();
    assert_eq!(table.len(), 103);
    assert_eq!(table.years, vec![2018, 2019]);
    assert_eq!(table.batches.len(), 2);
    assert_eq!(table.batches[1].rows, 3);
    assert_eq!(table.sexes, BTreeSet::from([Sex::Female, Sex::Male]));
    assert!(table.races.contains(&RaceColor::White));
}

#[test]
fn missing_year_aborts_the_load() {
    let (_dir, mut config) = fixture();
    config.years.push(2020);
    assert!(matches!(
        load_table(&config),
        Err(DashboardError::SourceUnavailable { year: 2020, .. })
    ));
}

#[test]
fn initial_selection_reproduces_worked_example() {
    let (_dir, config) = fixture();
    let table = load_table(&config).unwrap();
    let selection = FilterSelection::initial(&table);
    let views = DashboardViews::compute(&table, &selection);

    assert_eq!(views.filtered_rows, 100);
    let sp = views
        .state_summary
        .iter()
        .find(|r| r.state_code == "SP")
        .unwrap();
    assert_eq!((sp.total, sp.with_internet), (40, 30));
    assert_eq!(sp.percentage_label(), "75.0%");
    assert_eq!(views.state_summary[0].state_code, "SP");

    assert_eq!(views.presence.positive, 99);
    assert_eq!(views.presence.negative, 1);
    assert_eq!(views.presence.percentage_label(), "99.0%");
    assert_eq!(views.completion.percentage(), 100.0);
}

#[test]
fn state_totals_add_up_for_every_selection() {
    let (_dir, config) = fixture();
    let table = load_table(&config).unwrap();

    let selections = [
        FilterSelection::initial(&table),
        FilterSelection {
            years: BTreeSet::from([2018, 2019]),
            sexes: table.sexes.clone(),
            races: table.races.clone(),
        },
        FilterSelection {
            years: BTreeSet::from([2019]),
            sexes: BTreeSet::from([Sex::Female]),
            races: BTreeSet::from([RaceColor::Brown]),
        },
        FilterSelection {
            years: BTreeSet::from([2018]),
            sexes: BTreeSet::from([Sex::Male]),
            races: BTreeSet::from([RaceColor::White]),
        },
    ];

    for selection in &selections {
        let filtered = apply_filter(&table, selection);
        let views = DashboardViews::from_filtered(&filtered);

        let summed: u64 = views.state_summary.iter().map(|r| r.total).sum();
        assert_eq!(summed as usize, filtered.len());
        let participation: u64 = views.participation.iter().map(|c| c.count).sum();
        assert_eq!(participation as usize, filtered.len());

        for row in &views.state_summary {
            assert!((0.0..=100.0).contains(&row.percentage));
            assert_eq!(row.percentage == 0.0, row.with_internet == 0);
        }

        let years: BTreeSet<i32> = views.internet_by_year.iter().map(|s| s.year).collect();
        for year in years {
            let sum: f64 = views
                .internet_by_year
                .iter()
                .filter(|s| s.year == year)
                .map(|s| s.percentage)
                .sum();
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }
}

#[test]
fn views_are_idempotent() {
    let (_dir, config) = fixture();
    let table = load_table(&config).unwrap();
    let selection = FilterSelection {
        years: BTreeSet::from([2018, 2019]),
        sexes: table.sexes.clone(),
        races: table.races.clone(),
    };
    let first = DashboardViews::compute(&table, &selection);
    let second = DashboardViews::compute(&table, &selection);
    assert_eq!(first, second);
    assert_eq!(table.len(), 103);
}

#[test]
fn heatmap_columns_follow_income_order_across_years() {
    let (_dir, config) = fixture();
    let table = load_table(&config).unwrap();
    let selection = FilterSelection {
        years: BTreeSet::from([2018, 2019]),
        sexes: table.sexes.clone(),
        races: table.races.clone(),
    };
    let views = DashboardViews::compute(&table, &selection);
    let matrix = &views.income_scores;

    assert_eq!(matrix.years, vec![2018, 2019]);
    assert_eq!(
        matrix.brackets,
        vec![IncomeBracket::Known(3), IncomeBracket::Known(16)]
    );
    // 2018: 99 present, one of them in the top bracket.
    assert_eq!(matrix.counts[0], vec![98, 1]);
    assert_eq!(matrix.means[0][1], Some(700.0));
    assert_eq!(matrix.counts[1], vec![3, 0]);
    assert_eq!(matrix.means[1][1], None);

    let by_year: Vec<i32> = views.mean_by_year.iter().map(|m| m.year).collect();
    assert_eq!(by_year, vec![2018, 2019]);
}

#[test]
fn empty_selection_degrades_gracefully() {
    let (_dir, config) = fixture();
    let table = load_table(&config).unwrap();
    let selection = FilterSelection {
        years: BTreeSet::new(),
        sexes: table.sexes.clone(),
        races: table.races.clone(),
    };
    let views = DashboardViews::compute(&table, &selection);
    assert_eq!(views.filtered_rows, 0);
    assert_eq!(views.presence.percentage(), 0.0);
    assert_eq!(views.completion.percentage(), 0.0);
    assert!(views.state_summary.is_empty());
    assert!(views.income_scores.is_empty());
}
