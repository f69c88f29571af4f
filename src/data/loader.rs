use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{
    AttendanceStatus, BatchSummary, CompletionStatus, ExamRecord, ExamTable, IncomeBracket,
    InternetAccess, RaceColor, Sex,
};
use crate::config::DashboardConfig;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const COL_YEAR: &str = "NU_ANO";
pub const COL_STATE: &str = "SG_UF_PROVA";
pub const COL_SEX: &str = "TP_SEXO";
pub const COL_RACE: &str = "TP_COR_RACA";
pub const COL_COMPLETION: &str = "TP_ST_CONCLUSAO";
pub const COL_INCOME: &str = "Q006";
pub const COL_INTERNET: &str = "Q025";
pub const COL_ATTENDANCE: &str = "STATUS_PRESENCA";
pub const COL_MEAN_SCORE: &str = "MEDIA_NOTAS";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every configured yearly batch and concatenate them into one table.
///
/// Rows are kept in batch order then file order; nothing is deduplicated,
/// sorted or validated. Any batch that cannot be read aborts the whole
/// load with [`DashboardError::SourceUnavailable`].
pub fn load_table(config: &DashboardConfig) -> Result<ExamTable, DashboardError> {
    let mut records = Vec::new();
    let mut batches = Vec::with_capacity(config.years.len());

    for &year in &config.years {
        let path = config.batch_path(year);
        let rows = load_batch(&path, year).map_err(|err| DashboardError::SourceUnavailable {
            year,
            path: path.clone(),
            reason: format!("{err:#}"),
        })?;
        log::info!("Loaded {} rows for {year} from {}", rows.len(), path.display());
        batches.push(BatchSummary {
            year,
            path,
            rows: rows.len(),
        });
        records.extend(rows);
    }

    Ok(ExamTable::from_records(records, batches))
}

/// Read one yearly Parquet batch.
///
/// Missing columns are filled with nulls, except the year column which
/// falls back to `year`.
pub fn load_batch(path: &Path, year: i32) -> Result<Vec<ExamRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut warned_missing = false;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        if !warned_missing {
            let missing = missing_columns(&batch);
            if !missing.is_empty() {
                log::warn!(
                    "{}: columns {missing:?} not found, filling with defaults",
                    path.display()
                );
            }
            warned_missing = true;
        }

        records.extend(records_from_batch(&batch, year)?);
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Arrow helpers
// ---------------------------------------------------------------------------

fn missing_columns(batch: &RecordBatch) -> Vec<&'static str> {
    let schema = batch.schema();
    [
        COL_YEAR,
        COL_STATE,
        COL_SEX,
        COL_RACE,
        COL_COMPLETION,
        COL_INCOME,
        COL_INTERNET,
        COL_ATTENDANCE,
        COL_MEAN_SCORE,
    ]
    .into_iter()
    .filter(|name| schema.index_of(name).is_err())
    .collect()
}

/// Convert one record batch into exam records.
fn records_from_batch(batch: &RecordBatch, default_year: i32) -> Result<Vec<ExamRecord>> {
    let year = int_column(batch, COL_YEAR)?;
    let state = string_column(batch, COL_STATE)?;
    let sex = string_column(batch, COL_SEX)?;
    let race = string_column(batch, COL_RACE)?;
    let completion = string_column(batch, COL_COMPLETION)?;
    let income = string_column(batch, COL_INCOME)?;
    let internet = string_column(batch, COL_INTERNET)?;
    let attendance = string_column(batch, COL_ATTENDANCE)?;
    let mean_score = float_column(batch, COL_MEAN_SCORE)?;

    let records = (0..batch.num_rows())
        .map(|row| ExamRecord {
            year: match &year {
                Some(arr) => arr
                    .is_valid(row)
                    .then(|| arr.value(row))
                    .and_then(|y| i32::try_from(y).ok()),
                None => Some(default_year),
            },
            state_code: text_cell(&state, row).map(str::to_string),
            sex: text_cell(&sex, row).map(Sex::from_label),
            race_color: text_cell(&race, row).map(RaceColor::from_label),
            completion: text_cell(&completion, row).map(CompletionStatus::from_label),
            income: text_cell(&income, row).map(IncomeBracket::from_label),
            internet: text_cell(&internet, row).map(InternetAccess::from_label),
            attendance: text_cell(&attendance, row).map(AttendanceStatus::from_label),
            mean_score: mean_score
                .as_ref()
                .filter(|arr| arr.is_valid(row))
                .map(|arr| arr.value(row))
                .filter(|v| !v.is_nan()),
        })
        .collect();

    Ok(records)
}

/// Fetch `name` cast to `to`, or `None` when the column is absent.
fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<Option<ArrayRef>> {
    let Ok(idx) = batch.schema().index_of(name) else {
        return Ok(None);
    };
    let casted = cast(batch.column(idx), to)
        .with_context(|| format!("column '{name}' cannot be read as {to:?}"))?;
    Ok(Some(casted))
}

/// Categorical columns may be plain, large or dictionary-encoded strings;
/// all of them cast to `Utf8`.
fn string_column(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>> {
    Ok(cast_column(batch, name, &DataType::Utf8)?.map(|arr| arr.as_string::<i32>().clone()))
}

fn int_column(batch: &RecordBatch, name: &str) -> Result<Option<Int64Array>> {
    Ok(cast_column(batch, name, &DataType::Int64)?
        .map(|arr| arr.as_primitive::<Int64Type>().clone()))
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Option<Float64Array>> {
    Ok(cast_column(batch, name, &DataType::Float64)?
        .map(|arr| arr.as_primitive::<Float64Type>().clone()))
}

fn text_cell(col: &Option<StringArray>, row: usize) -> Option<&str> {
    col.as_ref()
        .filter(|arr| arr.is_valid(row))
        .map(|arr| arr.value(row))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{DictionaryArray, Int32Array};
    use arrow::datatypes::{Field, Int32Type, Schema};
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_batch(path: &Path, batch: RecordBatch) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn reads_dictionary_encoded_categories_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enem_2019.parquet");

        let states: DictionaryArray<Int32Type> =
            vec![Some("SP"), Some("RJ"), None].into_iter().collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new(COL_YEAR, DataType::Int32, true),
            Field::new(COL_STATE, states.data_type().clone(), true),
            Field::new(COL_INTERNET, DataType::Utf8, true),
            Field::new(COL_MEAN_SCORE, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![2019, 2019, 2019])),
                Arc::new(states),
                Arc::new(StringArray::from(vec![Some("Sim"), Some("Não"), None])),
                Arc::new(Float64Array::from(vec![Some(612.5), Some(f64::NAN), None])),
            ],
        )
        .unwrap();
        write_batch(&path, batch);

        let records = load_batch(&path, 2019).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].state_code.as_deref(), Some("SP"));
        assert_eq!(records[2].state_code, None);
        assert_eq!(records[0].internet, Some(InternetAccess::Yes));
        assert_eq!(records[1].internet, Some(InternetAccess::No));
        assert_eq!(records[0].mean_score, Some(612.5));
        assert_eq!(records[1].mean_score, None);
        assert_eq!(records[2].mean_score, None);
        // Columns absent from the file default to null.
        assert!(records.iter().all(|r| r.sex.is_none() && r.income.is_none()));
    }

    #[test]
    fn missing_year_column_uses_batch_year() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enem_2021.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new(COL_SEX, DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["F", "M"]))],
        )
        .unwrap();
        write_batch(&path, batch);

        let records = load_batch(&path, 2021).unwrap();
        assert!(records.iter().all(|r| r.year == Some(2021)));
        assert_eq!(records[1].sex, Some(Sex::Male));
    }

    #[test]
    fn out_of_range_year_becomes_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enem_2022.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new(COL_YEAR, DataType::Int64, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from(vec![2022, i64::from(i32::MAX) + 2019]))],
        )
        .unwrap();
        write_batch(&path, batch);

        let records = load_batch(&path, 2022).unwrap();
        assert_eq!(records[0].year, Some(2022));
        assert_eq!(records[1].year, None);
    }

    #[test]
    fn missing_batch_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            years: vec![2018],
            ..DashboardConfig::default()
        };
        let err = load_table(&config).unwrap_err();
        match err {
            DashboardError::SourceUnavailable { year, path, .. } => {
                assert_eq!(year, 2018);
                assert!(path.ends_with("enem_2018.parquet"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupt_batch_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("enem_2020.parquet"), b"not parquet").unwrap();
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            years: vec![2020],
            ..DashboardConfig::default()
        };
        assert!(matches!(
            load_table(&config),
            Err(DashboardError::SourceUnavailable { year: 2020, .. })
        ));
    }
}
