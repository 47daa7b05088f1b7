use crate::{ColumnMapping, DataFormat, Dataset, LoadError, LoadOptions, Record};
use polars::prelude::*;
use polars::prelude::PlPathRef;
use std::path::Path;

/// Loads a dataset, inferring the format from the extension when `format` is `None`.
pub fn load_dataset(
    path: impl AsRef<Path>,
    format: Option<DataFormat>,
    options: &LoadOptions,
) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let format = format
        .or_else(|| DataFormat::detect(path))
        .ok_or_else(|| LoadError::UnknownFormat(path.display().to_string()))?;
    let records = match format {
        DataFormat::Csv => load_csv(path, options)?,
        DataFormat::Parquet => load_parquet(path, options)?,
        DataFormat::Json => load_json(path)?,
    };
    Ok(Dataset::new(records))
}

pub fn load_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Vec<Record>, LoadError> {
    let pl_path = PlPathRef::from_local_path(path.as_ref()).into_owned();
    let lf = LazyCsvReader::new(pl_path).with_has_header(true);
    let df = lf.finish()?.collect()?;
    parse_frame(df, &options.columns)
}

pub fn load_parquet(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<Vec<Record>, LoadError> {
    let pl_path = PlPathRef::from_local_path(path.as_ref()).into_owned();
    let lf = LazyFrame::scan_parquet(pl_path, ScanArgsParquet::default())?;
    let df = lf.collect()?;
    parse_frame(df, &options.columns)
}

/// Reads a JSON array of `{category, amount}` objects. The backend's
/// `StageName` / `totalAmount` field names are accepted as well.
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<Record>, LoadError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    parse_json(&raw)
}

pub fn parse_json(raw: &str) -> Result<Vec<Record>, LoadError> {
    Ok(serde_json::from_str(raw)?)
}

fn parse_frame(df: DataFrame, columns: &ColumnMapping) -> Result<Vec<Record>, LoadError> {
    let category = df
        .column(&columns.category)
        .map_err(|_| LoadError::MissingColumn(columns.category.clone()))?;
    let amount = df
        .column(&columns.amount)
        .map_err(|_| LoadError::MissingColumn(columns.amount.clone()))?;

    let len = category.len();
    if amount.len() != len {
        return Err(LoadError::LengthMismatch);
    }

    let mut records = Vec::with_capacity(len);
    for idx in 0..len {
        let category = to_category(category.get(idx)?, &columns.category, idx)?;
        let amount = to_f64(amount.get(idx)?, &columns.amount, idx)?;
        records.push(Record { category, amount });
    }

    Ok(records)
}

fn to_category(value: AnyValue, column: &str, row: usize) -> Result<String, LoadError> {
    match value {
        AnyValue::String(s) => Ok(s.to_string()),
        AnyValue::StringOwned(s) => Ok(s.to_string()),
        AnyValue::Int64(v) => Ok(v.to_string()),
        AnyValue::Int32(v) => Ok(v.to_string()),
        other => Err(LoadError::InvalidCategory {
            column: column.to_string(),
            row,
            value: format!("{other:?}"),
        }),
    }
}

fn to_f64(value: AnyValue, column: &str, row: usize) -> Result<f64, LoadError> {
    match value {
        AnyValue::Float64(v) => Ok(v),
        AnyValue::Float32(v) => Ok(v as f64),
        AnyValue::Int64(v) => Ok(v as f64),
        AnyValue::Int32(v) => Ok(v as f64),
        AnyValue::UInt64(v) => Ok(v as f64),
        AnyValue::UInt32(v) => Ok(v as f64),
        AnyValue::String(s) => s.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
            column: column.to_string(),
            row,
            value: s.to_string(),
        }),
        AnyValue::StringOwned(s) => to_f64(AnyValue::String(&s), column, row),
        other => Err(LoadError::InvalidNumber {
            column: column.to_string(),
            row,
            value: format!("{other:?}"),
        }),
    }
}
