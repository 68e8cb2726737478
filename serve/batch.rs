//! # Batch Inference
//!
//! Scores a CSV file of records against a loaded model and writes one
//! prediction per row. The header row names the fields; any accepted alias may
//! be used. A cell that parses as a finite number is handed to the normalizer
//! as a number and anything else as text, so a row decodes exactly like the
//! equivalent JSON request. An empty cell counts as a missing value.

use crate::features::{FieldValue, InputRecord};
use crate::predict::{PredictError, PredictionResult, PredictionService};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read or write CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Prediction failed for row {row}: {source}")]
    Row { row: usize, source: PredictError },
}

/// Reads every data row of a comma-separated file into an `InputRecord`.
pub fn read_records(path: &Path) -> Result<Vec<InputRecord>, BatchError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: InputRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(name, cell)| (name, cell_value(cell)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn cell_value(cell: &str) -> FieldValue {
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => FieldValue::Number(n),
        _ => FieldValue::from(cell),
    }
}

/// Scores all records in parallel. Rows are numbered from 1; when several rows
/// fail, the lowest-numbered failure is reported.
pub fn score_records(
    service: &PredictionService,
    records: &[InputRecord],
) -> Result<Vec<PredictionResult>, BatchError> {
    let outcomes: Vec<Result<PredictionResult, PredictError>> =
        records.par_iter().map(|record| service.predict(record)).collect();

    outcomes
        .into_iter()
        .enumerate()
        .map(|(i, outcome)| outcome.map_err(|source| BatchError::Row { row: i + 1, source }))
        .collect()
}

/// Writes `row`, `prediction` and `probability` columns as tab-separated values.
pub fn write_predictions(path: &Path, results: &[PredictionResult]) -> Result<(), BatchError> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record(["row", "prediction", "probability"])?;
    for (i, result) in results.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            result.prediction.to_string(),
            format!("{:.6}", result.probability),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads, scores and writes in one pass. Returns the number of rows scored.
pub fn run_batch(
    service: &PredictionService,
    input: &Path,
    output: &Path,
) -> Result<usize, BatchError> {
    let records = read_records(input)?;
    let results = score_records(service, &records)?;
    write_predictions(output, &results)?;
    Ok(results.len())
}
