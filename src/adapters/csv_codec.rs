//! CSV decoding into [`RawBatch`] and encoding of cleaned rows.
//!
//! An empty cell and a column missing from the header both decode to an
//! absent field. A numeric column holding text that is not a number is a
//! malformed record, as is a row whose cell count differs from the header.
//! Header names are trimmed.

use crate::domain::model::{
    CleanedRecord, RawBatch, RawRecord, CORE_COLUMNS, LAST_REVIEW, LATITUDE, LONGITUDE, PRICE,
    REVIEWS_PER_MONTH,
};
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Fails with `BatchTooLarge` as soon as more than `max_rows` data rows
/// have been read.
pub fn decode_batch(data: &[u8], max_rows: usize) -> Result<RawBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (index, name) in columns.iter().enumerate() {
        if positions.insert(name.as_str(), index).is_some() {
            return Err(EtlError::MalformedRecord {
                row: 0,
                field: name.clone(),
                reason: "column appears more than once in the header".to_string(),
            });
        }
    }

    let core_index = |name: &str| positions.get(name).copied();
    let price_at = core_index(PRICE);
    let last_review_at = core_index(LAST_REVIEW);
    let reviews_at = core_index(REVIEWS_PER_MONTH);
    let latitude_at = core_index(LATITUDE);
    let longitude_at = core_index(LONGITUDE);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let row_number = index + 1;
        if row_number > max_rows {
            return Err(EtlError::BatchTooLarge {
                rows: row_number,
                limit: max_rows,
            });
        }

        if row.len() != columns.len() {
            return Err(EtlError::MalformedRecord {
                row: row_number,
                field: "*".to_string(),
                reason: format!("expected {} cells, found {}", columns.len(), row.len()),
            });
        }

        let cell = |at: Option<usize>| at.and_then(|i| row.get(i)).map(str::trim);
        let number = |name: &str, at: Option<usize>| parse_number(row_number, name, cell(at));

        let passthrough = columns
            .iter()
            .zip(row.iter())
            .filter(|(name, _)| !CORE_COLUMNS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();

        records.push(RawRecord {
            price: number(PRICE, price_at)?,
            last_review: cell(last_review_at)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            reviews_per_month: number(REVIEWS_PER_MONTH, reviews_at)?,
            latitude: number(LATITUDE, latitude_at)?,
            longitude: number(LONGITUDE, longitude_at)?,
            passthrough,
        });
    }

    tracing::debug!(
        columns = columns.len(),
        rows = records.len(),
        "Decoded CSV batch"
    );

    Ok(RawBatch { columns, records })
}

fn parse_number(row: usize, field: &str, cell: Option<&str>) -> Result<Option<f64>> {
    match cell {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| EtlError::MalformedRecord {
                row,
                field: field.to_string(),
                reason: format!("'{}' is not a number", text),
            }),
    }
}

/// Input columns followed by any normalized column the input lacked.
/// This is the header `encode_batch` expects.
pub fn output_columns(columns: &[String]) -> Vec<String> {
    let mut out = columns.to_vec();
    for core in CORE_COLUMNS {
        if !out.iter().any(|c| c == core) {
            out.push(core.to_string());
        }
    }
    out
}

pub fn encode_batch(
    header: &[String],
    records: &[CleanedRecord],
    date_format: &str,
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;

    for record in records {
        let mut row: Vec<String> = Vec::with_capacity(header.len());
        for column in header {
            let value = match column.as_str() {
                PRICE => record.price.to_string(),
                LAST_REVIEW => render_date(record, date_format)?,
                REVIEWS_PER_MONTH => record.reviews_per_month.to_string(),
                LATITUDE => record.latitude.to_string(),
                LONGITUDE => record.longitude.to_string(),
                other => record.passthrough_value(other).unwrap_or_default().to_string(),
            };
            row.push(value);
        }
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

fn render_date(record: &CleanedRecord, date_format: &str) -> Result<String> {
    let mut rendered = String::new();
    write!(rendered, "{}", record.last_review.format(date_format)).map_err(|_| {
        EtlError::InvalidConfigValueError {
            field: "date_format".to_string(),
            value: date_format.to_string(),
            reason: format!("cannot render the date {}", record.last_review),
        }
    })?;
    Ok(rendered)
}
