//! Listing normalization engine.
//!
//! Turns one batch of raw listing rows into cleaned rows. The rules run in a
//! fixed order and the date anchor is an aggregate over price-filter
//! survivors, so the engine makes two passes: reduce to the anchor, then map.
//!
//! 1. drop rows whose `price` is absent or not strictly positive
//! 2. parse `last_review` with a single format; unparseable means missing
//! 3. fill missing dates with the earliest valid date among step-1 survivors
//! 4. default absent `reviews_per_month` to 0
//! 5. drop rows missing `latitude` or `longitude`

use crate::domain::model::{
    BatchResult, CleanedRecord, DropCounts, RawRecord, LATITUDE, LONGITUDE, PRICE,
    REVIEWS_PER_MONTH,
};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub date_format: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Normalizes `records` with the default date format.
pub fn normalize(records: &[RawRecord]) -> Result<BatchResult> {
    Normalizer::default().normalize(records)
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

/// A price-filter survivor with its date already coerced.
struct Survivor<'a> {
    record: &'a RawRecord,
    price: f64,
    last_review: Option<NaiveDate>,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn date_format(&self) -> &str {
        &self.options.date_format
    }

    pub fn normalize(&self, records: &[RawRecord]) -> Result<BatchResult> {
        let mut dropped = DropCounts::default();

        let mut survivors = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            check_finite(index, record)?;
            match record.price {
                Some(price) if price > 0.0 => survivors.push(Survivor {
                    record,
                    price,
                    last_review: self.parse_date(record.last_review.as_deref()),
                }),
                _ => dropped.non_positive_price += 1,
            }
        }

        let anchor_date = survivors
            .iter()
            .filter_map(|s| s.last_review)
            .min()
            .ok_or(EtlError::NoValidDateAnchor {
                survivors: survivors.len(),
            })?;

        let mut imputed_dates = 0;
        let mut defaulted_reviews = 0;
        let mut cleaned = Vec::with_capacity(survivors.len());

        for survivor in survivors {
            let last_review = survivor.last_review.unwrap_or_else(|| {
                imputed_dates += 1;
                anchor_date
            });
            let reviews_per_month = survivor.record.reviews_per_month.unwrap_or_else(|| {
                defaulted_reviews += 1;
                0.0
            });

            let (Some(latitude), Some(longitude)) =
                (survivor.record.latitude, survivor.record.longitude)
            else {
                dropped.missing_geolocation += 1;
                continue;
            };

            cleaned.push(CleanedRecord {
                price: survivor.price,
                last_review,
                reviews_per_month,
                latitude,
                longitude,
                passthrough: survivor.record.passthrough.clone(),
            });
        }

        tracing::debug!(
            rows_in = records.len(),
            rows_out = cleaned.len(),
            dropped_price = dropped.non_positive_price,
            dropped_geo = dropped.missing_geolocation,
            %anchor_date,
            imputed_dates,
            defaulted_reviews,
            "Normalized batch"
        );

        Ok(BatchResult {
            records: cleaned,
            dropped,
            anchor_date,
            rows_in: records.len(),
            imputed_dates,
            defaulted_reviews,
        })
    }

    /// Parses a `last_review` value, treating anything unparseable as missing.
    pub fn parse_date(&self, value: Option<&str>) -> Option<NaiveDate> {
        let value = value?.trim();
        if value.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(value, &self.options.date_format).ok()
    }
}

fn check_finite(index: usize, record: &RawRecord) -> Result<()> {
    let numeric = [
        (PRICE, record.price),
        (REVIEWS_PER_MONTH, record.reviews_per_month),
        (LATITUDE, record.latitude),
        (LONGITUDE, record.longitude),
    ];
    for (field, value) in numeric {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(EtlError::MalformedRecord {
                    row: index + 1,
                    field: field.to_string(),
                    reason: format!("non-finite number {}", v),
                });
            }
        }
    }
    Ok(())
}
