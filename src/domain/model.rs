use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PRICE: &str = "price";
pub const LAST_REVIEW: &str = "last_review";
pub const REVIEWS_PER_MONTH: &str = "reviews_per_month";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// Columns the normalization rules act on, in canonical output order.
pub const CORE_COLUMNS: [&str; 5] = [PRICE, LAST_REVIEW, REVIEWS_PER_MONTH, LATITUDE, LONGITUDE];

/// One listing row as it arrived. `None` means the field was absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub price: Option<f64>,
    pub last_review: Option<String>,
    pub reviews_per_month: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Every other column, kept verbatim and in input order.
    pub passthrough: Vec<(String, String)>,
}

impl RawRecord {
    pub fn passthrough_value(&self, column: &str) -> Option<&str> {
        self.passthrough
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub price: f64,
    pub last_review: NaiveDate,
    pub reviews_per_month: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub passthrough: Vec<(String, String)>,
}

impl CleanedRecord {
    /// Renders this record back into raw form, dates in `date_format`.
    pub fn to_raw(&self, date_format: &str) -> RawRecord {
        RawRecord {
            price: Some(self.price),
            last_review: Some(self.last_review.format(date_format).to_string()),
            reviews_per_month: Some(self.reviews_per_month),
            latitude: Some(self.latitude),
            longitude: Some(self.longitude),
            passthrough: self.passthrough.clone(),
        }
    }

    pub fn passthrough_value(&self, column: &str) -> Option<&str> {
        self.passthrough
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub non_positive_price: usize,
    pub missing_geolocation: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.non_positive_price + self.missing_geolocation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub records: Vec<CleanedRecord>,
    pub dropped: DropCounts,
    /// Minimum valid `last_review` among price-filter survivors.
    pub anchor_date: NaiveDate,
    pub rows_in: usize,
    pub imputed_dates: usize,
    pub defaulted_reviews: usize,
}

/// A decoded table: column names in source order plus its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub batch: BatchResult,
    pub csv_output: Vec<u8>,
}

/// What one engine run did, suitable for audit logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub batch_id: String,
    pub output_path: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped: DropCounts,
    pub anchor_date: NaiveDate,
}
