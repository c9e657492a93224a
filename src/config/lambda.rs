use crate::adapters::trigger::BatchLocation;
use crate::config::{JobConfig, DEFAULT_MAX_BATCH_ROWS, DEFAULT_OUTPUT_PREFIX};
use crate::core::normalize::DEFAULT_DATE_FORMAT;
use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use std::env;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_region: String,
    pub output_prefix: String,
    pub date_format: String,
    pub max_batch_rows: usize,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        let max_batch_rows = match env::var("MAX_BATCH_ROWS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| EtlError::InvalidConfigValueError {
                    field: "MAX_BATCH_ROWS".to_string(),
                    value: raw.clone(),
                    reason: "must be a positive integer".to_string(),
                })?,
            Err(_) => DEFAULT_MAX_BATCH_ROWS,
        };

        Ok(Self {
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            output_prefix: env::var("OUTPUT_PREFIX")
                .unwrap_or_else(|_| DEFAULT_OUTPUT_PREFIX.to_string()),
            date_format: env::var("DATE_FORMAT")
                .unwrap_or_else(|_| DEFAULT_DATE_FORMAT.to_string()),
            max_batch_rows,
        })
    }

    pub fn job_for(&self, location: &BatchLocation) -> JobConfig {
        JobConfig {
            input_key: location.key.clone(),
            output_prefix: self.output_prefix.clone(),
            date_format: self.date_format.clone(),
            max_batch_rows: self.max_batch_rows,
        }
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_aws_region("S3_REGION", &self.s3_region)?;
        validation::validate_non_empty_string("OUTPUT_PREFIX", &self.output_prefix)?;
        validation::validate_date_format("DATE_FORMAT", &self.date_format)?;
        validation::validate_positive_number("MAX_BATCH_ROWS", self.max_batch_rows, 1)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Result<Self> {
        validation::validate_s3_bucket_name("bucket", &bucket)?;
        Ok(Self { client, bucket })
    }

    fn storage_error(&self, operation: &str, path: &str, message: String) -> EtlError {
        EtlError::StorageError {
            operation: operation.to_string(),
            location: self.describe(path),
            message,
        }
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| self.storage_error("read", path, DisplayErrorContext(&e).to_string()))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| self.storage_error("read", path, e.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type("text/csv")
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| self.storage_error("write", path, DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    fn describe(&self, path: &str) -> String {
        format!("s3://{}/{}", self.bucket, path)
    }
}
