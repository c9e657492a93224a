use crate::adapters::csv_codec::{decode_batch, encode_batch, output_columns};
use crate::core::normalize::{NormalizeOptions, Normalizer};
use crate::core::{ConfigProvider, Pipeline, RawBatch, Storage, TransformResult};
use crate::utils::error::Result;

/// Reads one listings CSV from `source`, normalizes it and writes the
/// cleaned CSV to `sink`.
pub struct ListingPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
    normalizer: Normalizer,
}

impl<S: Storage, C: ConfigProvider> ListingPipeline<S, C> {
    pub fn new(source: S, sink: S, config: C) -> Self {
        let normalizer = Normalizer::new(NormalizeOptions {
            date_format: config.date_format().to_string(),
        });
        Self {
            source,
            sink,
            config,
            normalizer,
        }
    }

    /// The source file name under the configured output prefix.
    pub fn output_key(&self) -> String {
        let key = self.config.input_key();
        let file_name = key.rsplit('/').next().unwrap_or(key);
        let prefix = self.config.output_prefix().trim_matches('/');
        if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", prefix, file_name)
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ListingPipeline<S, C> {
    fn batch_id(&self) -> String {
        self.source.describe(self.config.input_key())
    }

    async fn extract(&self) -> Result<RawBatch> {
        let key = self.config.input_key();
        tracing::debug!("Reading {}", self.source.describe(key));

        let data = self.source.read_file(key).await?;
        decode_batch(&data, self.config.max_batch_rows())
    }

    async fn transform(&self, batch: RawBatch) -> Result<TransformResult> {
        let result = self.normalizer.normalize(&batch.records)?;
        let header = output_columns(&batch.columns);
        let csv_output = encode_batch(&header, &result.records, self.normalizer.date_format())?;

        Ok(TransformResult {
            batch: result,
            csv_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let key = self.output_key();
        tracing::debug!(
            bytes = result.csv_output.len(),
            "Writing {}",
            self.sink.describe(&key)
        );

        self.sink.write_file(&key, &result.csv_output).await?;
        Ok(self.sink.describe(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::config::JobConfig;

    fn pipeline(job: JobConfig) -> ListingPipeline<LocalStorage, JobConfig> {
        let source = LocalStorage::new("in".to_string());
        let sink = LocalStorage::new("out".to_string());
        ListingPipeline::new(source, sink, job)
    }

    #[test]
    fn test_output_key_uses_file_name_under_prefix() {
        let mut job = JobConfig::new("raw/2019/listings.csv");
        assert_eq!(pipeline(job.clone()).output_key(), "processed/listings.csv");

        job.output_prefix = "/cleaned/nyc/".to_string();
        assert_eq!(pipeline(job.clone()).output_key(), "cleaned/nyc/listings.csv");

        job.output_prefix = String::new();
        assert_eq!(pipeline(job).output_key(), "listings.csv");
    }

    #[tokio::test]
    async fn test_transform_renders_dates_with_configured_format() {
        let mut job = JobConfig::new("listings.csv");
        job.date_format = "%d %B %Y".to_string();
        let batch = decode_batch(
            b"id,price,last_review,latitude,longitude\n1,10,01 May 2021,1,1\n2,12,,1,1\n",
            10,
        )
        .unwrap();

        let result = pipeline(job).transform(batch).await.unwrap();
        let text = String::from_utf8(result.csv_output).unwrap();

        assert_eq!(
            text,
            "id,price,last_review,latitude,longitude,reviews_per_month\n\
             1,10,01 May 2021,1,1,0\n\
             2,12,01 May 2021,1,1,0\n"
        );
    }
}
