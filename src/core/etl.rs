use crate::core::{Pipeline, RunReport};
use crate::utils::error::{ErrorCategory, Result};
use crate::utils::monitor::SystemMonitor;
use tracing::Instrument;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Runs one batch end to end. Data errors carry the batch id; storage
    /// errors are returned as the adapter reported them.
    pub async fn run(&self) -> Result<RunReport> {
        let batch_id = self.pipeline.batch_id();
        let span = tracing::info_span!("batch", batch_id = %batch_id);

        self.run_batch(&batch_id)
            .instrument(span)
            .await
            .map_err(|e| match e.category() {
                ErrorCategory::Data => e.for_batch(batch_id.clone()),
                _ => e,
            })
    }

    async fn run_batch(&self, batch_id: &str) -> Result<RunReport> {
        tracing::info!("Starting normalization of {}", batch_id);

        let raw = self.pipeline.extract().await?;
        let rows_in = raw.len();
        tracing::info!(rows_in, columns = raw.columns.len(), "Extracted batch");
        self.monitor.log_stage("extract", rows_in);

        let transformed = self.pipeline.transform(raw).await?;
        let batch = &transformed.batch;
        tracing::info!(
            rows_out = batch.records.len(),
            dropped_non_positive_price = batch.dropped.non_positive_price,
            dropped_missing_geolocation = batch.dropped.missing_geolocation,
            imputed_dates = batch.imputed_dates,
            defaulted_reviews = batch.defaulted_reviews,
            anchor_date = %batch.anchor_date,
            "Normalized batch"
        );
        self.monitor.log_stage("transform", batch.records.len());

        let rows_out = batch.records.len();
        let dropped = batch.dropped;
        let anchor_date = batch.anchor_date;

        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Cleaned batch written to {}", output_path);
        self.monitor.log_final_stats();

        Ok(RunReport {
            batch_id: batch_id.to_string(),
            output_path,
            rows_in,
            rows_out,
            dropped,
            anchor_date,
        })
    }
}
