use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use listing_etl::adapters::trigger::parse_event;
use listing_etl::utils::{logger, validation::Validate};
use listing_etl::{EtlEngine, LambdaConfig, ListingPipeline, RunReport, S3Storage};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub reports: Vec<RunReport>,
    pub skipped: Vec<String>,
}

async fn function_handler(
    client: &S3Client,
    config: &LambdaConfig,
    event: LambdaEvent<serde_json::Value>,
) -> Result<Response, Error> {
    let request_id = event.context.request_id.clone();
    tracing::info!(%request_id, "Received normalization trigger");

    let locations = parse_event(&event.payload)?;

    let mut reports = Vec::new();
    let mut skipped = Vec::new();

    for location in locations {
        // Our own output lands in the same bucket and must not be reprocessed
        if location.is_under_prefix(&config.output_prefix) {
            tracing::info!("Skipping {}: already under output prefix", location.batch_id());
            skipped.push(location.batch_id());
            continue;
        }

        let storage = S3Storage::new(client.clone(), location.bucket.clone())?;
        let pipeline = ListingPipeline::new(storage.clone(), storage, config.job_for(&location));
        let engine = EtlEngine::new(pipeline);

        let report = engine.run().await.map_err(|e| {
            tracing::error!(
                batch_id = %location.batch_id(),
                category = ?e.category(),
                severity = ?e.severity(),
                retryable = e.is_retryable(),
                "❌ Normalization failed: {}",
                e
            );
            e
        })?;

        tracing::info!(
            batch_id = %report.batch_id,
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            "✅ Batch normalized"
        );
        reports.push(report);
    }

    Ok(Response {
        message: format!("Normalized {} object(s)", reports.len()),
        reports,
        skipped,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let client = S3Client::from_conf(s3_config);

    let client = &client;
    let lambda_config = &lambda_config;
    run(service_fn(move |event: LambdaEvent<serde_json::Value>| async move {
        function_handler(client, lambda_config, event).await
    }))
    .await
}
