use clap::Parser;
use listing_etl::utils::error::ErrorSeverity;
use listing_etl::utils::{logger, validation::Validate};
use listing_etl::{CliConfig, EtlEngine, ListingPipeline, LocalStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("Starting listing-etl CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let resolved = match args.resolve().and_then(|r| r.validate().map(|_| r)) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if resolved.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let source = LocalStorage::new(resolved.input_dir.clone());
    let sink = LocalStorage::new(resolved.output_dir.clone());
    let pipeline = ListingPipeline::new(source, sink, resolved.job.clone());
    let engine = EtlEngine::new_with_monitoring(pipeline, resolved.monitor);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Normalization completed successfully!");
            println!("✅ Cleaned {} of {} rows", report.rows_out, report.rows_in);
            println!(
                "   dropped: {} non-positive price, {} missing geolocation",
                report.dropped.non_positive_price, report.dropped.missing_geolocation
            );
            println!("   anchor date: {}", report.anchor_date);
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Normalization failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
