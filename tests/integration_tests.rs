use listing_etl::utils::error::ErrorCategory;
use listing_etl::utils::validation::Validate;
use listing_etl::{EtlEngine, EtlError, JobConfig, ListingPipeline, LocalStorage};
use tempfile::TempDir;

const RAW_LISTINGS: &str = "\
id,name,host_id,neighbourhood_group,latitude,longitude,price,last_review,reviews_per_month
2539,Clean & quiet apt home by the park,2787,Brooklyn,40.64749,-73.97237,149,2018-10-19,0.21
2595,Skylit Midtown Castle,2845,Manhattan,40.75362,-73.98377,225,2019-05-21,0.38
3647,THE VILLAGE OF HARLEM....NEW YORK !,4632,Manhattan,40.80902,-73.9419,150,,
3831,Cozy Entire Floor of Brownstone,4869,Brooklyn,40.68514,-73.95976,0,2019-07-05,4.64
5022,Entire Apt: Spacious Studio/Loft,7192,Manhattan,,-73.94399,80,2018-11-19,0.10
5099,Large Cozy 1 BR Apartment In Midtown East,7322,Manhattan,40.74767,-73.975,200,not-a-date,0.59
";

struct Workspace {
    _dir: TempDir,
    input_dir: String,
    output_dir: String,
}

fn workspace(file_name: &str, contents: &str) -> Workspace {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("raw");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&input_dir).unwrap();
    std::fs::write(input_dir.join(file_name), contents).unwrap();

    Workspace {
        input_dir: input_dir.to_str().unwrap().to_string(),
        output_dir: output_dir.to_str().unwrap().to_string(),
        _dir: dir,
    }
}

fn engine(ws: &Workspace, job: JobConfig) -> EtlEngine<ListingPipeline<LocalStorage, JobConfig>> {
    let source = LocalStorage::new(ws.input_dir.clone());
    let sink = LocalStorage::new(ws.output_dir.clone());
    EtlEngine::new(ListingPipeline::new(source, sink, job))
}

#[tokio::test]
async fn test_end_to_end_normalization_writes_cleaned_csv() {
    let ws = workspace("AB_NYC_2019.csv", RAW_LISTINGS);

    let report = engine(&ws, JobConfig::new("AB_NYC_2019.csv"))
        .run()
        .await
        .unwrap();

    assert_eq!(report.rows_in, 6);
    assert_eq!(report.rows_out, 4);
    assert_eq!(report.dropped.non_positive_price, 1);
    assert_eq!(report.dropped.missing_geolocation, 1);
    assert_eq!(report.anchor_date.to_string(), "2018-10-19");
    assert!(report.batch_id.ends_with("AB_NYC_2019.csv"));

    let output_path = std::path::Path::new(&ws.output_dir).join("processed/AB_NYC_2019.csv");
    assert_eq!(report.output_path, output_path.display().to_string());

    let cleaned = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = cleaned.lines().collect();

    assert_eq!(
        lines[0],
        "id,name,host_id,neighbourhood_group,latitude,longitude,price,last_review,reviews_per_month"
    );
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("2539,"));
    assert!(lines[1].ends_with(",149,2018-10-19,0.21"));
    assert!(lines[2].starts_with("2595,"));
    // Missing date and reviews are filled in
    assert!(lines[3].starts_with("3647,"));
    assert!(lines[3].ends_with(",150,2018-10-19,0"));
    // Unparseable date takes the anchor
    assert!(lines[4].starts_with("5099,"));
    assert!(lines[4].contains(",200,2018-10-19,0.59"));
}

#[tokio::test]
async fn test_cleaned_output_renormalizes_to_itself() {
    let ws = workspace("listings.csv", RAW_LISTINGS);
    engine(&ws, JobConfig::new("listings.csv"))
        .run()
        .await
        .unwrap();

    let first_pass =
        std::fs::read_to_string(std::path::Path::new(&ws.output_dir).join("processed/listings.csv"))
            .unwrap();

    let second_ws = workspace("listings.csv", &first_pass);
    let report = engine(&second_ws, JobConfig::new("listings.csv"))
        .run()
        .await
        .unwrap();

    assert_eq!(report.dropped.total(), 0);
    let second_pass = std::fs::read_to_string(
        std::path::Path::new(&second_ws.output_dir).join("processed/listings.csv"),
    )
    .unwrap();
    assert_eq!(first_pass, second_pass);
}

#[tokio::test]
async fn test_batch_without_valid_dates_fails_and_writes_nothing() {
    let contents = "\
id,price,last_review,reviews_per_month,latitude,longitude
1,100,,1.0,40.7,-73.9
2,90,31/12/2019,1.0,40.7,-73.9
3,0,2019-12-31,1.0,40.7,-73.9
";
    let ws = workspace("undated.csv", contents);

    let err = engine(&ws, JobConfig::new("undated.csv"))
        .run()
        .await
        .unwrap_err();

    match &err {
        EtlError::BatchFailed { batch_id, source } => {
            assert!(batch_id.ends_with("undated.csv"));
            assert!(matches!(**source, EtlError::NoValidDateAnchor { survivors: 2 }));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!std::path::Path::new(&ws.output_dir)
        .join("processed/undated.csv")
        .exists());
}

#[tokio::test]
async fn test_custom_date_format_is_used_for_parsing_and_output() {
    let contents = "\
id,price,last_review,reviews_per_month,latitude,longitude
1,100,31/12/2019,1.0,40.7,-73.9
2,90,,1.0,40.7,-73.9
";
    let ws = workspace("eu.csv", contents);
    let mut job = JobConfig::new("eu.csv");
    job.date_format = "%d/%m/%Y".to_string();
    job.output_prefix = "cleaned/eu".to_string();

    let report = engine(&ws, job).run().await.unwrap();

    assert_eq!(report.rows_out, 2);
    let cleaned =
        std::fs::read_to_string(std::path::Path::new(&ws.output_dir).join("cleaned/eu/eu.csv"))
            .unwrap();
    assert!(cleaned.contains("2,90,31/12/2019,1,40.7,-73.9"));
}

#[tokio::test]
async fn test_malformed_price_fails_with_batch_context() {
    let contents = "\
id,price,last_review,reviews_per_month,latitude,longitude
1,100,2019-01-01,1.0,40.7,-73.9
2,$90,2019-01-01,1.0,40.7,-73.9
";
    let ws = workspace("dollars.csv", contents);

    let err = engine(&ws, JobConfig::new("dollars.csv"))
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Data);
    assert!(matches!(
        err.root(),
        EtlError::MalformedRecord { row: 2, field, .. } if field == "price"
    ));
}

#[tokio::test]
async fn test_oversized_batch_is_refused() {
    let ws = workspace("big.csv", RAW_LISTINGS);
    let mut job = JobConfig::new("big.csv");
    job.max_batch_rows = 3;

    let err = engine(&ws, job).run().await.unwrap_err();
    assert!(matches!(
        err.root(),
        EtlError::BatchTooLarge { rows: 4, limit: 3 }
    ));
}

#[tokio::test]
async fn test_missing_source_propagates_storage_error() {
    let ws = workspace("present.csv", RAW_LISTINGS);

    let err = engine(&ws, JobConfig::new("absent.csv"))
        .run()
        .await
        .unwrap_err();

    // Adapter errors are not wrapped with batch context
    assert!(matches!(err, EtlError::StorageError { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_date_format_with_time_fields_is_rejected_without_panicking() {
    let ws = workspace(
        "timed.csv",
        "price,last_review,latitude,longitude\n10,2021-05-01 10:30,1,1\n",
    );
    let mut job = JobConfig::new("timed.csv");
    job.date_format = "%Y-%m-%d %H:%M".to_string();

    assert!(job.validate().is_err());

    // Unvalidated configs still fail with a typed error at encode time
    let err = engine(&ws, job).run().await.unwrap_err();
    assert!(matches!(
        err,
        EtlError::InvalidConfigValueError { ref field, .. } if field == "date_format"
    ));
    assert!(!std::path::Path::new(&ws.output_dir)
        .join("processed/timed.csv")
        .exists());
}
