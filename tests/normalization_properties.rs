//! Property-based tests for the normalization engine using proptest.

use chrono::NaiveDate;
use listing_etl::{normalize, EtlError, RawRecord};
use proptest::prelude::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn last_review() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("garbage".to_string())),
        Just(Some(String::new())),
        (2010i32..2024, 1u32..13, 1u32..29)
            .prop_map(|(y, m, d)| Some(format!("{:04}-{:02}-{:02}", y, m, d))),
    ]
}

fn coordinate() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![1 => Just(None), 4 => (-90.0f64..90.0).prop_map(Some)]
}

prop_compose! {
    fn raw_record()(
        price in prop_oneof![1 => Just(None), 1 => (-50.0f64..=0.0).prop_map(Some), 4 => (0.01f64..1000.0).prop_map(Some)],
        last_review in last_review(),
        reviews_per_month in prop_oneof![Just(None), (0.0f64..10.0).prop_map(Some)],
        latitude in coordinate(),
        longitude in coordinate(),
        id in 0u32..1_000_000,
    ) -> RawRecord {
        RawRecord {
            price,
            last_review,
            reviews_per_month,
            latitude,
            longitude,
            passthrough: vec![("id".to_string(), id.to_string())],
        }
    }
}

fn parse(value: &Option<String>) -> Option<NaiveDate> {
    value
        .as_deref()
        .and_then(|v| NaiveDate::parse_from_str(v.trim(), DATE_FORMAT).ok())
}

fn price_survivors(records: &[RawRecord]) -> Vec<&RawRecord> {
    records
        .iter()
        .filter(|r| matches!(r.price, Some(p) if p > 0.0))
        .collect()
}

proptest! {
    #[test]
    fn output_satisfies_cleaned_invariants(records in prop::collection::vec(raw_record(), 0..40)) {
        match normalize(&records) {
            Ok(result) => {
                for row in &result.records {
                    prop_assert!(row.price > 0.0);
                    prop_assert!(row.latitude.is_finite());
                    prop_assert!(row.longitude.is_finite());
                    prop_assert!(row.reviews_per_month >= 0.0);
                }
                prop_assert_eq!(
                    result.records.len() + result.dropped.total(),
                    records.len()
                );
            }
            Err(EtlError::NoValidDateAnchor { survivors }) => {
                let survivors_list = price_survivors(&records);
                prop_assert_eq!(survivors, survivors_list.len());
                prop_assert!(survivors_list.iter().all(|r| parse(&r.last_review).is_none()));
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    #[test]
    fn drop_counts_match_their_reasons(records in prop::collection::vec(raw_record(), 0..40)) {
        if let Ok(result) = normalize(&records) {
            let survivors = price_survivors(&records);
            prop_assert_eq!(result.dropped.non_positive_price, records.len() - survivors.len());
            let missing_geo = survivors
                .iter()
                .filter(|r| r.latitude.is_none() || r.longitude.is_none())
                .count();
            prop_assert_eq!(result.dropped.missing_geolocation, missing_geo);
        }
    }

    #[test]
    fn anchor_is_minimum_date_among_price_survivors(records in prop::collection::vec(raw_record(), 1..40)) {
        if let Ok(result) = normalize(&records) {
            let expected = price_survivors(&records)
                .iter()
                .filter_map(|r| parse(&r.last_review))
                .min();
            prop_assert_eq!(Some(result.anchor_date), expected);

            for (row, raw) in result.records.iter().zip(
                price_survivors(&records)
                    .into_iter()
                    .filter(|r| r.latitude.is_some() && r.longitude.is_some()),
            ) {
                let original = parse(&raw.last_review);
                prop_assert_eq!(row.last_review, original.unwrap_or(result.anchor_date));
                prop_assert_eq!(row.reviews_per_month, raw.reviews_per_month.unwrap_or(0.0));
            }
        }
    }

    #[test]
    fn survivors_keep_input_order(records in prop::collection::vec(raw_record(), 0..40)) {
        let tagged: Vec<RawRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.passthrough = vec![("row".to_string(), i.to_string())];
                r
            })
            .collect();

        if let Ok(result) = normalize(&tagged) {
            let order: Vec<usize> = result
                .records
                .iter()
                .map(|r| r.passthrough_value("row").unwrap().parse().unwrap())
                .collect();
            prop_assert!(order.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn normalizing_cleaned_output_is_identity(records in prop::collection::vec(raw_record(), 0..40)) {
        if let Ok(first) = normalize(&records) {
            if first.records.is_empty() {
                return Ok(());
            }
            let again: Vec<RawRecord> = first
                .records
                .iter()
                .map(|r| r.to_raw(DATE_FORMAT))
                .collect();

            let second = normalize(&again).unwrap();
            prop_assert_eq!(second.dropped.total(), 0);
            prop_assert_eq!(second.imputed_dates, 0);
            prop_assert_eq!(&second.records, &first.records);
        }
    }
}
