//! Decodes inbound Lambda events into the object locations to normalize.
//!
//! Accepts S3 event notifications as well as direct invocations carrying
//! either `{"bucket": .., "key": ..}` or `{"location": "s3://bucket/key"}`.

use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLocation {
    pub bucket: String,
    pub key: String,
}

impl BatchLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses an `s3://bucket/key` URI.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).map_err(|e| EtlError::TriggerError {
            message: format!("invalid location '{}': {}", uri, e),
        })?;
        if url.scheme() != "s3" {
            return Err(EtlError::TriggerError {
                message: format!("unsupported scheme '{}' in '{}'", url.scheme(), uri),
            });
        }
        let bucket = url.host_str().unwrap_or_default().to_string();
        let key = decode_key(url.path().trim_start_matches('/'));
        if bucket.is_empty() || key.is_empty() {
            return Err(EtlError::TriggerError {
                message: format!("location '{}' must name a bucket and a key", uri),
            });
        }
        Ok(Self { bucket, key })
    }

    pub fn batch_id(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Whether this object was itself written under `prefix`.
    pub fn is_under_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_matches('/');
        !prefix.is_empty() && self.key.starts_with(&format!("{}/", prefix))
    }
}

#[derive(Deserialize)]
struct S3Notification {
    #[serde(rename = "Records")]
    records: Vec<NotificationRecord>,
}

#[derive(Deserialize)]
struct NotificationRecord {
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Deserialize)]
struct S3Object {
    key: String,
}

#[derive(Deserialize)]
struct DirectRequest {
    bucket: Option<String>,
    key: Option<String>,
    location: Option<String>,
}

pub fn parse_event(event: &serde_json::Value) -> Result<Vec<BatchLocation>> {
    if event.get("Records").is_some() {
        let notification: S3Notification = serde_json::from_value(event.clone())?;
        let locations: Vec<BatchLocation> = notification
            .records
            .into_iter()
            .map(|r| BatchLocation::new(r.s3.bucket.name, decode_key(&r.s3.object.key)))
            .collect();
        if locations.is_empty() {
            return Err(EtlError::TriggerError {
                message: "S3 notification contains no records".to_string(),
            });
        }
        return Ok(locations);
    }

    let request: DirectRequest = serde_json::from_value(event.clone())?;
    match request {
        DirectRequest {
            location: Some(uri),
            ..
        } => Ok(vec![BatchLocation::from_uri(&uri)?]),
        DirectRequest {
            bucket: Some(bucket),
            key: Some(key),
            ..
        } if !bucket.is_empty() && !key.is_empty() => Ok(vec![BatchLocation::new(bucket, key)]),
        _ => Err(EtlError::TriggerError {
            message: "event has neither S3 records nor a bucket/key pair".to_string(),
        }),
    }
}

/// S3 notifications form-encode object keys (`+` for space, `%XX` escapes).
fn decode_key(raw: &str) -> String {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(name, value)| {
            if value.is_empty() {
                name.into_owned()
            } else {
                format!("{}={}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_s3_notification() {
        let event = json!({
            "Records": [{
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": "listings-raw" },
                    "object": { "key": "nyc/AB_NYC+2019%282%29.csv", "size": 1024 }
                }
            }]
        });

        let locations = parse_event(&event).unwrap();
        assert_eq!(
            locations,
            vec![BatchLocation::new("listings-raw", "nyc/AB_NYC 2019(2).csv")]
        );
        assert_eq!(
            locations[0].batch_id(),
            "s3://listings-raw/nyc/AB_NYC 2019(2).csv"
        );
    }

    #[test]
    fn test_parse_direct_payloads() {
        let by_pair = parse_event(&json!({ "bucket": "b1", "key": "raw/a.csv" })).unwrap();
        assert_eq!(by_pair, vec![BatchLocation::new("b1", "raw/a.csv")]);

        let by_uri = parse_event(&json!({ "location": "s3://b2/raw/b.csv" })).unwrap();
        assert_eq!(by_uri, vec![BatchLocation::new("b2", "raw/b.csv")]);
    }

    #[test]
    fn test_parse_rejects_unusable_events() {
        assert!(matches!(
            parse_event(&json!({ "Records": [] })).unwrap_err(),
            EtlError::TriggerError { .. }
        ));
        assert!(matches!(
            parse_event(&json!({ "bucket": "only-bucket" })).unwrap_err(),
            EtlError::TriggerError { .. }
        ));
        assert!(BatchLocation::from_uri("https://example.com/a.csv").is_err());
        assert!(BatchLocation::from_uri("s3://bucket-only").is_err());
    }

    #[test]
    fn test_prefix_check() {
        let location = BatchLocation::new("b", "raw/2019/listings.csv");
        assert!(!location.is_under_prefix("processed"));
        assert!(BatchLocation::new("b", "processed/listings.csv").is_under_prefix("processed"));
    }
}
