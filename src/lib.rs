pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, ResolvedCli};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use adapters::trigger::BatchLocation;
pub use config::{cli::LocalStorage, JobConfig};
pub use core::normalize::{normalize, NormalizeOptions, Normalizer};
pub use core::{etl::EtlEngine, pipeline::ListingPipeline};
pub use domain::model::{BatchResult, CleanedRecord, DropCounts, RawRecord, RunReport};
pub use utils::error::{EtlError, Result};
