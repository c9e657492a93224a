pub mod etl;
pub mod normalize;
pub mod pipeline;

pub use crate::domain::model::{
    BatchResult, CleanedRecord, DropCounts, RawBatch, RawRecord, RunReport, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
