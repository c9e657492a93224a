use crate::domain::model::{RawBatch, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human-readable location of `path`, used in logs and error messages.
    fn describe(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn input_key(&self) -> &str;
    fn output_prefix(&self) -> &str;
    fn date_format(&self) -> &str;
    fn max_batch_rows(&self) -> usize;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Identifier of the batch this pipeline processes, for correlation only.
    fn batch_id(&self) -> String;
    async fn extract(&self) -> Result<RawBatch>;
    async fn transform(&self, batch: RawBatch) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
