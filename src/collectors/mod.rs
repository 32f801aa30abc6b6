mod zhihu;

pub use zhihu::CollectionCollector;

use crate::services::Services;

#[async_trait::async_trait]
pub trait Collector {
    type Output;

    async fn collect(
        &self,
        services: &(impl Services + Send + Sync + 'static),
    ) -> Result<Self::Output, human_errors::Error>;
}
