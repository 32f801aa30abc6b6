mod filesystem;

pub use filesystem::MarkdownPublisher;

use crate::services::Services;

#[async_trait::async_trait]
pub trait Publisher {
    type Input;

    async fn publish(
        &self,
        input: &Self::Input,
        services: &(impl Services + Send + Sync + 'static),
    ) -> Result<PublishReport, human_errors::Error>;
}

/// What happened to each item of a published collection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub written: usize,
    pub skipped: usize,
    pub failed_items: usize,
    /// Images which could not be saved and are linked remotely instead.
    pub failed_assets: usize,
}

impl std::fmt::Display for PublishReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} written, {} skipped, {} failed, {} images could not be downloaded",
            self.written, self.skipped, self.failed_items, self.failed_assets
        )
    }
}
