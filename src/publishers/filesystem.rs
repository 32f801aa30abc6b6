use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::assets::AttachmentDownloader;
use crate::documents::assemble;
use crate::models::{Collection, ContentItem};
use crate::prelude::*;

use super::{PublishReport, Publisher};

/// Writes each item of a collection to `{download_dir}/{collection}/{id}.md`.
pub struct MarkdownPublisher {
    pub download_dir: PathBuf,
    pub date_suffix: bool,
    pub overwrite_existed: bool,
}

enum ItemOutcome {
    Written,
    Skipped,
}

/// The collection's title reduced to characters that are safe in a directory name.
pub fn collection_directory_name(title: &str, date: Option<NaiveDate>) -> String {
    let mut name: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || "._- ".contains(*c))
        .collect();

    if let Some(date) = date {
        name.push_str(&format!("_{}", date.format("%Y%m%d")));
    }

    name
}

impl MarkdownPublisher {
    async fn publish_item(
        &self,
        item: &ContentItem,
        directory: &Path,
        attachments: &AttachmentDownloader,
    ) -> Result<ItemOutcome, human_errors::Error> {
        if item.id.is_empty() {
            return Err(human_errors::user(
                format!("An item at '{}' has no ID and cannot be saved.", item.url),
                &["This usually means the API response format has changed, check for an updated release."],
            ));
        }

        let path = directory.join(format!("{}.md", item.id));
        if !self.overwrite_existed && is_file(&path).await {
            debug!("'{}' already exists, skipping.", path.display());
            return Ok(ItemOutcome::Skipped);
        }

        let document = assemble(item, attachments).await;
        tokio::fs::write(&path, document).await.wrap_err_as_user(
            format!("We could not write the item to '{}'.", path.display()),
            &[
                "Check that you have permission to write to the download directory.",
                "Make sure that there is enough free disk space.",
            ],
        )?;

        Ok(ItemOutcome::Written)
    }
}

#[async_trait::async_trait]
impl Publisher for MarkdownPublisher {
    type Input = Collection;

    #[instrument("publishers.filesystem.publish", skip(self, collection, services), fields(collection.id = %collection.id), err(Display))]
    async fn publish(
        &self,
        collection: &Collection,
        services: &(impl Services + Send + Sync + 'static),
    ) -> Result<PublishReport, human_errors::Error> {
        let date = self.date_suffix.then(|| Local::now().date_naive());
        let name = collection_directory_name(&collection.title, date);
        let directory = self.download_dir.join(&name);

        tokio::fs::create_dir_all(&directory).await.wrap_err_as_user(
            format!("We could not create the directory '{}'.", directory.display()),
            &[
                "Check that you have permission to write to the download directory.",
                "Choose a different download directory.",
            ],
        )?;

        let attachments = AttachmentDownloader::new(directory.join("attachments"), services.http());
        let mut report = PublishReport::default();
        let total = collection.items.len();

        for (i, item) in collection.items.iter().enumerate() {
            info!("{}/{}\t{}/{}.md", i + 1, total, name, item.id);
            debug!(
                item.id = %item.id,
                item.author = %item.author.name,
                item.author_url = %item.author.url,
                "Saving the {} '{}'.",
                item.type_name(),
                item.title().unwrap_or(&item.id)
            );

            match self.publish_item(item, &directory, &attachments).await {
                Ok(ItemOutcome::Written) => report.written += 1,
                Ok(ItemOutcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    error!(item.id = %item.id, error = %err, "Failed to save item '{}': {err}", item.id);
                    report.failed_items += 1;
                }
            }
        }

        report.failed_assets = attachments.failures();
        debug!("Attachments for '{name}' are stored in '{}'.", attachments.directory().display());

        Ok(report)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
