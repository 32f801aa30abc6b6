use std::path::PathBuf;

use clap::Parser;

use crate::collectors::CollectionCollector;
use crate::config::ThrottleConfig;
use crate::prelude::*;
use crate::publishers::{MarkdownPublisher, PublishReport};
use crate::services::ServicesContainer;

/// Download a Zhihu collection as Markdown files.
#[derive(Parser, Debug)]
#[command(name = "zhihu-archive", version, about)]
pub struct Args {
    /// The numeric ID at the end of the collection's URL.
    pub collection_id: String,

    /// Where collections are saved [default: ~/zhihu_collections]
    pub download_dir: Option<PathBuf>,

    /// Append today's date to the collection's directory name.
    #[arg(short = 'S', long, alias = "date_suffix")]
    pub date_suffix: bool,

    /// Rewrite items which have already been saved.
    #[arg(short = 'f', long, alias = "overwrite_existed")]
    pub overwrite_existed: bool,

    /// A TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Request pages back to back instead of pausing between them.
    #[arg(long)]
    pub no_throttle: bool,
}

pub fn default_download_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zhihu_collections")
}

impl Args {
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(default_download_dir)
    }

    pub fn load_config(&self) -> Result<Config, human_errors::Error> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if self.no_throttle {
            config.throttle = ThrottleConfig::disabled();
        }

        Ok(config)
    }

    pub async fn execute(self) -> Result<PublishReport, human_errors::Error> {
        let services = ServicesContainer::new(self.load_config()?)?;

        let collection = CollectionCollector::new(&self.collection_id)
            .collect(&services)
            .await?;
        info!(
            "Fetched {} items from collection '{}'.",
            collection.items.len(),
            collection.title
        );

        let publisher = MarkdownPublisher {
            download_dir: self.download_dir(),
            date_suffix: self.date_suffix,
            overwrite_existed: self.overwrite_existed,
        };

        publisher.publish(&collection, &services).await
    }
}
