use serde::Deserializer;

use crate::http::{FetchError, get_json};
use crate::models::{Author, Collection, Column, ContentItem, ContentKind};
use crate::prelude::*;

use super::Collector;

/// Fetches a bookmark collection and every item in it, one page at a time.
pub struct CollectionCollector {
    collection_id: String,
}

impl CollectionCollector {
    pub fn new(collection_id: impl ToString) -> Self {
        Self {
            collection_id: collection_id.to_string(),
        }
    }

    async fn fetch_metadata(
        &self,
        services: &impl Services,
    ) -> Result<CollectionMetadata, human_errors::Error> {
        let url = format!(
            "{}/collections/{}",
            services.config().api.base_url,
            self.collection_id
        );

        let envelope: CollectionEnvelope = get_json(&services.http(), &url)
            .await
            .map_err(|err| self.explain(err))?;

        Ok(envelope.collection)
    }

    async fn fetch_page(
        &self,
        services: &impl Services,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ContentItem>, human_errors::Error> {
        let url = format!(
            "{}/collections/{}/items?offset={offset}&limit={limit}",
            services.config().api.base_url,
            self.collection_id
        );

        let page: ItemsPage = get_json(&services.http(), &url)
            .await
            .map_err(|err| self.explain(err))?;

        Ok(page
            .data
            .into_iter()
            .map(|entry| ContentItem::from(entry.content))
            .collect())
    }

    fn explain(&self, err: FetchError) -> human_errors::Error {
        debug!(transient = err.is_transient(), "Request for collection '{}' failed: {err}", self.collection_id);

        match err {
            FetchError::NotFound { .. } => human_errors::user(
                format!(
                    "The collection '{}' was not found when trying to fetch it.",
                    self.collection_id
                ),
                &[
                    "Ensure that you copied the numeric ID from the end of the collection's URL.",
                    "Private collections cannot be downloaded without being signed in.",
                ],
            ),
            FetchError::RateLimited { .. } => human_errors::user(
                "Rate limit exceeded when trying to fetch the collection.",
                &[
                    "Wait for a while before trying again.",
                    "Leave request throttling enabled to space out page requests.",
                ],
            ),
            FetchError::Rejected { status, .. } => human_errors::user(
                format!(
                    "The request for collection '{}' was rejected with status code {status}.",
                    self.collection_id
                ),
                &[
                    "Ensure that the collection is public.",
                    "The API may have blocked requests from this address, try again later.",
                ],
            ),
            FetchError::Decode { .. } => human_errors::user(
                format!("The API returned an unexpected response: {err}"),
                &[
                    "The API may have changed its response format, check for an updated release.",
                    "The API may be asking for a captcha, open the collection in a browser and try again.",
                ],
            ),
            FetchError::Server { .. } | FetchError::Network { .. } => human_errors::user(
                format!("We were unable to fetch the collection: {err}"),
                &[
                    "Make sure that your network connection is working properly.",
                    "Try again later, as the server may be temporarily unavailable.",
                ],
            ),
        }
    }
}

#[async_trait::async_trait]
impl Collector for CollectionCollector {
    type Output = Collection;

    #[instrument("collectors.zhihu.collect", skip(self, services), fields(collection.id = %self.collection_id), err(Display))]
    async fn collect(
        &self,
        services: &(impl Services + Send + Sync + 'static),
    ) -> Result<Collection, human_errors::Error> {
        let metadata = self.fetch_metadata(services).await?;
        let config = services.config();
        let limit = config.api.page_size.max(1);

        let mut collection = Collection {
            id: self.collection_id.clone(),
            title: metadata.title,
            item_count: metadata.item_count,
            items: Vec::with_capacity(metadata.item_count),
        };

        let mut offset = 0;
        let mut page_num = 1;
        while offset < collection.item_count {
            let items = self.fetch_page(services, offset, limit).await?;
            info!(
                page_num,
                offset,
                list_size = items.len(),
                "Fetched page {page_num} of collection '{}'.",
                collection.title
            );

            for item in items {
                debug!("{}/{} - {}", collection.items.len() + 1, collection.item_count, item.id);
                collection.items.push(item);
            }

            offset += limit;
            page_num += 1;

            if offset < collection.item_count {
                if let Some(delay) = config.throttle.next_delay() {
                    debug!("Waiting {delay:?} before requesting the next page.");
                    tokio::time::sleep(delay).await;
                }
            }
        }

        if collection.items.len() < collection.item_count {
            warn!(
                "Collection '{}' declares {} items but only {} were returned.",
                collection.title,
                collection.item_count,
                collection.items.len()
            );
        }

        Ok(collection)
    }
}

#[derive(Deserialize)]
struct CollectionEnvelope {
    collection: CollectionMetadata,
}

#[derive(Deserialize)]
struct CollectionMetadata {
    title: String,
    item_count: usize,
}

#[derive(Deserialize)]
struct ItemsPage {
    #[serde(default)]
    data: Vec<PageEntry>,
}

#[derive(Deserialize)]
struct PageEntry {
    content: ApiContent,
}

#[derive(Deserialize)]
struct ApiContent {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: String,
    question: Option<ApiQuestion>,
    #[serde(default)]
    content: ApiBody,
    column: Option<ApiColumn>,
    #[serde(default)]
    author: ApiAuthor,

    created: Option<i64>,
    updated: Option<i64>,
    created_time: Option<i64>,
    updated_time: Option<i64>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

impl ApiContent {
    /// Different kinds report their timestamps under different keys, the first pair present wins.
    fn timestamps(&self) -> (i64, i64) {
        [
            (self.created, self.updated),
            (self.created_time, self.updated_time),
            (self.created_at, self.updated_at),
        ]
        .into_iter()
        .find_map(|(created, updated)| created.map(|c| (c, updated.unwrap_or_default())))
        .unwrap_or_default()
    }
}

#[derive(Deserialize, Default)]
#[serde(untagged)]
enum ApiBody {
    Html(String),
    Blocks(Vec<ApiBlock>),
    #[default]
    Missing,
}

impl ApiBody {
    fn into_html(self) -> String {
        match self {
            ApiBody::Html(html) => html,
            ApiBody::Blocks(blocks) => blocks
                .into_iter()
                .next()
                .map(|block| block.content)
                .unwrap_or_default(),
            ApiBody::Missing => String::new(),
        }
    }
}

#[derive(Deserialize)]
struct ApiBlock {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ApiQuestion {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct ApiColumn {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize, Default)]
struct ApiAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

impl From<ApiContent> for ContentItem {
    fn from(content: ApiContent) -> Self {
        let (created, updated) = content.timestamps();

        let kind = match content.kind.as_str() {
            "answer" => ContentKind::Answer {
                question_title: content.question.map(|q| q.title).unwrap_or_default(),
                body: content.content.into_html(),
            },
            "pin" => ContentKind::Pin {
                body: content.content.into_html(),
            },
            "article" => ContentKind::Article {
                title: content.title,
                body: content.content.into_html(),
                column: content.column.map(|c| Column {
                    title: c.title,
                    url: c.url,
                }),
            },
            "zvideo" => ContentKind::ZVideo,
            _ => ContentKind::Other {
                kind: content.kind.clone(),
                body: content.content.into_html(),
            },
        };

        ContentItem {
            id: content.id,
            url: content.url,
            kind,
            author: Author {
                name: content.author.name,
                url: content.author.url,
            },
            created,
            updated,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Unsigned(n) => n.to_string(),
        Id::Signed(n) => n.to_string(),
    })
}
