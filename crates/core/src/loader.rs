use crate::crawler::collect_post_links;
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::Document;
use crate::parser::parse_post;
use async_trait::async_trait;
use tracing::info;

/// Parameters for a document load.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Listing page the crawl starts from.
    pub base_url: String,
    /// Cap on the number of posts loaded, applied after crawling.
    pub limit: Option<usize>,
}

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Display name recorded into the pipeline configuration.
    fn name(&self) -> &'static str;

    async fn load(&self, options: &LoaderOptions) -> Result<Vec<Document>, ScrapeError>;
}

/// Loads a blog by crawling its paginated listing and parsing every post
/// into a URL-tagged document.
pub struct BlogWebLoader<F: PageFetcher> {
    fetcher: F,
}

impl<F: PageFetcher> BlogWebLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: PageFetcher> DocumentLoader for BlogWebLoader<F> {
    fn name(&self) -> &'static str {
        "BlogWebLoader"
    }

    /// Any single post failing to parse aborts the whole load; there is no
    /// partial document set.
    async fn load(&self, options: &LoaderOptions) -> Result<Vec<Document>, ScrapeError> {
        let mut links = collect_post_links(&self.fetcher, &options.base_url).await?;
        if let Some(limit) = options.limit {
            links.truncate(limit);
        }

        let mut documents = Vec::with_capacity(links.len());
        for link in links {
            let text = parse_post(&self.fetcher, &link)
                .await
                .map_err(|source| source.at_page(link.clone()))?;
            documents.push(Document::from_post(link, text));
        }

        info!(document_count = documents.len(), "blog documents loaded");
        Ok(documents)
    }
}
