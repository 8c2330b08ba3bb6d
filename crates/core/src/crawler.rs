use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use scraper::{Html, Selector};
use url::Url;

const CARD_TITLE_SELECTOR: &str = ".card-title";
const ANCHOR_SELECTOR: &str = "a";
const NEXT_PAGE_SELECTOR: &str = "a.pagination__next";

struct ListingPage {
    post_hrefs: Vec<String>,
    next_href: Option<String>,
}

fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|_| ScrapeError::Selector(selector.to_string()))
}

fn extract_listing(html: &str) -> Result<ListingPage, ScrapeError> {
    let document = Html::parse_document(html);
    let card_title = compile(CARD_TITLE_SELECTOR)?;
    let anchor = compile(ANCHOR_SELECTOR)?;
    let next_page = compile(NEXT_PAGE_SELECTOR)?;

    let mut post_hrefs = Vec::new();
    for title in document.select(&card_title) {
        let Some(link) = title.select(&anchor).next() else {
            continue;
        };
        if let Some(href) = link.value().attr("href") {
            post_hrefs.push(href.to_string());
        }
    }

    let next_href = document
        .select(&next_page)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string);

    Ok(ListingPage {
        post_hrefs,
        next_href,
    })
}

/// Collects every post URL reachable from a paginated listing page, in
/// page-then-card order, following the "next" control until it disappears.
///
/// Card and next-page hrefs are resolved against the current page URL, so
/// absolute-path and relative pagination links both work. Network and parse
/// failures abort the crawl.
pub async fn collect_post_links<F: PageFetcher>(
    fetcher: &F,
    base_url: &str,
) -> Result<Vec<String>, ScrapeError> {
    let mut links = Vec::new();
    let mut page_url = Url::parse(base_url)?;

    loop {
        let body = fetcher.fetch(page_url.as_str()).await?;
        let listing = extract_listing(&body)?;

        for href in &listing.post_hrefs {
            links.push(page_url.join(href)?.to_string());
        }

        match listing.next_href {
            Some(next) => page_url = page_url.join(&next)?,
            None => break,
        }
    }

    Ok(links)
}
