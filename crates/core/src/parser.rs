use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use scraper::{Html, Selector};

const TITLE_SELECTOR: &str = "h3.title";
const DATE_SELECTOR: &str = "h6.category";
const BODY_SELECTOR: &str = "article.blog-post";

/// Removes every empty line from a block of text.
pub fn trim_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn select_text(document: &Html, selector_source: &str, url: &str) -> Result<String, ScrapeError> {
    let selector = Selector::parse(selector_source)
        .map_err(|_| ScrapeError::Selector(selector_source.to_string()))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingElement {
            url: url.to_string(),
            selector: selector_source.to_string(),
        })?;

    Ok(element.text().collect::<String>())
}

/// Extracts title, date line, and body from a post page and concatenates
/// them into one plain-text block, with blank lines stripped from the body.
///
/// A missing expected element fails with an error naming the URL and the
/// selector that found nothing.
pub fn parse_post_html(html: &str, url: &str) -> Result<String, ScrapeError> {
    let document = Html::parse_document(html);

    let title = select_text(&document, TITLE_SELECTOR, url)?;
    let date = select_text(&document, DATE_SELECTOR, url)?;
    let body = select_text(&document, BODY_SELECTOR, url)?;

    Ok([title, date, trim_blank_lines(&body)].join("\n"))
}

pub async fn parse_post<F: PageFetcher>(fetcher: &F, url: &str) -> Result<String, ScrapeError> {
    let html = fetcher.fetch(url).await?;
    parse_post_html(&html, url)
}
