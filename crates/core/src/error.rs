use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("missing element `{selector}` at {url}")]
    MissingElement { url: String, selector: String },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("failed to parse page at {url}: {source}")]
    Page {
        url: String,
        #[source]
        source: Box<ScrapeError>,
    },
}

impl ScrapeError {
    /// Wraps an error with the URL of the page it occurred on.
    pub fn at_page(self, url: impl Into<String>) -> Self {
        ScrapeError::Page {
            url: url.into(),
            source: Box::new(self),
        }
    }
}

#[derive(Debug, Error)]
pub enum RagError {
    #[error("error loading documents: {0}")]
    Load(#[from] ScrapeError),

    #[error("pipeline stage not ready: {0}")]
    NotConfigured(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream model call failed: {0}")]
    Upstream(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    /// HTTP status the facade should answer with for this error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            RagError::InvalidInput(_) => 400,
            RagError::NotConfigured(_) => 503,
            _ => 500,
        }
    }
}

pub type Result<T, E = RagError> = std::result::Result<T, E>;
