pub mod chunking;
pub mod crawler;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod index;
pub mod llm;
pub mod loader;
pub mod models;
pub mod parser;
pub mod pipeline;

pub use chunking::split_text;
pub use crawler::collect_post_links;
pub use embeddings::{
    resolve_embed_model, Embedder, NgramHashEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use engine::RetrieverQueryEngine;
pub use error::{RagError, ScrapeError};
pub use fetch::{HttpFetcher, PageFetcher};
pub use index::{Retriever, VectorStoreIndex};
pub use llm::{LlmClient, OpenAiChatClient, DEFAULT_OPENAI_BASE_URL, OPENAI_API_KEY_VAR};
pub use loader::{BlogWebLoader, DocumentLoader, LoaderOptions};
pub use models::{
    Document, IndexKind, ModelSettings, Node, NodeParserKind, PipelineConfig, QueryEngineKind,
    RetrievedPassage, DEFAULT_EMBED_MODEL, DEFAULT_LLM_MODEL, FAILURE_BANNER, SUCCESS_BANNER,
};
pub use parser::{parse_post, parse_post_html, trim_blank_lines};
pub use pipeline::{RagPipeline, SetupOptions, DEFAULT_CHUNK_SIZE, DEFAULT_SIMILARITY_TOP_K};
