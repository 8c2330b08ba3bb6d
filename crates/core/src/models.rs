use crate::llm::DEFAULT_OPENAI_BASE_URL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key under which every document carries its source URL.
pub const URL_METADATA_KEY: &str = "URL";

pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBED_MODEL: &str = "local:BAAI/bge-small-en";

pub const SUCCESS_BANNER: &str = "--- RAG SUCCESSFULLY LOADED ---";
pub const FAILURE_BANNER: &str = "--- RAG FAILED TO LOAD ---";

/// A parsed blog post, identified by its source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn from_post(url: impl Into<String>, text: impl Into<String>) -> Self {
        let url = url.into();
        let mut metadata = BTreeMap::new();
        metadata.insert(URL_METADATA_KEY.to_string(), url.clone());
        Self {
            id: url,
            text: text.into(),
            metadata,
        }
    }
}

/// A chunk of a document, the unit that is embedded and indexed.
///
/// IDs are assigned by the pipeline as `node-0`, `node-1`, ... in traversal
/// order across all documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub text: String,
    pub source_url: String,
}

/// A ranked passage returned by the retriever, without LLM synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub node_id: String,
    pub url: String,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeParserKind {
    SimpleSplitter,
}

impl fmt::Display for NodeParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeParserKind::SimpleSplitter => f.write_str("SimpleSplitter"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    InMemoryVector,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::InMemoryVector => f.write_str("InMemoryVectorIndex"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryEngineKind {
    Retriever,
}

impl fmt::Display for QueryEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryEngineKind::Retriever => f.write_str("RetrieverQueryEngine"),
        }
    }
}

/// Model selection for the `configure_models` stage.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub llm_model: String,
    pub embed_model: String,
    pub llm_base_url: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            llm_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

/// Cumulative record of the parameters each pipeline stage ran with.
///
/// Entries keep insertion order, are never cleared, and re-recording a key
/// overwrites its value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineConfig {
    entries: Vec<(String, String)>,
}

impl PipelineConfig {
    pub fn record(&mut self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Human-readable status block: the configuration dump when anything was
    /// recorded, otherwise the literal failure banner.
    pub fn render_status(&self) -> String {
        if self.entries.is_empty() {
            return FAILURE_BANNER.to_string();
        }

        let mut out = String::from(SUCCESS_BANNER);
        out.push_str("\n\nRAG Configuration:\n");
        for (key, value) in &self.entries {
            out.push_str(&format!("- {key}: {value}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_is_tagged_with_its_url() {
        let document = Document::from_post("https://example.com/blog/a", "Title\nBody");
        assert_eq!(document.id, "https://example.com/blog/a");
        assert_eq!(
            document.metadata.get(URL_METADATA_KEY).map(String::as_str),
            Some("https://example.com/blog/a")
        );
    }

    #[test]
    fn empty_config_renders_failure_banner() {
        let config = PipelineConfig::default();
        assert_eq!(config.render_status(), "--- RAG FAILED TO LOAD ---");
    }

    #[test]
    fn recording_a_key_twice_overwrites_in_place() {
        let mut config = PipelineConfig::default();
        config.record("chunk_size", 1024);
        config.record("similarity_top_k", 2);
        config.record("chunk_size", 512);

        assert_eq!(config.len(), 2);
        assert_eq!(config.get("chunk_size"), Some("512"));

        let report = config.render_status();
        assert!(report.starts_with(SUCCESS_BANNER));
        assert!(report.contains("- chunk_size: 512\n"));
        assert!(report.contains("- similarity_top_k: 2\n"));
    }
}
