use crate::chunking::split_text;
use crate::embeddings::{resolve_embed_model, Embedder};
use crate::engine::RetrieverQueryEngine;
use crate::error::RagError;
use crate::index::{Retriever, VectorStoreIndex};
use crate::llm::{LlmClient, OpenAiChatClient};
use crate::loader::{DocumentLoader, LoaderOptions};
use crate::models::{
    Document, IndexKind, ModelSettings, Node, NodeParserKind, PipelineConfig, QueryEngineKind,
    RetrievedPassage, URL_METADATA_KEY,
};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_SIMILARITY_TOP_K: usize = 2;

/// Parameters for a full pipeline run.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub loader: LoaderOptions,
    pub node_parser: NodeParserKind,
    pub chunk_size: usize,
    pub models: ModelSettings,
    pub index: IndexKind,
    pub similarity_top_k: usize,
    pub query_engine: QueryEngineKind,
}

impl SetupOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            loader: LoaderOptions {
                base_url: base_url.into(),
                limit: None,
            },
            node_parser: NodeParserKind::SimpleSplitter,
            chunk_size: DEFAULT_CHUNK_SIZE,
            models: ModelSettings::default(),
            index: IndexKind::InMemoryVector,
            similarity_top_k: DEFAULT_SIMILARITY_TOP_K,
            query_engine: QueryEngineKind::Retriever,
        }
    }
}

/// Orchestrates the five pipeline stages and serves queries afterwards.
///
/// Stages run in order: load_documents, parse_to_nodes, configure_models,
/// build_retriever, build_query_engine. Each stage records its parameters
/// into the cumulative [`PipelineConfig`] before acting. The pipeline is
/// rebuilt from scratch on every process start; once built, all query paths
/// take `&self` and are safe to share behind an `Arc`.
#[derive(Default)]
pub struct RagPipeline {
    documents: Vec<Document>,
    nodes: Vec<Node>,
    embedder: Option<Arc<dyn Embedder>>,
    llm: Option<Arc<dyn LlmClient>>,
    retriever: Option<Retriever>,
    engine: Option<RetrieverQueryEngine>,
    config: PipelineConfig,
}

impl RagPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage 1: crawl and parse the blog into documents.
    pub async fn load_documents(
        &mut self,
        loader: &dyn DocumentLoader,
        options: &LoaderOptions,
    ) -> Result<(), RagError> {
        self.config.record("data_loader", loader.name());
        self.config.record("base_url", &options.base_url);
        if let Some(limit) = options.limit {
            self.config.record("document_limit", limit);
        }

        let documents = loader.load(options).await?;
        info!(document_count = documents.len(), "documents loaded");
        self.documents = documents;
        Ok(())
    }

    /// Stage 2: split documents into nodes and relabel them `node-0`,
    /// `node-1`, ... in traversal order. Retrieval ordering and anything
    /// keyed on node IDs relies on this numbering being gap-free.
    pub fn parse_to_nodes(
        &mut self,
        node_parser: NodeParserKind,
        chunk_size: usize,
    ) -> Result<(), RagError> {
        self.config.record("node_parser", node_parser);
        self.config.record("chunk_size", chunk_size);

        if chunk_size == 0 {
            return Err(RagError::InvalidInput(
                "chunk_size must be positive".to_string(),
            ));
        }

        let mut nodes = Vec::new();
        for document in &self.documents {
            let url = document
                .metadata
                .get(URL_METADATA_KEY)
                .cloned()
                .unwrap_or_else(|| document.id.clone());

            for chunk in split_text(&document.text, chunk_size) {
                nodes.push(Node {
                    id: format!("node-{}", nodes.len()),
                    text: chunk,
                    source_url: url.clone(),
                });
            }
        }

        info!(node_count = nodes.len(), "documents chunked");
        self.nodes = nodes;
        Ok(())
    }

    /// Stage 3: resolve the LLM and embedding models. Credentials are read
    /// from the environment (via dotenv) exactly once, here.
    pub fn configure_models(&mut self, settings: &ModelSettings) -> Result<(), RagError> {
        self.config.record("llm_model", &settings.llm_model);
        self.config.record("embed_model", &settings.embed_model);

        dotenv::dotenv().ok();
        let llm = OpenAiChatClient::from_env(
            settings.llm_base_url.clone(),
            settings.llm_model.clone(),
        );

        self.llm = Some(Arc::new(llm));
        self.embedder = Some(resolve_embed_model(&settings.embed_model)?);
        Ok(())
    }

    /// Installs already-built model handles instead of resolving them.
    /// Used by tests and callers that bring their own embed/LLM stack.
    pub fn install_models(&mut self, llm: Arc<dyn LlmClient>, embedder: Arc<dyn Embedder>) {
        self.config.record("llm_model", llm.name());
        self.config.record("embed_model", embedder.name());
        self.llm = Some(llm);
        self.embedder = Some(embedder);
    }

    /// Stage 4: embed the nodes, build the vector index, and keep a top-k
    /// retriever over it.
    pub fn build_retriever(
        &mut self,
        index: IndexKind,
        similarity_top_k: usize,
    ) -> Result<(), RagError> {
        self.config.record("vector_index", index);
        self.config.record("similarity_top_k", similarity_top_k);

        let embedder = self.embedder.clone().ok_or_else(|| {
            RagError::NotConfigured(
                "models must be configured before building the retriever".to_string(),
            )
        })?;

        let built = VectorStoreIndex::build(self.nodes.clone(), embedder.as_ref());
        info!(indexed_nodes = built.len(), "vector index built");
        self.retriever = Some(built.as_retriever(embedder, similarity_top_k));
        Ok(())
    }

    /// Stage 5: wire the retriever and the LLM into a query engine.
    pub fn build_query_engine(&mut self, query_engine: QueryEngineKind) -> Result<(), RagError> {
        self.config.record("query_engine", query_engine);

        let retriever = self.retriever.clone().ok_or_else(|| {
            RagError::NotConfigured(
                "the retriever must be built before the query engine".to_string(),
            )
        })?;
        let llm = self.llm.clone().ok_or_else(|| {
            RagError::NotConfigured(
                "models must be configured before building the query engine".to_string(),
            )
        })?;

        self.engine = Some(RetrieverQueryEngine::new(retriever, llm));
        Ok(())
    }

    /// Runs all five stages in order.
    pub async fn setup(
        &mut self,
        loader: &dyn DocumentLoader,
        options: &SetupOptions,
    ) -> Result<(), RagError> {
        self.load_documents(loader, &options.loader).await?;
        self.parse_to_nodes(options.node_parser, options.chunk_size)?;
        self.configure_models(&options.models)?;
        self.build_retriever(options.index, options.similarity_top_k)?;
        self.build_query_engine(options.query_engine)?;
        Ok(())
    }

    /// Single free-text question through the query engine.
    pub async fn query(&self, question: &str) -> Result<String, RagError> {
        let engine = self.engine.as_ref().ok_or_else(|| {
            RagError::NotConfigured(
                "set up the pipeline and its query engine before submitting queries".to_string(),
            )
        })?;
        engine.query(question).await
    }

    /// Applies [`RagPipeline::query`] sequentially, preserving input order.
    /// The first failure aborts the whole batch.
    pub async fn query_multiple(&self, questions: &[String]) -> Result<Vec<String>, RagError> {
        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            answers.push(self.query(question).await?);
        }
        Ok(answers)
    }

    /// Ranked passages for a question, without LLM synthesis. Only needs the
    /// retriever stage.
    pub fn fetch_relevant_info(&self, question: &str) -> Result<Vec<RetrievedPassage>, RagError> {
        let retriever = self.retriever.as_ref().ok_or_else(|| {
            RagError::NotConfigured(
                "set up the pipeline and its retriever before fetching relevant information"
                    .to_string(),
            )
        })?;
        Ok(retriever.retrieve(question))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn status_report(&self) -> String {
        self.config.render_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::NgramHashEmbedder;
    use crate::error::ScrapeError;
    use crate::models::FAILURE_BANNER;
    use async_trait::async_trait;

    struct FixtureLoader {
        documents: Vec<Document>,
    }

    impl FixtureLoader {
        fn with_posts(posts: &[(&str, &str)]) -> Self {
            Self {
                documents: posts
                    .iter()
                    .map(|(url, text)| Document::from_post(*url, *text))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl DocumentLoader for FixtureLoader {
        fn name(&self) -> &'static str {
            "FixtureLoader"
        }

        async fn load(&self, options: &LoaderOptions) -> Result<Vec<Document>, ScrapeError> {
            let mut documents = self.documents.clone();
            if let Some(limit) = options.limit {
                documents.truncate(limit);
            }
            Ok(documents)
        }
    }

    struct EchoLlm {
        answer: &'static str,
    }

    #[async_trait]
    impl LlmClient for EchoLlm {
        fn name(&self) -> &str {
            "echo-llm"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, RagError> {
            Ok(self.answer.to_string())
        }
    }

    fn fixture_loader() -> FixtureLoader {
        FixtureLoader::with_posts(&[
            (
                "https://example.com/blog/one",
                "Post one\nJan 1, 2024\nThe first post talks about hydraulic pumps.",
            ),
            (
                "https://example.com/blog/two",
                "Post two\nFeb 2, 2024\nThe second post talks about sourdough bread.",
            ),
            (
                "https://example.com/blog/three",
                "Post three\nMar 3, 2024\nThe third post talks about compiler toolchains.",
            ),
        ])
    }

    fn stub_models(pipeline: &mut RagPipeline, answer: &'static str) {
        pipeline.install_models(
            Arc::new(EchoLlm { answer }),
            Arc::new(NgramHashEmbedder::default()),
        );
    }

    #[tokio::test]
    async fn node_ids_are_sequential_across_documents() {
        let mut pipeline = RagPipeline::new();
        let loader = fixture_loader();
        pipeline
            .load_documents(
                &loader,
                &LoaderOptions {
                    base_url: "https://example.com/blog/".to_string(),
                    limit: None,
                },
            )
            .await
            .expect("load should succeed");

        // small chunk size so each document produces several nodes
        pipeline
            .parse_to_nodes(NodeParserKind::SimpleSplitter, 24)
            .expect("chunking should succeed");

        let nodes = pipeline.nodes();
        assert!(nodes.len() > 3);
        for (index, node) in nodes.iter().enumerate() {
            assert_eq!(node.id, format!("node-{index}"));
        }
    }

    #[tokio::test]
    async fn query_before_setup_is_a_state_error() {
        let pipeline = RagPipeline::new();
        let error = pipeline.query("test").await.expect_err("must fail");
        assert!(matches!(error, RagError::NotConfigured(_)));
        assert_eq!(error.status_code(), 503);
    }

    #[test]
    fn fetch_relevant_info_before_retriever_is_a_state_error() {
        let pipeline = RagPipeline::new();
        let error = pipeline
            .fetch_relevant_info("test")
            .expect_err("must fail");
        assert!(matches!(error, RagError::NotConfigured(_)));
    }

    #[test]
    fn build_retriever_before_models_is_a_state_error() {
        let mut pipeline = RagPipeline::new();
        let error = pipeline
            .build_retriever(IndexKind::InMemoryVector, 2)
            .expect_err("must fail");
        assert!(matches!(error, RagError::NotConfigured(_)));
    }

    #[test]
    fn fresh_pipeline_status_is_the_failure_banner() {
        let pipeline = RagPipeline::new();
        assert_eq!(pipeline.status_report(), FAILURE_BANNER);
        assert_eq!(pipeline.status_report(), "--- RAG FAILED TO LOAD ---");
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut pipeline = RagPipeline::new();
        let error = pipeline
            .parse_to_nodes(NodeParserKind::SimpleSplitter, 0)
            .expect_err("must fail");
        assert!(matches!(error, RagError::InvalidInput(_)));
        assert_eq!(error.status_code(), 400);
    }

    #[tokio::test]
    async fn end_to_end_with_stubbed_models_echoes_the_fixed_answer() {
        let mut pipeline = RagPipeline::new();
        let loader = fixture_loader();

        pipeline
            .load_documents(
                &loader,
                &LoaderOptions {
                    base_url: "https://example.com/blog/".to_string(),
                    limit: None,
                },
            )
            .await
            .expect("load should succeed");
        pipeline
            .parse_to_nodes(NodeParserKind::SimpleSplitter, DEFAULT_CHUNK_SIZE)
            .expect("chunking should succeed");
        stub_models(&mut pipeline, "A fixed echo answer.");
        pipeline
            .build_retriever(IndexKind::InMemoryVector, DEFAULT_SIMILARITY_TOP_K)
            .expect("retriever should build");
        pipeline
            .build_query_engine(QueryEngineKind::Retriever)
            .expect("engine should build");

        let answer = pipeline.query("test").await.expect("query should succeed");
        assert_eq!(answer, "A fixed echo answer.");

        // all five stage parameter groups are recorded
        let report = pipeline.status_report();
        assert!(report.starts_with("--- RAG SUCCESSFULLY LOADED ---"));
        for key in [
            "data_loader",
            "node_parser",
            "chunk_size",
            "llm_model",
            "embed_model",
            "vector_index",
            "similarity_top_k",
            "query_engine",
        ] {
            assert!(report.contains(&format!("- {key}: ")), "missing {key}");
        }

        let batch = pipeline
            .query_multiple(&["a".to_string(), "b".to_string()])
            .await
            .expect("batch should succeed");
        assert_eq!(batch, vec!["A fixed echo answer.", "A fixed echo answer."]);

        let passages = pipeline
            .fetch_relevant_info("hydraulic pumps")
            .expect("retrieval should succeed");
        assert_eq!(passages.len(), DEFAULT_SIMILARITY_TOP_K);
        assert_eq!(passages[0].url, "https://example.com/blog/one");
    }

    #[tokio::test]
    async fn setup_runs_all_stages_with_resolved_models() {
        let mut pipeline = RagPipeline::new();
        let loader = fixture_loader();
        let options = SetupOptions::new("https://example.com/blog/");

        pipeline
            .setup(&loader, &options)
            .await
            .expect("setup should succeed");

        assert_eq!(pipeline.documents().len(), 3);
        assert!(!pipeline.nodes().is_empty());
        assert_eq!(pipeline.config().get("data_loader"), Some("FixtureLoader"));
        assert_eq!(
            pipeline.config().get("embed_model"),
            Some("local:BAAI/bge-small-en")
        );
        // the engine exists even though no real credentials are present;
        // credential problems surface at query time
        assert!(pipeline.fetch_relevant_info("pumps").is_ok());
    }
}
