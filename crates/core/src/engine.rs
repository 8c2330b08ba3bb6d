use crate::error::RagError;
use crate::index::Retriever;
use crate::llm::LlmClient;
use crate::models::RetrievedPassage;
use std::sync::Arc;

/// Combines retrieval with LLM synthesis into single-turn answers.
pub struct RetrieverQueryEngine {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
}

impl RetrieverQueryEngine {
    pub fn new(retriever: Retriever, llm: Arc<dyn LlmClient>) -> Self {
        Self { retriever, llm }
    }

    pub async fn query(&self, question: &str) -> Result<String, RagError> {
        let passages = self.retriever.retrieve(question);
        let prompt = build_prompt(question, &passages);
        self.llm.complete(&prompt).await
    }
}

fn build_prompt(question: &str, passages: &[RetrievedPassage]) -> String {
    let context = passages
        .iter()
        .map(|passage| passage.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer: "
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{Embedder, NgramHashEmbedder};
    use crate::index::VectorStoreIndex;
    use crate::models::Node;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingLlm {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingLlm {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for RecordingLlm {
        fn name(&self) -> &str {
            "recording-llm"
        }

        async fn complete(&self, prompt: &str) -> Result<String, RagError> {
            self.prompts
                .lock()
                .expect("prompt log poisoned")
                .push(prompt.to_string());
            Ok(self.answer.clone())
        }
    }

    #[tokio::test]
    async fn engine_feeds_retrieved_context_to_the_llm() {
        let embedder: Arc<dyn Embedder> = Arc::new(NgramHashEmbedder::default());
        let nodes = vec![Node {
            id: "node-0".to_string(),
            text: "The runtime shipped in March.".to_string(),
            source_url: "https://example.com/blog/runtime".to_string(),
        }];
        let retriever =
            VectorStoreIndex::build(nodes, embedder.as_ref()).as_retriever(embedder, 2);

        let llm = Arc::new(RecordingLlm::new("It shipped in March."));
        let engine = RetrieverQueryEngine::new(retriever, Arc::clone(&llm) as Arc<dyn LlmClient>);

        let answer = engine
            .query("When did the runtime ship?")
            .await
            .expect("query should succeed");

        assert_eq!(answer, "It shipped in March.");

        let prompts = llm.prompts.lock().expect("prompt log poisoned");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("The runtime shipped in March."));
        assert!(prompts[0].contains("Query: When did the runtime ship?"));
    }
}
