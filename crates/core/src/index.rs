use crate::embeddings::Embedder;
use crate::models::{Node, RetrievedPassage};
use std::sync::Arc;

/// In-memory vector index over chunk nodes. Built once per pipeline run;
/// read-only afterwards.
pub struct VectorStoreIndex {
    nodes: Vec<Node>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorStoreIndex {
    pub fn build(nodes: Vec<Node>, embedder: &dyn Embedder) -> Self {
        let embeddings = nodes
            .iter()
            .map(|node| embedder.embed(&node.text))
            .collect();
        Self { nodes, embeddings }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn as_retriever(self, embedder: Arc<dyn Embedder>, similarity_top_k: usize) -> Retriever {
        Retriever {
            index: Arc::new(self),
            embedder,
            similarity_top_k,
        }
    }
}

/// Ranks indexed nodes by cosine similarity against a query embedding and
/// returns the top k.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorStoreIndex>,
    embedder: Arc<dyn Embedder>,
    similarity_top_k: usize,
}

impl Retriever {
    pub fn similarity_top_k(&self) -> usize {
        self.similarity_top_k
    }

    pub fn retrieve(&self, query: &str) -> Vec<RetrievedPassage> {
        let query_vector = self.embedder.embed(query);

        let mut scored: Vec<RetrievedPassage> = self
            .index
            .nodes
            .iter()
            .zip(self.index.embeddings.iter())
            .map(|(node, embedding)| RetrievedPassage {
                node_id: node.id.clone(),
                url: node.source_url.clone(),
                text: node.text.clone(),
                score: cosine_similarity(&query_vector, embedding),
            })
            .collect();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(self.similarity_top_k);
        scored
    }
}

fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let dot: f32 = left.iter().zip(right).map(|(l, r)| l * r).sum();
    let left_magnitude = left.iter().map(|v| v * v).sum::<f32>().sqrt();
    let right_magnitude = right.iter().map(|v| v * v).sum::<f32>().sqrt();

    if left_magnitude == 0.0 || right_magnitude == 0.0 {
        return 0.0;
    }
    dot / (left_magnitude * right_magnitude)
}
