use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::application::services::Embedder;
use crate::application::settings::RagConfig;
use crate::domain::{DomainError, RankedResult, VectorIndex};

/// Scores every record against `query` and orders them best first.
///
/// Ties keep index order. With `min_score` set, lower-scoring records are
/// dropped before sorting.
pub fn rank(query: &[f32], index: &VectorIndex, min_score: Option<f32>) -> Vec<RankedResult> {
    let mut ranked: Vec<RankedResult> = index
        .records()
        .iter()
        .enumerate()
        .map(|(row, record)| RankedResult {
            score: fold_negative_zero(record.embedding.dot(query)),
            row,
        })
        .filter(|r| min_score.map_or(true, |min| r.score >= min))
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// `total_cmp` orders `-0.0` below `0.0`; both must tie.
fn fold_negative_zero(score: f32) -> f32 {
    if score == 0.0 {
        0.0
    } else {
        score
    }
}

/// Formats the best entries as `- [filename] text` paragraphs.
///
/// The first entry is always taken. Later ones are taken only while the
/// running length, in characters, stays within `char_budget`; the first
/// entry that would overflow ends the context.
pub fn build_context(
    ranked: &[RankedResult],
    index: &VectorIndex,
    top_k: usize,
    char_budget: usize,
) -> String {
    let mut context = String::new();
    let mut used = 0;

    for (count, item) in ranked.iter().take(top_k).enumerate() {
        let Some(record) = index.get(item.row) else {
            continue;
        };

        let entry = format!("- [{}] {}\n\n", record.filename, record.text);
        let len = entry.chars().count();
        if count >= 1 && used + len > char_budget {
            break;
        }

        context.push_str(&entry);
        used += len;
    }

    context
}

#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub ranked: Vec<RankedResult>,
    pub context: String,
}

#[derive(Clone)]
pub struct RetrievalService {
    embedder: Embedder,
    index: Arc<VectorIndex>,
    config: RagConfig,
}

impl RetrievalService {
    pub fn new(embedder: Embedder, index: Arc<VectorIndex>, config: RagConfig) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn rank(&self, query: &[f32]) -> Vec<RankedResult> {
        rank(query, &self.index, self.config.min_score())
    }

    pub fn build_context(
        &self,
        ranked: &[RankedResult],
        top_k: usize,
        char_budget: usize,
    ) -> String {
        build_context(ranked, &self.index, top_k, char_budget)
    }

    /// Embeds the question in query mode, ranks, and assembles the context.
    #[instrument(skip(self, question, top_k), fields(top_k))]
    pub async fn retrieve(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<Retrieval, DomainError> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        tracing::Span::current().record("top_k", top_k);

        let query = self.embedder.embed_query(question).await?;
        let ranked = self.rank(query.as_slice());
        let context = self.build_context(&ranked, top_k, self.config.context_budget);

        debug!(
            candidates = ranked.len(),
            context_chars = context.chars().count(),
            "retrieval finished"
        );
        Ok(Retrieval { ranked, context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndexRecord;

    fn two_record_index() -> VectorIndex {
        VectorIndex::new(vec![
            IndexRecord::new(0, vec![1.0, 0.0], "a.txt", "cats are mammals"),
            IndexRecord::new(1, vec![0.0, 1.0], "b.txt", "dogs bark"),
        ])
    }

    #[test]
    fn test_rank_scores_by_dot_product() {
        let ranked = rank(&[1.0, 0.0], &two_record_index(), None);
        assert_eq!(
            ranked,
            vec![
                RankedResult { score: 1.0, row: 0 },
                RankedResult { score: 0.0, row: 1 },
            ]
        );
    }

    #[test]
    fn test_context_for_best_match() {
        let index = two_record_index();
        let ranked = rank(&[1.0, 0.0], &index, None);
        assert_eq!(
            build_context(&ranked, &index, 1, 1000),
            "- [a.txt] cats are mammals\n\n"
        );
    }

    #[test]
    fn test_rank_ties_keep_index_order() {
        let index = VectorIndex::new(vec![
            IndexRecord::new(0, vec![0.2], "low.txt", "low"),
            IndexRecord::new(1, vec![0.5], "first.txt", "tie one"),
            IndexRecord::new(2, vec![0.5], "second.txt", "tie two"),
            IndexRecord::new(3, vec![0.9], "top.txt", "top"),
        ]);

        let rows: Vec<usize> = rank(&[1.0], &index, None).iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_rank_signed_zero_scores_tie_in_index_order() {
        let index = VectorIndex::new(vec![
            IndexRecord::new(0, vec![-0.0], "neg.txt", "negative zero"),
            IndexRecord::new(1, vec![0.0], "pos.txt", "positive zero"),
        ]);

        let ranked = rank(&[1.0], &index, None);
        assert_eq!(ranked.iter().map(|r| r.row).collect::<Vec<_>>(), vec![0, 1]);
        assert!(ranked.iter().all(|r| r.score.is_sign_positive()));

        let index = VectorIndex::new(vec![
            IndexRecord::new(0, vec![0.0], "a.txt", "a"),
            IndexRecord::new(1, vec![0.0], "b.txt", "b"),
            IndexRecord::new(2, vec![-0.0], "c.txt", "c"),
        ]);
        let ranked = rank(&[-1.0], &index, None);
        assert_eq!(ranked.iter().map(|r| r.row).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_rank_scores_non_increasing() {
        let index = VectorIndex::new(
            (0..20)
                .map(|i| IndexRecord::new(i, vec![(i as f32 * 7.0) % 5.0, 1.0], "f.txt", "t"))
                .collect(),
        );
        let ranked = rank(&[1.0, -0.5], &index, None);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_threshold_excludes_low_scores() {
        let index = VectorIndex::new(vec![
            IndexRecord::new(0, vec![0.4], "a.txt", "weak"),
            IndexRecord::new(1, vec![0.7], "b.txt", "strong"),
        ]);

        let ranked = rank(&[1.0], &index, Some(0.5));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].row, 1);
    }

    #[test]
    fn test_context_keeps_first_entry_over_budget() {
        let index = two_record_index();
        let ranked = rank(&[1.0, 0.0], &index, None);
        assert_eq!(
            build_context(&ranked, &index, 8, 5),
            "- [a.txt] cats are mammals\n\n"
        );
    }

    #[test]
    fn test_context_is_greedy_not_packed() {
        let index = VectorIndex::new(vec![
            IndexRecord::new(0, vec![0.9], "a", "short"),
            IndexRecord::new(1, vec![0.8], "b", "a much longer chunk of text"),
            IndexRecord::new(2, vec![0.7], "c", "tiny"),
        ]);
        let ranked = rank(&[1.0], &index, None);

        let first = "- [a] short\n\n".len();
        let context = build_context(&ranked, &index, 8, first + 12);
        assert_eq!(context, "- [a] short\n\n");
    }

    #[test]
    fn test_context_counts_characters_not_bytes() {
        let index = VectorIndex::new(vec![
            IndexRecord::new(0, vec![0.9], "a", "ก"),
            IndexRecord::new(1, vec![0.8], "b", "ข"),
        ]);
        let ranked = rank(&[1.0], &index, None);

        let one = "- [a] ก\n\n".chars().count();
        let context = build_context(&ranked, &index, 8, one * 2);
        assert_eq!(context, "- [a] ก\n\n- [b] ข\n\n");
    }

    #[test]
    fn test_context_respects_top_k_and_empty_input() {
        let index = two_record_index();
        let ranked = rank(&[1.0, 1.0], &index, None);
        assert_eq!(build_context(&ranked, &index, 1, 10_000).matches("- [").count(), 1);
        assert_eq!(build_context(&[], &index, 8, 10_000), "");
    }
}
