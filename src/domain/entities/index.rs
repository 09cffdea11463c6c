use serde::{Deserialize, Serialize};

use super::Embedding;

/// One persisted retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: u64,
    pub embedding: Embedding,
    pub filename: String,
    pub text: String,
}

impl IndexRecord {
    pub fn new(
        id: u64,
        embedding: impl Into<Embedding>,
        filename: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            embedding: embedding.into(),
            filename: filename.into(),
            text: text.into(),
        }
    }
}

/// A similarity score paired with a row position in the loaded index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedResult {
    pub score: f32,
    pub row: usize,
}

/// The loaded, immutable index. Rows keep file order.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    records: Vec<IndexRecord>,
}

impl VectorIndex {
    pub fn new(records: Vec<IndexRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&IndexRecord> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimension of the first record, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|r| r.embedding.dimension())
    }
}

impl From<Vec<IndexRecord>> for VectorIndex {
    fn from(records: Vec<IndexRecord>) -> Self {
        Self::new(records)
    }
}
