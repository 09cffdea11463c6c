use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::application::services::Embedder;
use crate::domain::{
    chunk_document, normalize_whitespace, ports::IndexWriter, ChunkingPolicy, DomainError,
    IndexRecord,
};

/// File extensions picked up by a build, compared case-insensitively.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub chunks: usize,
}

pub struct IndexService {
    embedder: Embedder,
    policy: ChunkingPolicy,
}

impl IndexService {
    pub fn new(embedder: Embedder, policy: ChunkingPolicy) -> Self {
        Self { embedder, policy }
    }

    /// Chunks and embeds every accepted document under `doc_root`.
    ///
    /// Ids start at 0 and are shared across files. The build is not
    /// transactional: records appended before a failure stay in `writer`.
    #[instrument(skip(self, writer), fields(root = %doc_root.display()))]
    pub async fn build_index(
        &self,
        doc_root: &Path,
        writer: &mut dyn IndexWriter,
    ) -> Result<IndexStats, DomainError> {
        let mut stats = IndexStats::default();
        let mut next_id: u64 = 0;

        for path in discover_documents(doc_root)? {
            let raw = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable document");
                    continue;
                }
            };

            let text = normalize_whitespace(&String::from_utf8_lossy(&raw));
            if text.is_empty() {
                debug!(path = %path.display(), "skipping empty document");
                continue;
            }

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            stats.files += 1;

            for chunk in chunk_document(&filename, &text, self.policy) {
                let embedding = self.embedder.embed_passage(&chunk.text).await.map_err(|e| {
                    warn!(path = %path.display(), error = %e, "embedding failed");
                    e
                })?;

                writer.append(&IndexRecord::new(next_id, embedding, chunk.source, chunk.text))?;
                next_id += 1;
                stats.chunks += 1;
            }
        }

        writer.flush()?;
        info!(files = stats.files, chunks = stats.chunks, "index built");
        Ok(stats)
    }
}

/// Recursively lists accepted documents under `root`, sorted by path.
pub fn discover_documents(root: &Path) -> Result<Vec<PathBuf>, DomainError> {
    let mut pending = vec![root.to_path_buf()];
    let mut found = Vec::new();

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();

            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if is_accepted(&path) && std::fs::metadata(&path).is_ok_and(|m| m.is_file()) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}
