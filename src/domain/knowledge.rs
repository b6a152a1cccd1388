//! Knowledge base search
//!
//! Ingests plain-text policy documents from a directory, splits them into
//! overlapping word-window chunks (respecting section dividers), and
//! answers relevance queries over the resulting index. The index is built
//! once at process startup and shared read-only across sessions.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use xxhash_rust::xxh3::xxh3_64;

/// Target words per chunk.
const CHUNK_SIZE: usize = 400;

/// Words of overlap between adjacent chunks.
const CHUNK_OVERLAP: usize = 80;

/// Chunks returned per query.
pub const TOP_K: usize = 3;

/// Minimum fraction of query terms a chunk must contain to count as
/// relevant.
const MIN_COVERAGE: f32 = 0.34;

/// Section dividers used inside the policy documents.
static SECTION_DIVIDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\u{2501}{10,}").expect("valid divider regex"));

/// Errors raised while building the index.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One indexed chunk of a source document.
#[derive(Debug, Clone)]
pub struct KnowledgeChunk {
    pub id: u64,
    pub source: String,
    pub text: String,
    pub chunk_n: usize,
    terms: HashSet<String>,
}

/// Result of a knowledge base query, shaped for the voice agent.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub answer: String,
    pub sources: Vec<String>,
}

/// The searchable document index.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    chunks: Vec<KnowledgeChunk>,
}

impl KnowledgeBase {
    /// Ingest every `.txt` file under `dir`.
    ///
    /// A missing directory yields an empty index with a warning rather
    /// than a startup failure; searches then answer that no information
    /// is available.
    pub fn build(dir: &Path) -> Result<Self, KnowledgeError> {
        if !dir.is_dir() {
            warn!(
                "Knowledge directory {} does not exist, index will be empty",
                dir.display()
            );
            return Ok(Self::default());
        }

        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| KnowledgeError::Io {
                path: dir.display().to_string(),
                source: e,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        paths.sort();

        let mut chunks = Vec::new();
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|e| KnowledgeError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let source = path
                .file_stem()
                .map(|stem| title_case(&stem.to_string_lossy()))
                .unwrap_or_else(|| "Document".to_string());

            let doc_chunks = split_into_chunks(text.trim(), &source);
            info!(
                "Indexed {}: {} chunks",
                path.display(),
                doc_chunks.len()
            );
            chunks.extend(doc_chunks);
        }

        info!("Knowledge index ready: {} chunks", chunks.len());
        Ok(Self { chunks })
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Answer a relevance query with up to `top_k` chunks.
    pub fn search(&self, query: &str, top_k: usize) -> SearchResponse {
        if self.chunks.is_empty() {
            return SearchResponse {
                success: false,
                answer: "The knowledge base is empty. I can still help you file a complaint \
                         directly."
                    .to_string(),
                sources: Vec::new(),
            };
        }

        let query_terms: Vec<String> = tokenize(query);
        if query_terms.is_empty() {
            return SearchResponse {
                success: false,
                answer: "I couldn't make out a question to look up.".to_string(),
                sources: Vec::new(),
            };
        }

        let mut scored: Vec<(f32, &KnowledgeChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (coverage(&query_terms, &chunk.terms), chunk))
            .filter(|(score, _)| *score >= MIN_COVERAGE)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        if scored.is_empty() {
            return SearchResponse {
                success: false,
                answer: "I couldn't find specific policy information about that. \
                         I can still help you file a complaint directly."
                    .to_string(),
                sources: Vec::new(),
            };
        }

        let mut sources: Vec<String> = Vec::new();
        for (_, chunk) in &scored {
            if !sources.contains(&chunk.source) {
                sources.push(chunk.source.clone());
            }
        }

        let answer = scored
            .iter()
            .map(|(_, chunk)| format!("[From: {}]\n{}", chunk.source, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        info!(
            "Knowledge query matched {} chunks from {:?}",
            scored.len(),
            sources
        );

        SearchResponse {
            success: true,
            answer,
            sources,
        }
    }
}

/// Fraction of query terms present in the chunk.
fn coverage(query_terms: &[String], chunk_terms: &HashSet<String>) -> f32 {
    let matched = query_terms
        .iter()
        .filter(|term| chunk_terms.contains(*term))
        .count();
    matched as f32 / query_terms.len() as f32
}

/// Lowercased content words of at least three letters.
fn tokenize(text: &str) -> Vec<String> {
    const STOPWORDS: &[&str] = &[
        "the", "and", "for", "are", "was", "what", "when", "where", "how", "who", "can",
        "does", "this", "that", "with", "about",
    ];

    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .map(|word| word.to_lowercase())
        .filter(|word| word.len() >= 3 && !STOPWORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Split text into overlapping word-window chunks, keeping sections
/// delimited by divider lines intact when they fit.
fn split_into_chunks(text: &str, source: &str) -> Vec<KnowledgeChunk> {
    let mut section_texts: Vec<String> = Vec::new();

    for section in SECTION_DIVIDER.split(text) {
        let section = section.trim();
        if section.is_empty() {
            continue;
        }
        let words: Vec<&str> = section.split_whitespace().collect();
        if words.len() <= CHUNK_SIZE {
            section_texts.push(section.to_string());
        } else {
            // Section too long for one chunk; fall back to word windows
            let mut i = 0;
            while i < words.len() {
                let end = (i + CHUNK_SIZE).min(words.len());
                section_texts.push(words[i..end].join(" "));
                if end == words.len() {
                    break;
                }
                i += CHUNK_SIZE - CHUNK_OVERLAP;
            }
        }
    }

    section_texts
        .into_iter()
        .enumerate()
        .map(|(idx, content)| {
            let prefix: String = content.chars().take(40).collect();
            let id = xxh3_64(format!("{source}_{idx}_{prefix}").as_bytes());
            let terms = tokenize(&content).into_iter().collect();
            KnowledgeChunk {
                id,
                source: source.to_string(),
                text: content,
                chunk_n: idx,
                terms,
            }
        })
        .collect()
}

/// "emergency_procedures" -> "Emergency Procedures"
fn title_case(stem: &str) -> String {
    stem.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
