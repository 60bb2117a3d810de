//! Per-article abstract analysis and literature review composition.
//!
//! Summarisation itself is delegated to an [`AbstractAnalyzer`]; a hosted
//! language model would implement it outside this crate. [`ExtractiveAnalyzer`]
//! is a local implementation that picks sentences straight from the abstract.

mod review;

pub use review::{LiteratureReview, ReviewError, REVIEW_FALLBACK_TOPIC};

use async_trait::async_trait;
use serde::Serialize;

use crate::models::Article;

/// Analysis failures for a single abstract
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),

    #[error("Analysis failed: {0}")]
    Failed(String),
}

/// Produces text derived from one abstract
#[async_trait]
pub trait AbstractAnalyzer: Send + Sync {
    /// Short summary of the abstract
    async fn summarize(&self, abstract_text: &str) -> Result<String, AnalysisError>;

    /// Key findings, methodology and implications
    async fn analyze(&self, abstract_text: &str) -> Result<String, AnalysisError>;
}

/// An article with the analyzer's output, when there was any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub summary: Option<String>,
    pub analysis: Option<String>,
}

impl AnnotatedArticle {
    pub fn unannotated(article: Article) -> Self {
        Self {
            article,
            summary: None,
            analysis: None,
        }
    }
}

/// Run `analyzer` over every article that has an abstract.
///
/// Articles are processed in order. A failed call leaves that article's field
/// empty and does not affect the others.
pub async fn annotate(
    articles: Vec<Article>,
    analyzer: &dyn AbstractAnalyzer,
) -> Vec<AnnotatedArticle> {
    let mut annotated = Vec::with_capacity(articles.len());
    for article in articles {
        if !article.has_abstract() {
            annotated.push(AnnotatedArticle::unannotated(article));
            continue;
        }

        let summary = match analyzer.summarize(article.abstract_text()).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(pmid = article.pmid(), error = %e, "Summary failed");
                None
            }
        };
        let analysis = match analyzer.analyze(article.abstract_text()).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!(pmid = article.pmid(), error = %e, "Analysis failed");
                None
            }
        };

        annotated.push(AnnotatedArticle {
            article,
            summary,
            analysis,
        });
    }
    annotated
}

/// Sentence-picking analyzer that needs no external service.
///
/// The summary is the first sentence. The analysis is the labelled results and
/// conclusions sections when the abstract is structured, otherwise its last
/// sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveAnalyzer;

const FINDING_LABELS: [&str; 4] = ["RESULTS", "FINDINGS", "CONCLUSION", "CONCLUSIONS"];

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        let next = text[i + c.len_utf8()..].chars().next();
        if matches!(c, '.' | '!' | '?') && next.map_or(true, char::is_whitespace) {
            let sentence = text[start..i + c.len_utf8()].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = i + c.len_utf8();
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}

#[async_trait]
impl AbstractAnalyzer for ExtractiveAnalyzer {
    async fn summarize(&self, abstract_text: &str) -> Result<String, AnalysisError> {
        let first_line = abstract_text.lines().next().unwrap_or_default();
        // drop a leading "LABEL: " from structured abstracts
        let body = match first_line.split_once(": ") {
            Some((label, rest)) if label.chars().all(|c| c.is_uppercase() || c == ' ') => rest,
            _ => first_line,
        };
        sentences(body)
            .first()
            .map(|s| s.to_string())
            .ok_or_else(|| AnalysisError::Failed("abstract has no sentences".to_string()))
    }

    async fn analyze(&self, abstract_text: &str) -> Result<String, AnalysisError> {
        let findings: Vec<&str> = abstract_text
            .lines()
            .filter(|line| {
                line.split_once(':').is_some_and(|(label, _)| {
                    FINDING_LABELS.contains(&label.trim().to_uppercase().as_str())
                })
            })
            .collect();
        if !findings.is_empty() {
            return Ok(findings.join("\n"));
        }

        sentences(abstract_text)
            .last()
            .map(|s| s.to_string())
            .ok_or_else(|| AnalysisError::Failed("abstract has no sentences".to_string()))
    }
}
