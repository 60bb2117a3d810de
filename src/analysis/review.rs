//! Markdown literature review built from annotated search results.

use serde::Serialize;
use std::collections::BTreeSet;

use super::AnnotatedArticle;

/// Topic used when the first article carries no MeSH descriptor
pub const REVIEW_FALLBACK_TOPIC: &str = "Medical Research";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("cannot compose a review from zero articles")]
    NoArticles,
}

/// A composed review document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiteratureReview {
    pub title: String,
    /// Markdown body
    pub content: String,
    /// Article summaries joined by blank lines
    pub summary: String,
    /// Sorted union of article keywords
    pub keywords: Vec<String>,
    /// PMIDs in result order
    pub source_articles: Vec<String>,
}

impl LiteratureReview {
    pub fn compose(articles: &[AnnotatedArticle]) -> Result<Self, ReviewError> {
        let first = articles.first().ok_or(ReviewError::NoArticles)?;

        let topic = first
            .article
            .mesh_terms()
            .first()
            .map(|m| m.descriptor.as_str())
            .unwrap_or(REVIEW_FALLBACK_TOPIC);

        let keywords: BTreeSet<&str> = articles
            .iter()
            .flat_map(|a| a.article.keywords())
            .map(String::as_str)
            .collect();

        let summary = articles
            .iter()
            .filter_map(|a| a.summary.as_deref())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(Self {
            title: format!("Literature Review: {}", topic),
            content: render(articles),
            summary,
            keywords: keywords.into_iter().map(str::to_string).collect(),
            source_articles: articles
                .iter()
                .map(|a| a.article.pmid().to_string())
                .collect(),
        })
    }
}

fn render(articles: &[AnnotatedArticle]) -> String {
    let mut out = String::from("# Literature Review\n");

    for (i, annotated) in articles.iter().enumerate() {
        let article = &annotated.article;
        let authors = article
            .authors()
            .iter()
            .map(|a| a.display_name())
            .collect::<Vec<_>>()
            .join(", ");
        let year = article
            .publication_date()
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n.d.".to_string());

        out.push_str(&format!("\n## {}. {}\n\n", i + 1, article.title()));
        out.push_str(&format!("**Authors**: {}\n\n", authors));
        out.push_str(&format!("**Journal**: {} ({})\n\n", article.journal(), year));
        out.push_str(&format!("**PMID**: {}\n", article.pmid()));

        if let Some(summary) = &annotated.summary {
            out.push_str(&format!("\n### Summary\n\n{}\n", summary));
        }
        if let Some(analysis) = &annotated.analysis {
            out.push_str(&format!("\n### Analysis\n\n{}\n", analysis));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleBuilder, Author, MeshTerm, PublicationDate};

    fn annotated(pmid: &str, mesh: Option<&str>, keywords: &[&str]) -> AnnotatedArticle {
        let mut builder = ArticleBuilder::new()
            .pmid(pmid)
            .title(format!("Paper {}", pmid))
            .journal("BMJ")
            .author(Author::new("Doe").unwrap().fore_name("Ann"))
            .author(Author::new("Roe").unwrap())
            .publication_date(PublicationDate {
                year: Some(2021),
                month: None,
                day: None,
            });
        if let Some(descriptor) = mesh {
            builder = builder.mesh_term(MeshTerm {
                descriptor: descriptor.to_string(),
                qualifiers: Vec::new(),
            });
        }
        for keyword in keywords {
            builder = builder.keyword(*keyword);
        }
        AnnotatedArticle {
            article: builder.build().unwrap(),
            summary: Some(format!("Summary {}", pmid)),
            analysis: Some(format!("Analysis {}", pmid)),
        }
    }

    #[test]
    fn test_compose_review() {
        let articles = vec![
            annotated("1", Some("Sepsis"), &["shock", "antibiotics"]),
            annotated("2", None, &["antibiotics", "icu"]),
        ];

        let review = LiteratureReview::compose(&articles).unwrap();
        assert_eq!(review.title, "Literature Review: Sepsis");
        assert_eq!(review.summary, "Summary 1\n\nSummary 2");
        assert_eq!(review.keywords, vec!["antibiotics", "icu", "shock"]);
        assert_eq!(review.source_articles, vec!["1", "2"]);

        assert!(review.content.starts_with("# Literature Review\n"));
        assert!(review.content.contains("## 1. Paper 1\n"));
        assert!(review.content.contains("## 2. Paper 2\n"));
        assert!(review.content.contains("**Authors**: Ann Doe, Roe\n"));
        assert!(review.content.contains("**Journal**: BMJ (2021)\n"));
        assert!(review.content.contains("**PMID**: 2\n"));
        assert!(review.content.contains("### Summary\n\nSummary 1\n"));
        assert!(review.content.contains("### Analysis\n\nAnalysis 2\n"));
    }

    #[test]
    fn test_fallback_topic_and_missing_sections() {
        let mut article = annotated("5", None, &[]);
        article.summary = None;
        article.analysis = None;

        let review = LiteratureReview::compose(&[article]).unwrap();
        assert_eq!(review.title, "Literature Review: Medical Research");
        assert_eq!(review.summary, "");
        assert!(!review.content.contains("### Summary"));
    }

    #[test]
    fn test_review_from_extractive_annotations() {
        let article = ArticleBuilder::new()
            .pmid("42")
            .title("Steroids in septic shock")
            .abstract_text(
                "BACKGROUND: Steroids are debated.\nRESULTS: Shock resolved faster.",
            )
            .journal("Lancet")
            .build()
            .unwrap();

        let annotated = tokio_test::block_on(crate::analysis::annotate(
            vec![article],
            &crate::analysis::ExtractiveAnalyzer,
        ));
        let review = LiteratureReview::compose(&annotated).unwrap();

        assert_eq!(review.summary, "Steroids are debated.");
        assert!(review
            .content
            .contains("### Analysis\n\nRESULTS: Shock resolved faster.\n"));
        assert!(review.content.contains("**Journal**: Lancet (n.d.)\n"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            LiteratureReview::compose(&[]).unwrap_err(),
            ReviewError::NoArticles
        );
    }
}
