//! Article model: one extracted PubMed record.

use serde::{Deserialize, Serialize};

/// Title used when a record carries no `ArticleTitle`
pub const TITLE_PLACEHOLDER: &str = "Title not available";

/// Abstract used when a record carries no abstract sections
pub const ABSTRACT_PLACEHOLDER: &str = "Abstract not available";

/// Journal name used when a record carries no journal data
pub const JOURNAL_PLACEHOLDER: &str = "Journal not available";

/// Canonical per-article page on pubmed.ncbi.nlm.nih.gov
pub fn article_url(pmid: &str) -> String {
    format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid)
}

/// Per-record validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArticleError {
    #[error("record has no PMID")]
    MissingPmid,

    #[error("PMID {0:?} must contain only digits")]
    InvalidPmid(String),

    #[error("author last name must not be empty")]
    EmptyLastName,
}

/// An article author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub last_name: String,
    pub fore_name: Option<String>,
    pub affiliation: Option<String>,
}

impl Author {
    /// Create an author; the last name is required
    pub fn new(last_name: impl Into<String>) -> Result<Self, ArticleError> {
        let last_name = last_name.into();
        if last_name.trim().is_empty() {
            return Err(ArticleError::EmptyLastName);
        }
        Ok(Self {
            last_name,
            fore_name: None,
            affiliation: None,
        })
    }

    /// Set the given name
    pub fn fore_name(mut self, fore_name: impl Into<String>) -> Self {
        self.fore_name = Some(fore_name.into());
        self
    }

    /// Set the affiliation
    pub fn affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    /// "Fore Last", or just the last name
    pub fn display_name(&self) -> String {
        match &self.fore_name {
            Some(fore) => format!("{} {}", fore, self.last_name),
            None => self.last_name.clone(),
        }
    }
}

/// A MeSH heading: descriptor plus its qualifiers, in record order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTerm {
    pub descriptor: String,
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

/// Publication date; every component is optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PublicationDate {
    /// Render as `YYYY`, `YYYY-MM` or `YYYY-MM-DD` depending on what is known
    pub fn to_iso(&self) -> Option<String> {
        let year = self.year?;
        Some(match (self.month, self.day) {
            (Some(month), Some(day)) => format!("{:04}-{:02}-{:02}", year, month, day),
            (Some(month), None) => format!("{:04}-{:02}", year, month),
            _ => format!("{:04}", year),
        })
    }
}

/// A validated PubMed article.
///
/// The PMID is guaranteed to be all digits. Instances are produced by
/// [`ArticleBuilder::build`] and are plain values afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pmid: String,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: String,
    authors: Vec<Author>,
    mesh_terms: Vec<MeshTerm>,
    keywords: Vec<String>,
    doi: Option<String>,
    journal: String,
    journal_abbrev: Option<String>,
    publication_date: PublicationDate,
    url: Option<String>,
    citation_count: u32,
}

impl Article {
    pub fn pmid(&self) -> &str {
        &self.pmid
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn abstract_text(&self) -> &str {
        &self.abstract_text
    }

    /// Whether the record carried real abstract text
    pub fn has_abstract(&self) -> bool {
        !self.abstract_text.trim().is_empty() && self.abstract_text != ABSTRACT_PLACEHOLDER
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn mesh_terms(&self) -> &[MeshTerm] {
        &self.mesh_terms
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    pub fn journal(&self) -> &str {
        &self.journal
    }

    pub fn journal_abbrev(&self) -> Option<&str> {
        self.journal_abbrev.as_deref()
    }

    pub fn publication_date(&self) -> PublicationDate {
        self.publication_date
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn citation_count(&self) -> u32 {
        self.citation_count
    }

    /// Copy of this article carrying a looked-up citation count
    pub fn with_citation_count(mut self, count: u32) -> Self {
        self.citation_count = count;
        self
    }
}

/// Incremental builder for [`Article`].
///
/// Every field starts at its default; extraction fills in whatever the record
/// provides and [`build`](Self::build) validates once at the end.
#[derive(Debug, Clone, Default)]
pub struct ArticleBuilder {
    pmid: Option<String>,
    title: Option<String>,
    abstract_text: Option<String>,
    authors: Vec<Author>,
    mesh_terms: Vec<MeshTerm>,
    keywords: Vec<String>,
    doi: Option<String>,
    journal: Option<String>,
    journal_abbrev: Option<String>,
    publication_date: PublicationDate,
    citation_count: u32,
}

impl ArticleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the PMID
    pub fn pmid(mut self, pmid: impl Into<String>) -> Self {
        self.pmid = Some(pmid.into());
        self
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }

    /// Append an author
    pub fn author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    /// Append a MeSH heading
    pub fn mesh_term(mut self, term: MeshTerm) -> Self {
        self.mesh_terms.push(term);
        self
    }

    /// Append a keyword
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    /// Set the journal title
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    /// Set the journal abbreviation
    pub fn journal_abbrev(mut self, abbrev: impl Into<String>) -> Self {
        self.journal_abbrev = Some(abbrev.into());
        self
    }

    /// Set publication date
    pub fn publication_date(mut self, date: PublicationDate) -> Self {
        self.publication_date = date;
        self
    }

    /// Set citation count
    pub fn citation_count(mut self, count: u32) -> Self {
        self.citation_count = count;
        self
    }

    /// Validate the PMID and fill placeholders for missing text fields
    pub fn build(self) -> Result<Article, ArticleError> {
        let pmid = self
            .pmid
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or(ArticleError::MissingPmid)?;
        if !pmid.chars().all(|c| c.is_ascii_digit()) {
            return Err(ArticleError::InvalidPmid(pmid));
        }

        let url = Some(article_url(&pmid));

        Ok(Article {
            title: self.title.unwrap_or_else(|| TITLE_PLACEHOLDER.to_string()),
            abstract_text: self
                .abstract_text
                .unwrap_or_else(|| ABSTRACT_PLACEHOLDER.to_string()),
            authors: self.authors,
            mesh_terms: self.mesh_terms,
            keywords: self.keywords,
            doi: self.doi,
            journal: self
                .journal
                .unwrap_or_else(|| JOURNAL_PLACEHOLDER.to_string()),
            journal_abbrev: self.journal_abbrev,
            publication_date: self.publication_date,
            url,
            citation_count: self.citation_count,
            pmid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_builder() {
        let article = ArticleBuilder::new()
            .pmid("12345")
            .title("Test Paper")
            .author(Author::new("Smith").unwrap().fore_name("John"))
            .doi("10.1234/test.1234")
            .journal("Nature")
            .citation_count(42)
            .build()
            .unwrap();

        assert_eq!(article.pmid(), "12345");
        assert_eq!(article.title(), "Test Paper");
        assert_eq!(article.authors()[0].display_name(), "John Smith");
        assert_eq!(article.doi(), Some("10.1234/test.1234"));
        assert_eq!(article.url(), Some("https://pubmed.ncbi.nlm.nih.gov/12345/"));
        assert_eq!(article.citation_count(), 42);
    }

    #[test]
    fn test_placeholders() {
        let article = ArticleBuilder::new().pmid("1").build().unwrap();
        assert_eq!(article.title(), TITLE_PLACEHOLDER);
        assert_eq!(article.abstract_text(), ABSTRACT_PLACEHOLDER);
        assert_eq!(article.journal(), JOURNAL_PLACEHOLDER);
        assert!(!article.has_abstract());
        assert_eq!(article.citation_count(), 0);
    }

    #[test]
    fn test_pmid_validation() {
        assert_eq!(
            ArticleBuilder::new().build().unwrap_err(),
            ArticleError::MissingPmid
        );
        assert_eq!(
            ArticleBuilder::new().pmid("  ").build().unwrap_err(),
            ArticleError::MissingPmid
        );
        assert_eq!(
            ArticleBuilder::new().pmid("12a45").build().unwrap_err(),
            ArticleError::InvalidPmid("12a45".to_string())
        );
    }

    #[test]
    fn test_author_requires_last_name() {
        assert_eq!(Author::new(" ").unwrap_err(), ArticleError::EmptyLastName);
        assert_eq!(Author::new("Doe").unwrap().display_name(), "Doe");
    }

    #[test]
    fn test_with_citation_count() {
        let article = ArticleBuilder::new().pmid("7").build().unwrap();
        assert_eq!(article.with_citation_count(9).citation_count(), 9);
    }

    #[test]
    fn test_publication_date_iso() {
        let date = PublicationDate {
            year: Some(2024),
            month: Some(3),
            day: Some(7),
        };
        assert_eq!(date.to_iso().as_deref(), Some("2024-03-07"));
        assert_eq!(PublicationDate::default().to_iso(), None);
        assert_eq!(
            PublicationDate {
                year: Some(2020),
                month: None,
                day: Some(1)
            }
            .to_iso()
            .as_deref(),
            Some("2020")
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let article = ArticleBuilder::new()
            .pmid("99")
            .abstract_text("Body")
            .build()
            .unwrap();
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["pmid"], "99");
        assert_eq!(json["abstract"], "Body");
        assert_eq!(json["citation_count"], 0);
    }
}
