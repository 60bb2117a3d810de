//! Search criteria: the validated, immutable description of one PubMed search.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Earliest publication year PubMed date filters accept.
pub const MIN_YEAR: i32 = 1800;

/// Largest number of records a single search may request.
pub const MAX_RESULTS_LIMIT: usize = 10_000;

/// Default result cap when the caller does not set one.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Current calendar year (UTC), the upper bound for year filters.
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Field restriction applied to the keyword clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    AllFields,
    Title,
    Abstract,
    TitleAbstract,
    Author,
    Journal,
    MeshTerms,
    Affiliation,
    TextWord,
}

impl SearchField {
    /// Field tag as written inside `[...]` in the PubMed query grammar
    pub fn tag(&self) -> &'static str {
        match self {
            SearchField::AllFields => "All Fields",
            SearchField::Title => "Title",
            SearchField::Abstract => "Abstract",
            SearchField::TitleAbstract => "Title/Abstract",
            SearchField::Author => "Author",
            SearchField::Journal => "Journal",
            SearchField::MeshTerms => "MeSH Terms",
            SearchField::Affiliation => "Affiliation",
            SearchField::TextWord => "Text Word",
        }
    }
}

/// Publication type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationType {
    MetaAnalysis,
    SystematicReview,
    ClinicalTrial,
    ClinicalTrialPhase1,
    ClinicalTrialPhase2,
    ClinicalTrialPhase3,
    ClinicalTrialPhase4,
    RandomizedControlledTrial,
    ObservationalStudy,
    Review,
    CaseReports,
    ComparativeStudy,
    PracticeGuideline,
    JournalArticle,
    Editorial,
    Letter,
    Comment,
}

impl PublicationType {
    /// Publication type name as indexed by PubMed
    pub fn name(&self) -> &'static str {
        match self {
            PublicationType::MetaAnalysis => "Meta-Analysis",
            PublicationType::SystematicReview => "Systematic Review",
            PublicationType::ClinicalTrial => "Clinical Trial",
            PublicationType::ClinicalTrialPhase1 => "Clinical Trial, Phase I",
            PublicationType::ClinicalTrialPhase2 => "Clinical Trial, Phase II",
            PublicationType::ClinicalTrialPhase3 => "Clinical Trial, Phase III",
            PublicationType::ClinicalTrialPhase4 => "Clinical Trial, Phase IV",
            PublicationType::RandomizedControlledTrial => "Randomized Controlled Trial",
            PublicationType::ObservationalStudy => "Observational Study",
            PublicationType::Review => "Review",
            PublicationType::CaseReports => "Case Reports",
            PublicationType::ComparativeStudy => "Comparative Study",
            PublicationType::PracticeGuideline => "Practice Guideline",
            PublicationType::JournalArticle => "Journal Article",
            PublicationType::Editorial => "Editorial",
            PublicationType::Letter => "Letter",
            PublicationType::Comment => "Comment",
        }
    }
}

/// Article language filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Japanese,
    French,
    German,
    Chinese,
    Spanish,
    Italian,
    Russian,
    Korean,
    Portuguese,
}

impl Language {
    /// Language name accepted by the `[Language]` tag
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Japanese => "japanese",
            Language::French => "french",
            Language::German => "german",
            Language::Chinese => "chinese",
            Language::Spanish => "spanish",
            Language::Italian => "italian",
            Language::Russian => "russian",
            Language::Korean => "korean",
            Language::Portuguese => "portuguese",
        }
    }
}

/// Result ordering requested from the discovery endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Date,
    Journal,
    Author,
    Title,
}

impl SortBy {
    /// Value of the E-utilities `sort` parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Date => "pub_date",
            SortBy::Journal => "JournalName",
            SortBy::Author => "Author",
            SortBy::Title => "title",
        }
    }
}

/// Reasons a [`SearchCriteria`] cannot be constructed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("keywords must not be empty")]
    EmptyKeywords,

    #[error("{field} {year} is outside {min}..={max}")]
    YearOutOfRange {
        field: &'static str,
        year: i32,
        min: i32,
        max: i32,
    },

    #[error("end_year {end} must be greater than or equal to start_year {start}")]
    YearOrder { start: i32, end: i32 },

    #[error("max_results {0} is outside 1..=10000")]
    MaxResultsOutOfRange(usize),

    #[error("MeSH term {0:?} must be at least 2 characters long")]
    MeshTermTooShort(String),
}

/// A validated PubMed search request.
///
/// Built once through [`SearchCriteriaBuilder`] and never mutated afterwards.
/// Deserialising goes through the builder, so payloads from a request layer are
/// validated the same way as programmatic construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SearchCriteriaBuilder")]
pub struct SearchCriteria {
    keywords: String,
    publication_types: Vec<PublicationType>,
    mesh_terms: Vec<String>,
    languages: Vec<Language>,
    authors: Vec<String>,
    journals: Vec<String>,
    affiliations: Vec<String>,
    search_fields: Vec<SearchField>,
    exclude_keywords: Vec<String>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    min_citations: Option<u32>,
    free_full_text: bool,
    humans_only: bool,
    max_results: usize,
    sort_by: SortBy,
    include_mesh_subheadings: bool,
}

impl SearchCriteria {
    /// Start building criteria for the given free-text keywords
    pub fn builder(keywords: impl Into<String>) -> SearchCriteriaBuilder {
        SearchCriteriaBuilder::new(keywords)
    }

    /// Shorthand for criteria with keywords only and default settings
    pub fn new(keywords: impl Into<String>) -> Result<Self, ValidationError> {
        Self::builder(keywords).build()
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn publication_types(&self) -> &[PublicationType] {
        &self.publication_types
    }

    pub fn mesh_terms(&self) -> &[String] {
        &self.mesh_terms
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn journals(&self) -> &[String] {
        &self.journals
    }

    pub fn affiliations(&self) -> &[String] {
        &self.affiliations
    }

    pub fn search_fields(&self) -> &[SearchField] {
        &self.search_fields
    }

    pub fn exclude_keywords(&self) -> &[String] {
        &self.exclude_keywords
    }

    pub fn start_year(&self) -> Option<i32> {
        self.start_year
    }

    pub fn end_year(&self) -> Option<i32> {
        self.end_year
    }

    pub fn min_citations(&self) -> Option<u32> {
        self.min_citations
    }

    pub fn free_full_text(&self) -> bool {
        self.free_full_text
    }

    pub fn humans_only(&self) -> bool {
        self.humans_only
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn include_mesh_subheadings(&self) -> bool {
        self.include_mesh_subheadings
    }
}

impl TryFrom<SearchCriteriaBuilder> for SearchCriteria {
    type Error = ValidationError;

    fn try_from(builder: SearchCriteriaBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

/// Builder for [`SearchCriteria`]; all validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteriaBuilder {
    keywords: String,
    publication_types: Vec<PublicationType>,
    mesh_terms: Vec<String>,
    languages: Vec<Language>,
    authors: Vec<String>,
    journals: Vec<String>,
    affiliations: Vec<String>,
    search_fields: Vec<SearchField>,
    exclude_keywords: Vec<String>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    min_citations: Option<u32>,
    free_full_text: bool,
    humans_only: bool,
    max_results: Option<usize>,
    sort_by: SortBy,
    include_mesh_subheadings: bool,
}

impl SearchCriteriaBuilder {
    /// Create a builder for the given keywords
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Default::default()
        }
    }

    /// Add a publication type filter
    pub fn publication_type(mut self, publication_type: PublicationType) -> Self {
        self.publication_types.push(publication_type);
        self
    }

    /// Add a MeSH descriptor filter
    pub fn mesh_term(mut self, term: impl Into<String>) -> Self {
        self.mesh_terms.push(term.into());
        self
    }

    /// Add a language filter
    pub fn language(mut self, language: Language) -> Self {
        self.languages.push(language);
        self
    }

    /// Add an author filter
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Add a journal filter
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.journals.push(journal.into());
        self
    }

    /// Add an affiliation filter
    pub fn affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliations.push(affiliation.into());
        self
    }

    /// Restrict the keywords to a field
    pub fn search_field(mut self, field: SearchField) -> Self {
        self.search_fields.push(field);
        self
    }

    /// Exclude records matching a keyword
    pub fn exclude_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.exclude_keywords.push(keyword.into());
        self
    }

    /// Set the first publication year (inclusive)
    pub fn start_year(mut self, year: i32) -> Self {
        self.start_year = Some(year);
        self
    }

    /// Set the last publication year (inclusive)
    pub fn end_year(mut self, year: i32) -> Self {
        self.end_year = Some(year);
        self
    }

    /// Require a minimum citation count
    pub fn min_citations(mut self, count: u32) -> Self {
        self.min_citations = Some(count);
        self
    }

    /// Only include free full text records
    pub fn free_full_text(mut self, enabled: bool) -> Self {
        self.free_full_text = enabled;
        self
    }

    /// Only include human studies
    pub fn humans_only(mut self, enabled: bool) -> Self {
        self.humans_only = enabled;
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Set sort order
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Match MeSH terms without exploding to narrower headings
    pub fn include_mesh_subheadings(mut self, enabled: bool) -> Self {
        self.include_mesh_subheadings = enabled;
        self
    }

    /// Validate and freeze the criteria
    pub fn build(self) -> Result<SearchCriteria, ValidationError> {
        self.build_for_year(current_year())
    }

    fn build_for_year(self, this_year: i32) -> Result<SearchCriteria, ValidationError> {
        let keywords = self.keywords.trim().to_string();
        if keywords.is_empty() {
            return Err(ValidationError::EmptyKeywords);
        }

        let max_results = self.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if max_results == 0 || max_results > MAX_RESULTS_LIMIT {
            return Err(ValidationError::MaxResultsOutOfRange(max_results));
        }

        check_year("start_year", self.start_year, this_year)?;
        check_year("end_year", self.end_year, this_year)?;
        if let (Some(start), Some(end)) = (self.start_year, self.end_year) {
            if start > end {
                return Err(ValidationError::YearOrder { start, end });
            }
        }

        let mesh_terms = clean_terms(self.mesh_terms);
        if let Some(short) = mesh_terms.iter().find(|t| t.chars().count() < 2) {
            return Err(ValidationError::MeshTermTooShort(short.clone()));
        }

        Ok(SearchCriteria {
            keywords,
            publication_types: dedup(self.publication_types),
            mesh_terms,
            languages: dedup(self.languages),
            authors: clean_terms(self.authors),
            journals: clean_terms(self.journals),
            affiliations: clean_terms(self.affiliations),
            search_fields: dedup(self.search_fields),
            exclude_keywords: clean_terms(self.exclude_keywords),
            start_year: self.start_year,
            end_year: self.end_year,
            min_citations: self.min_citations,
            free_full_text: self.free_full_text,
            humans_only: self.humans_only,
            max_results,
            sort_by: self.sort_by,
            include_mesh_subheadings: self.include_mesh_subheadings,
        })
    }
}

fn check_year(
    field: &'static str,
    year: Option<i32>,
    this_year: i32,
) -> Result<(), ValidationError> {
    match year {
        Some(year) if !(MIN_YEAR..=this_year).contains(&year) => {
            Err(ValidationError::YearOutOfRange {
                field,
                year,
                min: MIN_YEAR,
                max: this_year,
            })
        }
        _ => Ok(()),
    }
}

/// Trim entries, drop blanks and collapse duplicates (first occurrence wins)
fn clean_terms(terms: Vec<String>) -> Vec<String> {
    dedup(
        terms
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    )
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let criteria = SearchCriteria::new("  sepsis  ").unwrap();
        assert_eq!(criteria.keywords(), "sepsis");
        assert_eq!(criteria.max_results(), DEFAULT_MAX_RESULTS);
        assert_eq!(criteria.sort_by(), SortBy::Relevance);
        assert!(criteria.min_citations().is_none());
        assert!(!criteria.free_full_text());
    }

    #[test]
    fn test_full_criteria() {
        let criteria = SearchCriteria::builder("COVID-19 treatment")
            .publication_type(PublicationType::MetaAnalysis)
            .start_year(2022)
            .language(Language::English)
            .search_field(SearchField::Title)
            .search_field(SearchField::Abstract)
            .max_results(10)
            .sort_by(SortBy::Date)
            .build()
            .unwrap();

        assert_eq!(criteria.keywords(), "COVID-19 treatment");
        assert_eq!(criteria.start_year(), Some(2022));
        assert_eq!(criteria.max_results(), 10);
        assert_eq!(
            criteria.search_fields(),
            &[SearchField::Title, SearchField::Abstract]
        );
    }

    #[test]
    fn test_empty_keywords_rejected() {
        assert_eq!(
            SearchCriteria::new("   ").unwrap_err(),
            ValidationError::EmptyKeywords
        );
    }

    #[test]
    fn test_year_order_rejected() {
        let err = SearchCriteria::builder("test")
            .start_year(2020)
            .end_year(2019)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::YearOrder { start: 2020, end: 2019 });
    }

    #[test]
    fn test_equal_years_accepted() {
        let criteria = SearchCriteria::builder("test")
            .start_year(2020)
            .end_year(2020)
            .build()
            .unwrap();
        assert_eq!(criteria.start_year(), criteria.end_year());
    }

    #[test]
    fn test_year_bounds() {
        let too_early = SearchCriteria::builder("test").start_year(1799).build();
        assert!(matches!(
            too_early,
            Err(ValidationError::YearOutOfRange { field: "start_year", .. })
        ));

        let future = SearchCriteria::builder("test").end_year(3000).build();
        assert!(matches!(
            future,
            Err(ValidationError::YearOutOfRange { field: "end_year", .. })
        ));

        let err = SearchCriteriaBuilder::new("test")
            .start_year(2025)
            .build_for_year(2024)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::YearOutOfRange {
                field: "start_year",
                year: 2025,
                min: MIN_YEAR,
                max: 2024
            }
        );
    }

    #[test]
    fn test_max_results_bounds() {
        assert_eq!(
            SearchCriteria::builder("test").max_results(0).build().unwrap_err(),
            ValidationError::MaxResultsOutOfRange(0)
        );
        assert_eq!(
            SearchCriteria::builder("test")
                .max_results(10_001)
                .build()
                .unwrap_err(),
            ValidationError::MaxResultsOutOfRange(10_001)
        );
        assert!(SearchCriteria::builder("test").max_results(1).build().is_ok());
        assert!(SearchCriteria::builder("test")
            .max_results(10_000)
            .build()
            .is_ok());
    }

    #[test]
    fn test_short_mesh_term_rejected() {
        let err = SearchCriteria::builder("test")
            .mesh_term(" a ")
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::MeshTermTooShort("a".to_string()));
    }

    #[test]
    fn test_lists_are_cleaned() {
        let criteria = SearchCriteria::builder("test")
            .author("Smith J")
            .author("  ")
            .author(" Smith J ")
            .author("Doe A")
            .language(Language::English)
            .language(Language::English)
            .build()
            .unwrap();

        assert_eq!(criteria.authors(), &["Smith J", "Doe A"]);
        assert_eq!(criteria.languages(), &[Language::English]);
    }

    #[test]
    fn test_deserialize_validates() {
        let criteria: SearchCriteria = serde_json::from_str(
            r#"{"keywords": "sepsis", "max_results": 5, "search_fields": ["title", "abstract"]}"#,
        )
        .unwrap();
        assert_eq!(criteria.max_results(), 5);
        assert_eq!(criteria.search_fields().len(), 2);

        let invalid: Result<SearchCriteria, _> =
            serde_json::from_str(r#"{"keywords": "sepsis", "max_results": 0}"#);
        assert!(invalid.is_err());
    }

    #[test]
    fn test_sort_params() {
        assert_eq!(SortBy::Relevance.as_param(), "relevance");
        assert_eq!(SortBy::Date.as_param(), "pub_date");
        assert_eq!(SortBy::Journal.as_param(), "JournalName");
    }
}
