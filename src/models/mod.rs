//! Core data models for PubMed search requests and extracted articles.

mod article;
mod criteria;

pub use article::{
    article_url, Article, ArticleBuilder, ArticleError, Author, MeshTerm, PublicationDate,
    ABSTRACT_PLACEHOLDER, JOURNAL_PLACEHOLDER, TITLE_PLACEHOLDER,
};
pub use criteria::{
    current_year, Language, PublicationType, SearchCriteria, SearchCriteriaBuilder, SearchField,
    SortBy, ValidationError, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT, MIN_YEAR,
};
