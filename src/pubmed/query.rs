//! Compiles [`SearchCriteria`] into the PubMed query grammar.
//!
//! Clauses are emitted in a fixed order so the same criteria always produce the
//! same query string:
//!
//! 1. keywords (field-restricted or bare)
//! 2. exclusions
//! 3. MeSH terms
//! 4. publication types
//! 5. authors, journals, affiliations
//! 6. languages
//! 7. publication date range
//! 8. free full text, humans only
//!
//! Empty clauses are skipped and the rest are joined with `AND`.

use crate::models::{current_year, SearchCriteria, SearchField, MIN_YEAR};

const FREE_FULL_TEXT_FILTER: &str = "free full text[sb]";
const HUMANS_FILTER: &str = "\"Humans\"[MeSH Terms]";

/// Build the PubMed query string for `criteria`
pub fn compile(criteria: &SearchCriteria) -> String {
    compile_for_year(criteria, current_year())
}

/// Same as [`compile`] with an explicit year for an open-ended date range
pub fn compile_for_year(criteria: &SearchCriteria, this_year: i32) -> String {
    let clauses = [
        keyword_clause(criteria),
        exclusion_clause(criteria.exclude_keywords()),
        mesh_clause(criteria),
        any_of(
            criteria
                .publication_types()
                .iter()
                .map(|pt| quoted(pt.name(), "Publication Type")),
        ),
        any_of(criteria.authors().iter().map(|a| quoted(a, "Author"))),
        any_of(criteria.journals().iter().map(|j| quoted(j, "Journal"))),
        any_of(criteria.affiliations().iter().map(|a| quoted(a, "Affiliation"))),
        any_of(
            criteria
                .languages()
                .iter()
                .map(|l| format!("{}[Language]", l.name())),
        ),
        date_clause(criteria, this_year),
        criteria
            .free_full_text()
            .then(|| FREE_FULL_TEXT_FILTER.to_string()),
        criteria.humans_only().then(|| HUMANS_FILTER.to_string()),
    ];

    clauses
        .into_iter()
        .flatten()
        .filter(|clause| !clause.is_empty())
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn keyword_clause(criteria: &SearchCriteria) -> Option<String> {
    let keywords = criteria.keywords();
    // MeSH restrictions are expressed by the MeSH clause, not the keyword clause
    let restricted = any_of(
        criteria
            .search_fields()
            .iter()
            .filter(|field| **field != SearchField::MeshTerms)
            .map(|field| format!("{}[{}]", keywords, field.tag())),
    );
    Some(restricted.unwrap_or_else(|| format!("({})", keywords)))
}

fn exclusion_clause(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let joined = terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(" OR ");
    Some(format!("NOT ({})", joined))
}

fn mesh_clause(criteria: &SearchCriteria) -> Option<String> {
    let tag = if criteria.include_mesh_subheadings() {
        "MeSH Terms:noexp"
    } else {
        "MeSH Terms"
    };
    any_of(criteria.mesh_terms().iter().map(|term| quoted(term, tag)))
}

fn date_clause(criteria: &SearchCriteria, this_year: i32) -> Option<String> {
    if criteria.start_year().is_none() && criteria.end_year().is_none() {
        return None;
    }
    let start = criteria.start_year().unwrap_or(MIN_YEAR);
    let end = criteria.end_year().unwrap_or(this_year);
    Some(format!("({}:{}[Date - Publication])", start, end))
}

fn quoted(value: &str, tag: &str) -> String {
    format!("\"{}\"[{}]", value, tag)
}

/// Parenthesised OR-group, or `None` when there are no terms
fn any_of(terms: impl Iterator<Item = String>) -> Option<String> {
    let terms: Vec<String> = terms.collect();
    if terms.is_empty() {
        None
    } else {
        Some(format!("({})", terms.join(" OR ")))
    }
}
