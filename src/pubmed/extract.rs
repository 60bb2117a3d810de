//! EFetch record extraction.
//!
//! Each `PubmedArticle` in a detail batch is turned into an [`Article`]
//! independently. A record that fails validation is logged and dropped; only a
//! document that cannot be parsed at all fails the batch.

use crate::models::{
    current_year, Article, ArticleBuilder, ArticleError, Author, MeshTerm, PublicationDate,
    MIN_YEAR,
};
use crate::pubmed::xml::{Element, XmlError};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Failure of a whole detail batch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("EFetch reported an error: {0}")]
    Service(String),
}

/// Extract every usable article from an EFetch XML document, in record order.
///
/// A document carrying an `ERROR` element in place of records is a batch
/// failure, not an empty batch.
pub fn extract_articles(xml: &str) -> Result<Vec<Article>, ExtractError> {
    let root = Element::parse(xml)?;
    if let Some(error) = root.child("ERROR") {
        return Err(ExtractError::Service(error.text()));
    }
    let records = if root.name() == "PubmedArticle" {
        vec![&root]
    } else {
        root.find_all("PubmedArticle")
    };

    let mut articles = Vec::with_capacity(records.len());
    for record in records {
        match extract_record(record) {
            Ok(article) => articles.push(article),
            Err(e) => {
                let pmid = record.find("PMID").map(|p| p.text()).unwrap_or_default();
                tracing::warn!(pmid = %pmid, error = %e, "Dropping malformed PubMed record");
            }
        }
    }

    tracing::debug!(
        extracted = articles.len(),
        "Extracted articles from detail batch"
    );
    Ok(articles)
}

/// Extract one `PubmedArticle` element
pub fn extract_record(record: &Element) -> Result<Article, ArticleError> {
    let pmid = record
        .find("PMID")
        .and_then(Element::non_empty_text)
        .ok_or(ArticleError::MissingPmid)?;

    let mut builder = ArticleBuilder::new().pmid(pmid);

    if let Some(title) = record.find("ArticleTitle") {
        builder = builder.title(title.text());
    }

    if let Some(abstract_text) = abstract_text(record) {
        builder = builder.abstract_text(abstract_text);
    }

    for author in record.find_all("Author") {
        if let Some(author) = author_from(author) {
            builder = builder.author(author);
        }
    }

    for heading in record.find_all("MeshHeading") {
        if let Some(term) = mesh_term_from(heading) {
            builder = builder.mesh_term(term);
        }
    }

    for keyword in record.find_all("Keyword") {
        if let Some(text) = keyword.non_empty_text() {
            builder = builder.keyword(text);
        }
    }

    if let Some(doi) = doi(record) {
        builder = builder.doi(doi);
    }

    if let Some(journal) = record.find("Journal") {
        if let Some(title) = journal.child("Title").and_then(Element::non_empty_text) {
            builder = builder.journal(title);
        }
        if let Some(abbrev) = journal
            .child("ISOAbbreviation")
            .and_then(Element::non_empty_text)
        {
            builder = builder.journal_abbrev(abbrev);
        }
    }

    if let Some(pub_date) = record.find("PubDate") {
        builder = builder.publication_date(publication_date(pub_date, current_year()));
    }

    builder.build()
}

/// The record's own DOI: `PubmedData/ArticleIdList`, then the article's
/// `ELocationID`. Identifiers under `ReferenceList` belong to cited works.
fn doi(record: &Element) -> Option<String> {
    let article_ids = record
        .child("PubmedData")
        .and_then(|data| data.child("ArticleIdList"))
        .into_iter()
        .flat_map(|list| list.children("ArticleId"))
        .filter(|id| id.attr("IdType") == Some("doi"));
    let locations = record
        .child("MedlineCitation")
        .and_then(|citation| citation.child("Article"))
        .into_iter()
        .flat_map(|article| article.children("ELocationID"))
        .filter(|id| id.attr("EIdType") == Some("doi"));

    article_ids
        .chain(locations)
        .find_map(Element::non_empty_text)
}

/// Labelled sections become `"Label: text"`, joined by newlines
fn abstract_text(record: &Element) -> Option<String> {
    let sections: Vec<String> = record
        .find_all("Abstract")
        .into_iter()
        .flat_map(|abs| abs.children("AbstractText"))
        .map(|section| match section.attr("Label").filter(|l| !l.is_empty()) {
            Some(label) => format!("{}: {}", label, section.text()),
            None => section.text(),
        })
        .collect();

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n"))
    }
}

fn author_from(element: &Element) -> Option<Author> {
    let last_name = element.child("LastName")?.non_empty_text()?;
    let mut author = Author::new(last_name).ok()?;
    if let Some(fore) = element.child("ForeName").and_then(Element::non_empty_text) {
        author = author.fore_name(fore);
    }
    if let Some(affiliation) = element.find("Affiliation").and_then(Element::non_empty_text) {
        author = author.affiliation(affiliation);
    }
    Some(author)
}

fn mesh_term_from(heading: &Element) -> Option<MeshTerm> {
    let descriptor = heading.child("DescriptorName")?.non_empty_text()?;
    let qualifiers = heading
        .children("QualifierName")
        .filter_map(Element::non_empty_text)
        .collect();
    Some(MeshTerm {
        descriptor,
        qualifiers,
    })
}

fn publication_date(pub_date: &Element, this_year: i32) -> PublicationDate {
    let year = match pub_date.child("Year") {
        Some(year) => parse_year(&year.text(), this_year),
        None => pub_date
            .child("MedlineDate")
            .and_then(|d| d.text().get(..4).map(str::to_string))
            .and_then(|y| parse_year(&y, this_year)),
    };

    PublicationDate {
        year,
        month: pub_date.child("Month").and_then(|m| parse_month(&m.text())),
        day: pub_date.child("Day").and_then(|d| parse_day(&d.text())),
    }
}

fn parse_year(value: &str, this_year: i32) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (MIN_YEAR..=this_year + 1).contains(y))
}

/// `Jan`..`Dec` (any case, longer names allowed) or a number in 1..=12
pub fn parse_month(value: &str) -> Option<u32> {
    let value = value.trim();
    let prefix: String = value.chars().take(3).collect::<String>().to_lowercase();
    if let Some(index) = MONTHS.iter().position(|m| *m == prefix) {
        return Some(index as u32 + 1);
    }
    value.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

fn parse_day(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|d| (1..=31).contains(d))
}
