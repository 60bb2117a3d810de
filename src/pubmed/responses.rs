//! Decoders for the ESearch (XML) and ELink (JSON) responses.

use quick_xml::de::from_str;
use serde::Deserialize;

/// Link name whose link count is the number of citing articles
pub const CITED_IN_LINKNAME: &str = "pubmed_pubmed_citedin";

/// Parsed ESearch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// Total number of matching records reported by the service
    pub count: usize,
    /// Identifiers in the order the service returned them
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct ESearchResult {
    Count: Option<String>,
    IdList: Option<IdList>,
    ERROR: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdList {
    #[serde(rename = "Id", default)]
    ids: Vec<String>,
}

/// Parse an ESearch XML document.
///
/// A missing `Count` is read as zero matches; a present but non-numeric count
/// or an `ERROR` element is a parse failure.
pub fn parse_esearch(xml: &str) -> Result<DiscoveryResult, String> {
    let result: ESearchResult =
        from_str(xml).map_err(|e| format!("Failed to parse ESearch XML: {}", e))?;

    if let Some(error) = result.ERROR.filter(|e| !e.trim().is_empty()) {
        return Err(format!("ESearch reported an error: {}", error.trim()));
    }

    let count = match result.Count {
        Some(count) => count
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("ESearch Count {:?} is not a number", count))?,
        None => 0,
    };

    let ids = result
        .IdList
        .map(|list| list.ids)
        .unwrap_or_default()
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    Ok(DiscoveryResult { count, ids })
}

#[derive(Debug, Deserialize)]
struct ELinkResult {
    #[serde(default)]
    linksets: Vec<LinkSet>,
}

#[derive(Debug, Deserialize)]
struct LinkSet {
    #[serde(default)]
    linksetdbs: Vec<LinkSetDb>,
}

#[derive(Debug, Deserialize)]
struct LinkSetDb {
    #[serde(default)]
    linkname: String,
    #[serde(default)]
    links: Vec<serde_json::Value>,
}

/// Citation count from an ELink JSON document.
///
/// Uses the `pubmed_pubmed_citedin` link set, or the first link set when that
/// name is absent. Anything unreadable counts as zero citations.
pub fn parse_citation_count(json: &str) -> u32 {
    let result: ELinkResult = match serde_json::from_str(json) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable ELink response, assuming no citations");
            return 0;
        }
    };

    let Some(linkset) = result.linksets.first() else {
        return 0;
    };

    linkset
        .linksetdbs
        .iter()
        .find(|db| db.linkname == CITED_IN_LINKNAME)
        .or_else(|| linkset.linksetdbs.first())
        .map(|db| u32::try_from(db.links.len()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_esearch() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult>
  <Count>1234</Count>
  <RetMax>3</RetMax>
  <RetStart>0</RetStart>
  <QueryKey>1</QueryKey>
  <WebEnv>MCID_abc</WebEnv>
  <IdList>
    <Id>39000001</Id>
    <Id>39000002</Id>
    <Id>39000003</Id>
  </IdList>
  <TranslationSet/>
  <QueryTranslation>sepsis[All Fields]</QueryTranslation>
</eSearchResult>"#;

        let result = parse_esearch(xml).unwrap();
        assert_eq!(result.count, 1234);
        assert_eq!(result.ids, vec!["39000001", "39000002", "39000003"]);
    }

    #[test]
    fn test_parse_esearch_zero_results() {
        let xml = "<eSearchResult><Count>0</Count><RetMax>0</RetMax><IdList/></eSearchResult>";
        let result = parse_esearch(xml).unwrap();
        assert_eq!(result.count, 0);
        assert!(result.ids.is_empty());
    }

    #[test]
    fn test_parse_esearch_failures() {
        assert!(parse_esearch("<eSearchResult><Count>many</Count></eSearchResult>").is_err());
        assert!(
            parse_esearch("<eSearchResult><ERROR>Invalid query</ERROR></eSearchResult>").is_err()
        );
    }

    #[test]
    fn test_parse_citation_count() {
        let json = r#"{
            "header": {"type": "elink", "version": "0.3"},
            "linksets": [{
                "dbfrom": "pubmed",
                "ids": ["123"],
                "linksetdbs": [
                    {"dbto": "pubmed", "linkname": "pubmed_pubmed", "links": ["1", "2", "3", "4"]},
                    {"dbto": "pubmed", "linkname": "pubmed_pubmed_citedin", "links": ["5", "6"]}
                ]
            }]
        }"#;
        assert_eq!(parse_citation_count(json), 2);
    }

    #[test]
    fn test_parse_citation_count_fallbacks() {
        let first_only =
            r#"{"linksets": [{"linksetdbs": [{"linkname": "other", "links": ["1"]}]}]}"#;
        assert_eq!(parse_citation_count(first_only), 1);

        assert_eq!(parse_citation_count(r#"{"linksets": [{"dbfrom": "pubmed"}]}"#), 0);
        assert_eq!(parse_citation_count(r#"{"header": {}}"#), 0);
        assert_eq!(parse_citation_count("<html>"), 0);
    }
}
