//! Search orchestration: discovery, batched detail fetches, citation filtering.

use std::sync::Arc;

use super::extract::extract_articles;
use super::query::compile;
use super::responses::{
    parse_citation_count, parse_esearch, DiscoveryResult, CITED_IN_LINKNAME,
};
use super::{CancellationFlag, Endpoint, EutilsClient, Params, SearchError, Transport};
use crate::config::Config;
use crate::models::{Article, SearchCriteria};

/// Identifiers per EFetch request
pub const BATCH_SIZE: usize = 100;

/// Runs [`SearchCriteria`] against PubMed through a [`Transport`].
///
/// Batches are fetched strictly one after another, so progress is monotonic
/// and the transport's rate limiter sees one request at a time from each
/// search.
#[derive(Debug, Clone)]
pub struct PubMedSearcher {
    transport: Arc<dyn Transport>,
}

impl PubMedSearcher {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Searcher backed by an [`EutilsClient`] built from `config`
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        Ok(Self::new(EutilsClient::from_config(config)?))
    }

    /// Run a search and return every accepted article in discovery order
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Article>, SearchError> {
        self.search_with_progress(criteria, |_, _| {}).await
    }

    /// Like [`search`](Self::search), reporting `(processed, total)` before
    /// each batch and once more at the end
    pub async fn search_with_progress<F>(
        &self,
        criteria: &SearchCriteria,
        progress: F,
    ) -> Result<Vec<Article>, SearchError>
    where
        F: FnMut(usize, usize) + Send,
    {
        self.search_cancellable(criteria, progress, &CancellationFlag::new())
            .await
    }

    /// Like [`search_with_progress`](Self::search_with_progress), stopping with
    /// [`SearchError::Cancelled`] at the first batch boundary after `cancel` is
    /// raised
    pub async fn search_cancellable<F>(
        &self,
        criteria: &SearchCriteria,
        mut progress: F,
        cancel: &CancellationFlag,
    ) -> Result<Vec<Article>, SearchError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let discovery = self.discover(criteria).await?;
        if discovery.count == 0 || discovery.ids.is_empty() {
            tracing::info!(keywords = criteria.keywords(), "No matching articles");
            return Ok(Vec::new());
        }

        let total = discovery.count.min(criteria.max_results());
        let mut results = Vec::with_capacity(total);

        for (index, batch) in discovery.ids.chunks(BATCH_SIZE).enumerate() {
            let processed = (index * BATCH_SIZE).min(total);
            progress(processed, total);
            if cancel.is_cancelled() {
                tracing::info!(processed, total, "Search cancelled");
                return Err(SearchError::Cancelled { processed, total });
            }

            tracing::debug!(batch = index, size = batch.len(), "Fetching detail batch");
            let articles = self.fetch_batch(batch).await?;

            match criteria.min_citations() {
                Some(min) => {
                    for article in articles {
                        let count = self.citation_count(article.pmid()).await;
                        if count >= min {
                            results.push(article.with_citation_count(count));
                        } else {
                            tracing::debug!(
                                pmid = article.pmid(),
                                citations = count,
                                min,
                                "Below citation threshold"
                            );
                        }
                    }
                }
                None => results.extend(articles),
            }
        }

        progress(total, total);
        tracing::info!(
            reported = discovery.count,
            returned = results.len(),
            "PubMed search finished"
        );
        Ok(results)
    }

    /// ESearch call: total count and identifiers, up to `max_results`
    pub async fn discover(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<DiscoveryResult, SearchError> {
        let term = compile(criteria);
        tracing::debug!(term = %term, "Compiled PubMed query");

        let params: Params = vec![
            ("db", "pubmed".to_string()),
            ("term", term),
            ("retmax", criteria.max_results().to_string()),
            ("retmode", "xml".to_string()),
            ("usehistory", "y".to_string()),
            ("sort", criteria.sort_by().as_param().to_string()),
        ];
        let xml = self.transport.request(Endpoint::ESearch, params).await?;

        parse_esearch(&xml).map_err(|message| SearchError::Parse {
            endpoint: Endpoint::ESearch,
            message,
        })
    }

    /// EFetch call for one batch of identifiers
    pub async fn fetch_batch(&self, ids: &[String]) -> Result<Vec<Article>, SearchError> {
        let params: Params = vec![
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "xml".to_string()),
        ];
        let xml = self.transport.request(Endpoint::EFetch, params).await?;

        extract_articles(&xml).map_err(|e| SearchError::Parse {
            endpoint: Endpoint::EFetch,
            message: e.to_string(),
        })
    }

    /// Number of PubMed articles citing `pmid`; any failure counts as zero
    pub async fn citation_count(&self, pmid: &str) -> u32 {
        let params: Params = vec![
            ("dbfrom", "pubmed".to_string()),
            ("db", "pubmed".to_string()),
            ("id", pmid.to_string()),
            ("linkname", CITED_IN_LINKNAME.to_string()),
            ("cmd", "neighbor".to_string()),
            ("retmode", "json".to_string()),
        ];

        match self.transport.request(Endpoint::ELink, params).await {
            Ok(json) => parse_citation_count(&json),
            Err(e) => {
                tracing::warn!(pmid, error = %e, "Citation lookup failed, assuming none");
                0
            }
        }
    }
}
