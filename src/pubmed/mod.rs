//! PubMed E-utilities search pipeline.
//!
//! The pipeline runs in two phases. ESearch discovers matching identifiers and
//! the total count, then EFetch retrieves full records in batches of 100 which
//! are extracted into [`Article`](crate::models::Article) values. Citation
//! counts come from ELink when a minimum citation filter is requested.
//!
//! All HTTP goes through the [`Transport`] trait. [`EutilsClient`] is the
//! rate-limited production implementation and [`MockTransport`] a scripted
//! one for tests.
//!
//! ```rust,no_run
//! use pubmed_search::models::SearchCriteria;
//! use pubmed_search::pubmed::{EutilsClient, PubMedSearcher};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EutilsClient::builder().build()?;
//! let searcher = PubMedSearcher::new(client);
//! let criteria = SearchCriteria::builder("sepsis").max_results(20).build()?;
//! for article in searcher.search(&criteria).await? {
//!     println!("{} {}", article.pmid(), article.title());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod extract;
mod mock;
mod query;
mod responses;
mod search;
mod xml;

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use client::{EutilsClient, EutilsClientBuilder, DEFAULT_BASE_URL};
pub use extract::{extract_articles, extract_record, parse_month, ExtractError};
pub use mock::{MockCall, MockTransport};
pub use query::{compile, compile_for_year};
pub use responses::{parse_citation_count, parse_esearch, DiscoveryResult, CITED_IN_LINKNAME};
pub use search::{PubMedSearcher, BATCH_SIZE};
pub use xml::{Element, XmlError};

/// E-utilities endpoints used by the search pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Identifier discovery
    ESearch,
    /// Full record retrieval
    EFetch,
    /// Citation lookup
    ELink,
}

impl Endpoint {
    /// Path segment below the E-utilities base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ESearch => "esearch.fcgi",
            Endpoint::EFetch => "efetch.fcgi",
            Endpoint::ELink => "elink.fcgi",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::ESearch => "esearch",
            Endpoint::EFetch => "efetch",
            Endpoint::ELink => "elink",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that abort a search
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{endpoint} request failed: {message}")]
    Transport { endpoint: Endpoint, message: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: Endpoint, status: u16 },

    #[error("failed to parse {endpoint} response: {message}")]
    Parse { endpoint: Endpoint, message: String },

    #[error("search cancelled after {processed} of {total} articles")]
    Cancelled { processed: usize, total: usize },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl SearchError {
    /// Endpoint involved in the failure, when there is one
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            SearchError::Transport { endpoint, .. }
            | SearchError::Status { endpoint, .. }
            | SearchError::Parse { endpoint, .. } => Some(*endpoint),
            SearchError::Cancelled { .. } | SearchError::Client(_) => None,
        }
    }
}

/// Query parameters for one request, without credentials
pub type Params = Vec<(&'static str, String)>;

/// Issues one E-utilities request and returns the raw body
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn request(&self, endpoint: Endpoint, params: Params) -> Result<String, SearchError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn request(&self, endpoint: Endpoint, params: Params) -> Result<String, SearchError> {
        (**self).request(endpoint, params).await
    }
}

/// Shared flag a caller raises to stop a search at the next batch boundary
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
