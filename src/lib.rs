//! # PubMed Search
//!
//! Structured literature search against NCBI PubMed.
//!
//! ## Architecture
//!
//! - [`models`]: validated search criteria and extracted articles
//! - [`pubmed`]: query compiler, rate-limited E-utilities transport, record
//!   extractor and the search orchestrator
//! - [`analysis`]: per-article abstract analysis and literature reviews
//! - [`utils`]: HTTP client, rate limiter and JSON export
//! - [`config`]: configuration management
//! - [`ui`]: terminal output for the command-line interface

pub mod analysis;
pub mod config;
pub mod models;
pub mod pubmed;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{Article, SearchCriteria};
pub use pubmed::{EutilsClient, PubMedSearcher, SearchError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
