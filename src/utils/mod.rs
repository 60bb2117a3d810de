//! Utility modules supporting the search pipeline.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and a User-Agent
//! - [`RateLimiter`]: strict minimum spacing between E-utilities requests
//! - [`save_results`]: JSON export of extracted articles
//!
//! # Rate Limiting
//!
//! ```rust
//! use pubmed_search::utils::RateLimiter;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = RateLimiter::for_api_key(true);
//! limiter.acquire().await;
//! # }
//! ```

mod export;
mod http;
mod rate_limit;

pub use export::{save_results, ExportError};
pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use rate_limit::{RateLimiter, SPACING_WITHOUT_API_KEY, SPACING_WITH_API_KEY};
