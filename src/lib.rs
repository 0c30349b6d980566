//! # rustcinii
//!
//! CiNii Research batch fetcher and spreadsheet flattener.
//!
//! ## Modules
//!
//! - [`client`] - Rate-limited CiNii Research HTTP client
//! - [`opensearch`] - OpenSearch query and response model
//! - [`paginate`] - Batch paging over OpenSearch results
//! - [`ndjson`] - NDJSON record files and ID lists
//! - [`flatten`] / [`tables`] - JSON-LD records to relational rows
//! - [`labeled`] - Rows keyed by Japanese review labels
//! - [`aggregate`] - Article/author review sheet
//! - [`count`] - Property occurrence report
//! - [`sink`] - XLSX and CSV writers
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustcinii::client::CiniiClient;
//! use rustcinii::opensearch::{OpenSearchQuery, SearchType};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CiniiClient::new(None)?;
//!     let query = OpenSearchQuery {
//!         q: Some("がん".to_string()),
//!         ..Default::default()
//!     };
//!     let response = client.opensearch(SearchType::Articles, &query).await?;
//!     println!("Found {} results", response.total_results);
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod client;
pub mod count;
pub mod error;
pub mod flatten;
pub mod japanese;
pub mod labeled;
pub mod ndjson;
pub mod opensearch;
pub mod paginate;
pub mod schema;
pub mod sink;
pub mod tables;

pub use error::{CiniiError, Result};
