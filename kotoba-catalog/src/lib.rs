//! # kotoba-catalog
//!
//! Client for the vocabulary catalog's search API and the word-list export
//! built from it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kotoba_catalog::{CatalogClient, CatalogQuery};
//! use kotoba_core::MirrorConfig;
//!
//! async fn list_a1(config: &MirrorConfig) {
//!     if let Ok(client) = CatalogClient::from_config(config) {
//!         let query = CatalogQuery::new("en".into(), "A1".into());
//!         if let Ok(response) = client.list_words(&query).await {
//!             println!("{} words", response.data.len());
//!         }
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod export;
pub mod model;
pub mod query;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use export::{export_csv, extract_rows, WordRow};
pub use model::{identities, CatalogResponse, WordAttribute, WordEntry};
pub use query::CatalogQuery;
