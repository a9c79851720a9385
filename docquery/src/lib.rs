//! Main docquery crate providing translation of loosely-formatted query text
//! into canonical MongoDB documents.
//!
//! This crate is the primary entry point for users of docquery. It re-exports
//! the translation core and, behind the `mongodb` feature, the MongoDB backend.
//!
//! # Features
//!
//! - **Permissive literals** - Single or double quotes, `TRUE`/`Null` in any case
//! - **Native identifiers** - String `_id` values become ObjectIds before they reach the store
//! - **Projections from field lists** - `"address.city, firstName"` plus an `_id` switch
//! - **Comparable results** - Structured documents or one raw string for substring checks
//!
//! # Quick Start
//!
//! ```ignore
//! use docquery::prelude::*;
//!
//! let criteria = translate("{'_id': '507f1f77bcf86cd799439011', 'in_use': FALSE}")?;
//! let projection = build_projection("address.city, firstName", "False")?;
//!
//! assert!(criteria.get_object_id("_id").is_ok());
//! assert_eq!(projection.get("_id"), Some(false));
//! ```
//!
//! # Running queries
//!
//! ```ignore
//! use docquery::{prelude::*, mongodb::MongoDbBackend};
//!
//! #[tokio::main]
//! async fn main() -> QueryResult<()> {
//!     let session = QuerySession::new(
//!         MongoDbBackend::builder("mongodb://localhost:27017").build().await?,
//!     );
//!
//!     session
//!         .update_many_records(
//!             "account",
//!             "users",
//!             r#"{"type": "basic_user", "in_use": false}"#,
//!             r#"{"$set": {"in_use": true}}"#,
//!             false,
//!         )
//!         .await?;
//!
//!     let output = session
//!         .retrieve_records_with_desired_fields("account", "users", "{}", "firstName", true, ResultMode::Raw)
//!         .await?;
//!     assert!(output.as_raw().unwrap().contains("'firstName', 'Clark'"));
//!
//!     session.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docquery_core::{backend, document, error, identifier, literal, projection, result, session};

// Re-export BSON types for convenience
pub use bson;

/// MongoDB backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docquery_mongodb::{MongoDbBackend, MongoDbBackendBuilder};
}
