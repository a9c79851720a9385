//! MongoDB backend implementation for docquery.
//!
//! This crate provides a MongoDB-based implementation of the `QueryBackend` trait,
//! executing translated criteria, updates, projections and pipelines with the
//! official async driver.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docquery = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The backend is an explicit connection handle. It is created from a MongoDB
//! connection string through the builder, reused for every operation and
//! released with `shutdown`. Timeouts and retries are the driver's own.
//!
//! # Example
//!
//! ```ignore
//! use docquery::{backend::QueryBackendBuilder, mongodb::MongoDbBackend, session::QuerySession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbBackend::builder("mongodb://localhost:27017")
//!         .app_name("acceptance-tests")
//!         .build()
//!         .await?;
//!     let session = QuerySession::new(backend);
//!
//!     let count = session.collection_count("account", "users").await?;
//!     println!("{count} users");
//!
//!     session.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docquery_mongodb;

pub mod backend;

pub use backend::{MongoDbBackend, MongoDbBackendBuilder};
