//! Driver abstraction for executing translated queries.
//!
//! The [`QueryBackend`] trait is the seam between the translation layer and a
//! concrete document store driver. Everything that crosses it is already
//! translated: criteria, updates and records are [`bson::Document`] values with
//! any identifier normalized, and projections are projection documents.
//!
//! A backend value *is* the connection handle. Callers acquire it once through
//! a [`QueryBackendBuilder`], reuse it for every operation and release it with
//! [`QueryBackend::shutdown`].
//!
//! # Example
//!
//! ```ignore
//! use docquery::backend::{QueryBackend, QueryBackendBuilder};
//! use bson::doc;
//!
//! let backend = MyBackendBuilder::new().build().await?;
//! let count = backend.count_documents("account", "users", doc! {}).await?;
//! backend.shutdown().await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::error::QueryResult;

/// Which version of a document a find-and-update returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    /// The document as it was before the update.
    Before,
    /// The document as it is after the update.
    #[default]
    After,
}

/// Abstract interface for document store drivers.
///
/// Implementations must be thread-safe. Driver failures are reported as
/// [`QueryError::Backend`](crate::error::QueryError::Backend) and never hidden.
/// Timeouts and retries are whatever the driver itself does.
#[async_trait]
pub trait QueryBackend: Send + Sync + Debug {
    /// Lists the names of all databases on the server.
    async fn list_databases(&self) -> QueryResult<Vec<String>>;

    /// Lists the names of all collections in a database.
    async fn list_collections(&self, database: &str) -> QueryResult<Vec<String>>;

    /// Drops a database. Dropping a missing database is not an error.
    async fn drop_database(&self, database: &str) -> QueryResult<()>;

    /// Drops a collection. Dropping a missing collection is not an error.
    async fn drop_collection(&self, database: &str, collection: &str) -> QueryResult<()>;

    /// Validates a collection and returns the server's validation report.
    async fn validate_collection(&self, database: &str, collection: &str) -> QueryResult<Document>;

    /// Counts the documents matching `filter`.
    async fn count_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> QueryResult<u64>;

    /// Inserts a single record and returns its identifier.
    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        record: Document,
    ) -> QueryResult<Bson>;

    /// Saves a record and returns its identifier.
    ///
    /// A record carrying an `_id` replaces the stored document with that
    /// identifier (inserting it if absent). A record without one is inserted.
    async fn save_one(
        &self,
        database: &str,
        collection: &str,
        record: Document,
    ) -> QueryResult<Bson>;

    /// Applies `update` to every document matching `filter` and returns the number modified.
    async fn update_many(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> QueryResult<u64>;

    /// Returns every document matching `filter`, restricted by `projection` when given.
    ///
    /// The driver cursor is drained once; the documents keep store order.
    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> QueryResult<Vec<Document>>;

    /// Updates the first document matching `filter` and returns it, or `None` if nothing matched.
    async fn find_one_and_update(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
        return_document: ReturnDocument,
    ) -> QueryResult<Option<Document>>;

    /// Deletes every document matching `filter` and returns the number deleted.
    async fn delete_many(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> QueryResult<u64>;

    /// Runs an aggregation pipeline and returns its output documents.
    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> QueryResult<Vec<Document>>;

    /// Releases the connection.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> QueryResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> QueryBackend for &B
where
    B: QueryBackend,
{
    async fn list_databases(&self) -> QueryResult<Vec<String>> {
        (*self).list_databases().await
    }

    async fn list_collections(&self, database: &str) -> QueryResult<Vec<String>> {
        (*self).list_collections(database).await
    }

    async fn drop_database(&self, database: &str) -> QueryResult<()> {
        (*self).drop_database(database).await
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> QueryResult<()> {
        (*self).drop_collection(database, collection).await
    }

    async fn validate_collection(&self, database: &str, collection: &str) -> QueryResult<Document> {
        (*self).validate_collection(database, collection).await
    }

    async fn count_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> QueryResult<u64> {
        (*self)
            .count_documents(database, collection, filter)
            .await
    }

    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        record: Document,
    ) -> QueryResult<Bson> {
        (*self)
            .insert_one(database, collection, record)
            .await
    }

    async fn save_one(
        &self,
        database: &str,
        collection: &str,
        record: Document,
    ) -> QueryResult<Bson> {
        (*self)
            .save_one(database, collection, record)
            .await
    }

    async fn update_many(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> QueryResult<u64> {
        (*self)
            .update_many(database, collection, filter, update, upsert)
            .await
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> QueryResult<Vec<Document>> {
        (*self)
            .find(database, collection, filter, projection)
            .await
    }

    async fn find_one_and_update(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
        return_document: ReturnDocument,
    ) -> QueryResult<Option<Document>> {
        (*self)
            .find_one_and_update(database, collection, filter, update, return_document)
            .await
    }

    async fn delete_many(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> QueryResult<u64> {
        (*self)
            .delete_many(database, collection, filter)
            .await
    }

    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> QueryResult<Vec<Document>> {
        (*self)
            .aggregate(database, collection, pipeline)
            .await
    }
}

/// Factory trait for creating backend instances.
///
/// Builders carry connection configuration and produce a ready-to-use backend.
#[async_trait]
pub trait QueryBackendBuilder {
    type Backend: QueryBackend;

    /// Connects and returns the backend.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Initialization`](crate::error::QueryError::Initialization)
    /// when the configuration is invalid or the connection cannot be set up.
    async fn build(self) -> QueryResult<Self::Backend>;
}
