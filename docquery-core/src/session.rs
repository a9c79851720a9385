//! Text-level query operations over a backend.
//!
//! [`QuerySession`] is the main entry point for automation callers. Every
//! operation takes criteria, updates and records as literal text, translates
//! them (literal parsing, then identifier normalization), hands the canonical
//! documents to the backend and shapes the result.
//!
//! Translation is all-or-nothing: if any argument fails to translate the
//! backend is never called.
//!
//! # Example
//!
//! ```ignore
//! use docquery::{prelude::*, mongodb::MongoDbBackend};
//!
//! let session = QuerySession::new(MongoDbBackend::builder("mongodb://localhost:27017").build().await?);
//!
//! session.insert_record("foo", "bar", r#"{"timestamp": 1, "msg": "Hello 1"}"#).await?;
//! let raw = session.retrieve_all_records("foo", "bar", ResultMode::Raw).await?;
//! assert!(raw.as_raw().unwrap().contains("'timestamp', 1"));
//!
//! session.shutdown().await?;
//! ```

use bson::{Bson, Document};

use crate::{
    backend::{QueryBackend, ReturnDocument},
    error::QueryResult,
    identifier::normalize_identifier,
    literal::{parse_document, parse_pipeline},
    projection::{IdentifierFlag, build_projection},
    result::{QueryOutput, ResultMode, serialize},
};

/// Parses literal text into a document and normalizes its identifier field.
pub fn translate(text: &str) -> QueryResult<Document> {
    normalize_identifier(parse_document(text)?)
}

/// Query operations bound to a specific backend.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct QuerySession<B: QueryBackend> {
    backend: B,
}

impl<B: QueryBackend> QuerySession<B> {
    /// Creates a new session over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Lists all databases on the connected server.
    pub async fn databases(&self) -> QueryResult<Vec<String>> {
        let databases = self.backend.list_databases().await?;
        log::debug!("Get databases -> {databases:?}");

        Ok(databases)
    }

    /// Lists all collections of a database.
    pub async fn collections(&self, database: &str) -> QueryResult<Vec<String>> {
        let collections = self.backend.list_collections(database).await?;
        log::debug!("Get collections | {database} -> {collections:?}");

        Ok(collections)
    }

    /// Drops a database if it exists.
    pub async fn drop_database(&self, database: &str) -> QueryResult<()> {
        log::debug!("Drop database | {database}");
        self.backend.drop_database(database).await
    }

    /// Drops a collection if it exists.
    pub async fn drop_collection(&self, database: &str, collection: &str) -> QueryResult<()> {
        log::debug!("Drop collection | {database} | {collection}");
        self.backend.drop_collection(database, collection).await
    }

    /// Returns the validation report for a collection.
    pub async fn validate_collection(&self, database: &str, collection: &str) -> QueryResult<Document> {
        log::debug!("Validate collection | {database} | {collection}");
        self.backend.validate_collection(database, collection).await
    }

    /// Counts every document in a collection.
    pub async fn collection_count(&self, database: &str, collection: &str) -> QueryResult<u64> {
        log::debug!("Get collection count | {database} | {collection}");
        self.backend
            .count_documents(database, collection, Document::new())
            .await
    }

    /// Counts the documents matching a condition.
    ///
    /// # Arguments
    ///
    /// * `condition` - Literal text describing the criteria, e.g. `{"in_use": false}`
    pub async fn collection_count_with_condition(
        &self,
        database: &str,
        collection: &str,
        condition: &str,
    ) -> QueryResult<u64> {
        let filter = translate(condition)?;
        log::debug!("Get collection count | {database} | {collection} | {filter}");

        self.backend
            .count_documents(database, collection, filter)
            .await
    }

    /// Inserts one record and returns its identifier.
    pub async fn insert_record(&self, database: &str, collection: &str, record: &str) -> QueryResult<Bson> {
        let record = translate(record)?;
        log::debug!("Insert record | {database} | {collection} | {record}");

        self.backend
            .insert_one(database, collection, record)
            .await
    }

    /// Saves one record and returns its identifier.
    ///
    /// Records with an `_id` overwrite the stored document with that identifier.
    pub async fn save_record(&self, database: &str, collection: &str, record: &str) -> QueryResult<Bson> {
        let record = translate(record)?;
        log::debug!("Save record | {database} | {collection} | {record}");

        self.backend
            .save_one(database, collection, record)
            .await
    }

    /// Updates every record matching `query` and returns the number modified.
    ///
    /// # Arguments
    ///
    /// * `query` - Literal text for the criteria, e.g. `{"type": "basic_user", "in_use": false}`
    /// * `update` - Literal text for the update, e.g. `{"$set": {"in_use": true}}`
    /// * `upsert` - Insert a document when nothing matches
    pub async fn update_many_records(
        &self,
        database: &str,
        collection: &str,
        query: &str,
        update: &str,
        upsert: bool,
    ) -> QueryResult<u64> {
        let filter = translate(query)?;
        let update = translate(update)?;
        log::debug!("Update many records | {database} | {collection} | {filter} | {update} | upsert={upsert}");

        self.backend
            .update_many(database, collection, filter, update, upsert)
            .await
    }

    /// Retrieves every record of a collection.
    pub async fn retrieve_all_records(
        &self,
        database: &str,
        collection: &str,
        mode: ResultMode,
    ) -> QueryResult<QueryOutput> {
        self.retrieve(database, collection, "{}", None, mode).await
    }

    /// Retrieves the records matching `criteria`.
    pub async fn retrieve_some_records(
        &self,
        database: &str,
        collection: &str,
        criteria: &str,
        mode: ResultMode,
    ) -> QueryResult<QueryOutput> {
        self.retrieve(database, collection, criteria, None, mode).await
    }

    /// Retrieves only the listed fields of the records matching `criteria`.
    ///
    /// # Arguments
    ///
    /// * `fields` - Comma separated field paths, e.g. `address.city, firstName`
    /// * `include_identifier` - Whether `_id` comes back alongside the listed fields
    pub async fn retrieve_records_with_desired_fields(
        &self,
        database: &str,
        collection: &str,
        criteria: &str,
        fields: &str,
        include_identifier: impl Into<IdentifierFlag>,
        mode: ResultMode,
    ) -> QueryResult<QueryOutput> {
        let projection = build_projection(fields, include_identifier)?;

        self.retrieve(database, collection, criteria, projection.to_document(), mode)
            .await
    }

    async fn retrieve(
        &self,
        database: &str,
        collection: &str,
        criteria: &str,
        projection: Option<Document>,
        mode: ResultMode,
    ) -> QueryResult<QueryOutput> {
        let filter = translate(criteria)?;
        log::debug!("Retrieve records | {database} | {collection} | {filter} | {projection:?} | {mode:?}");

        let records = self
            .backend
            .find(database, collection, filter, projection)
            .await?;

        Ok(serialize(records, mode))
    }

    /// Updates the first record matching `query` and returns it.
    ///
    /// `return_document` selects whether the record is returned as it was before
    /// or after the update. Returns `None` when nothing matched.
    pub async fn retrieve_and_update_one_record(
        &self,
        database: &str,
        collection: &str,
        query: &str,
        update: &str,
        return_document: ReturnDocument,
    ) -> QueryResult<Option<Document>> {
        let filter = translate(query)?;
        let update = translate(update)?;
        log::debug!(
            "Retrieve and update one record | {database} | {collection} | {filter} | {update} | {return_document:?}"
        );

        self.backend
            .find_one_and_update(database, collection, filter, update, return_document)
            .await
    }

    /// Deletes the records matching `criteria` and returns the number deleted.
    pub async fn remove_records(&self, database: &str, collection: &str, criteria: &str) -> QueryResult<u64> {
        let filter = translate(criteria)?;
        log::debug!("Remove records | {database} | {collection} | {filter}");

        self.backend
            .delete_many(database, collection, filter)
            .await
    }

    /// Runs an aggregation pipeline given as literal text.
    ///
    /// `None` runs an empty pipeline, which returns every document.
    pub async fn aggregate_records(
        &self,
        database: &str,
        collection: &str,
        pipeline: Option<&str>,
    ) -> QueryResult<Vec<Document>> {
        let pipeline = match pipeline {
            Some(text) => parse_pipeline(text)?,
            None => Vec::new(),
        };
        log::debug!("Aggregate records | {database} | {collection} | {pipeline:?}");

        self.backend
            .aggregate(database, collection, pipeline)
            .await
    }

    /// Shuts the session down and releases the backend connection.
    pub async fn shutdown(self) -> QueryResult<()> {
        self.backend.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use bson::oid::ObjectId;

    #[test]
    fn translate_normalizes_identifier() {
        let document = translate("{'_id': '507f1f77bcf86cd799439011', 'x': TRUE}").unwrap();

        assert_eq!(
            document.get("_id"),
            Some(&Bson::ObjectId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap()))
        );
        assert_eq!(document.get_bool("x").unwrap(), true);
    }

    #[test]
    fn translate_reports_the_first_failing_stage() {
        assert!(matches!(translate("{bad json"), Err(QueryError::Parse { .. })));
        assert!(matches!(translate("{'_id': 'not-hex'}"), Err(QueryError::Identifier { .. })));
        assert!(matches!(translate("[1, 2]"), Err(QueryError::InvalidDocument(_))));
    }
}
