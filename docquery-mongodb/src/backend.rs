use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::{Stream, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, ReturnDocument as MongoReturnDocument},
};
use docquery_core::{
    backend::{QueryBackend, QueryBackendBuilder, ReturnDocument},
    error::{QueryError, QueryResult},
    identifier::ID_FIELD,
};


fn backend_error(err: mongodb::error::Error) -> QueryError {
    QueryError::Backend(err.to_string())
}

/// Drains a driver cursor into memory. The cursor is consumed exactly once.
async fn drain<S>(cursor: S) -> QueryResult<Vec<Document>>
where
    S: Stream<Item = mongodb::error::Result<Document>>,
{
    cursor
        .try_collect::<Vec<Document>>()
        .await
        .map_err(backend_error)
}

/// A connection to a MongoDB deployment.
///
/// The backend owns the driver client and is the only connection handle. Build
/// it once, share it by reference and call [`QueryBackend::shutdown`] when done.
#[derive(Debug)]
pub struct MongoDbBackend {
    client: Client,
}

impl MongoDbBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn builder(dsn: &str) -> MongoDbBackendBuilder {
        MongoDbBackendBuilder::new(dsn)
    }

    fn get_collection(&self, database: &str, collection: &str) -> MongoCollection<Document> {
        self.client
            .database(database)
            .collection(collection)
    }

    async fn shutdown(self) -> QueryResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl QueryBackend for MongoDbBackend {
    async fn list_databases(&self) -> QueryResult<Vec<String>> {
        self.client
            .list_database_names()
            .await
            .map_err(backend_error)
    }

    async fn list_collections(&self, database: &str) -> QueryResult<Vec<String>> {
        self.client
            .database(database)
            .list_collection_names()
            .await
            .map_err(backend_error)
    }

    async fn drop_database(&self, database: &str) -> QueryResult<()> {
        self.client
            .database(database)
            .drop()
            .await
            .map_err(backend_error)
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> QueryResult<()> {
        self.get_collection(database, collection)
            .drop()
            .await
            .map_err(backend_error)
    }

    async fn validate_collection(&self, database: &str, collection: &str) -> QueryResult<Document> {
        self.client
            .database(database)
            .run_command(doc! { "validate": collection })
            .await
            .map_err(backend_error)
    }

    async fn count_documents(&self, database: &str, collection: &str, filter: Document) -> QueryResult<u64> {
        self.get_collection(database, collection)
            .count_documents(filter)
            .await
            .map_err(backend_error)
    }

    async fn insert_one(&self, database: &str, collection: &str, record: Document) -> QueryResult<Bson> {
        Ok(
            self.get_collection(database, collection)
                .insert_one(record)
                .await
                .map_err(backend_error)?
                .inserted_id
        )
    }

    async fn save_one(&self, database: &str, collection: &str, record: Document) -> QueryResult<Bson> {
        let Some(id) = record.get(ID_FIELD).cloned() else {
            return self.insert_one(database, collection, record).await;
        };

        let result = self.get_collection(database, collection)
            .replace_one(doc! { ID_FIELD: id.clone() }, record)
            .upsert(true)
            .await
            .map_err(backend_error)?;
        log::debug!(
            "Saved {id} in {database}.{collection}: matched {}, modified {}",
            result.matched_count,
            result.modified_count,
        );

        Ok(result.upserted_id.unwrap_or(id))
    }

    async fn update_many(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> QueryResult<u64> {
        let result = self.get_collection(database, collection)
            .update_many(filter, update)
            .upsert(upsert)
            .await
            .map_err(backend_error)?;
        log::debug!("Matched: {} documents", result.matched_count);

        Ok(result.modified_count)
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> QueryResult<Vec<Document>> {
        let cursor = match projection {
            Some(projection) => self.get_collection(database, collection)
                .find(filter)
                .projection(projection)
                .await,
            None => self.get_collection(database, collection)
                .find(filter)
                .await,
        }
        .map_err(backend_error)?;

        drain(cursor).await
    }

    async fn find_one_and_update(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
        return_document: ReturnDocument,
    ) -> QueryResult<Option<Document>> {
        self.get_collection(database, collection)
            .find_one_and_update(filter, update)
            .return_document(match return_document {
                ReturnDocument::Before => MongoReturnDocument::Before,
                ReturnDocument::After => MongoReturnDocument::After,
            })
            .await
            .map_err(backend_error)
    }

    async fn delete_many(&self, database: &str, collection: &str, filter: Document) -> QueryResult<u64> {
        Ok(
            self.get_collection(database, collection)
                .delete_many(filter)
                .await
                .map_err(backend_error)?
                .deleted_count
        )
    }

    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> QueryResult<Vec<Document>> {
        let cursor = self.get_collection(database, collection)
            .aggregate(pipeline)
            .await
            .map_err(backend_error)?;

        drain(cursor).await
    }

    async fn shutdown(self) -> QueryResult<()> {
        self.shutdown().await
    }
}

/// Connection settings for [`MongoDbBackend`].
pub struct MongoDbBackendBuilder {
    dsn: String,
    app_name: Option<String>,
}

impl MongoDbBackendBuilder {
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            app_name: None,
        }
    }

    /// Sets the application name reported to the server.
    pub fn app_name(mut self, app_name: &str) -> Self {
        self.app_name = Some(app_name.to_string());
        self
    }
}

#[async_trait]
impl QueryBackendBuilder for MongoDbBackendBuilder {
    type Backend = MongoDbBackend;

    async fn build(self) -> QueryResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| QueryError::Initialization(e.to_string()))?;
        if let Some(app_name) = self.app_name {
            options.app_name = Some(app_name);
        }
        log::debug!("Connecting to MongoDB hosts {:?}", options.hosts);

        Ok(MongoDbBackend::new(
            Client::with_options(options)
                .map_err(|e| QueryError::Initialization(e.to_string()))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_malformed_connection_strings() {
        let err = MongoDbBackend::builder("not-a-connection-string")
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Initialization(_)));
    }

    #[tokio::test]
    async fn builds_without_contacting_the_server() {
        let backend = MongoDbBackend::builder("mongodb://127.0.0.1:27017")
            .app_name("docquery-tests")
            .build()
            .await
            .unwrap();

        QueryBackend::shutdown(backend).await.unwrap();
    }

    #[tokio::test]
    async fn drain_keeps_cursor_order() {
        let cursor = futures::stream::iter(vec![Ok(doc! { "n": 1 }), Ok(doc! { "n": 2 })]);

        assert_eq!(drain(cursor).await.unwrap(), vec![doc! { "n": 1 }, doc! { "n": 2 }]);
    }
}
