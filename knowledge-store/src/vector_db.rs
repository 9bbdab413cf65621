use futures::future::BoxFuture;

use crate::errors::Result;
use crate::record::{CollectionInfo, SearchOptions, SearchResult, VectorDocument};

/// Document store over one named, dimensioned collection.
///
/// Implementations are shared behind `Arc` and must be safe to call
/// concurrently.
pub trait VectorDb: Send + Sync {
    fn collection_name(&self) -> &str;

    /// Creates the collection when absent. An existing collection with a
    /// different (or unreadable) dimensionality is dropped and recreated.
    fn initialize_collection(&self, dimensions: usize) -> BoxFuture<'_, Result<()>>;

    fn upsert_document(&self, doc: VectorDocument) -> BoxFuture<'_, Result<()>>;

    fn get_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<VectorDocument>>>;

    fn delete_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Enumerates documents (payload only), up to `limit` when given.
    fn get_all_documents(&self, limit: Option<usize>)
    -> BoxFuture<'_, Result<Vec<VectorDocument>>>;

    fn delete_all_documents(&self) -> BoxFuture<'_, Result<()>>;

    fn search_similar(
        &self,
        vector: Vec<f32>,
        opts: SearchOptions,
    ) -> BoxFuture<'_, Result<Vec<SearchResult>>>;

    fn search_by_keywords<'a>(
        &'a self,
        keywords: &'a [String],
        opts: SearchOptions,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>>>;

    /// `false` when the backend is unreachable or the client was never built.
    fn health_check(&self) -> BoxFuture<'_, bool>;

    fn get_collection_info(&self) -> BoxFuture<'_, Result<CollectionInfo>>;
}
