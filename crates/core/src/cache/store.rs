//! The persistent blob-store capability consumed by the router.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::Error;
use crate::request::{CacheRequest, Response};

/// Named, persistent key-value store of responses.
///
/// Every write replaces one key's whole value; the store needs no locking
/// beyond last-write-wins per key.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named generation if it does not exist.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Store one response in an existing generation.
    async fn put(&self, generation: &str, request: &CacheRequest, response: &Response) -> Result<(), Error>;

    /// Create the generation and store all entries atomically.
    async fn put_all(&self, generation: &str, entries: &[(CacheRequest, Response)]) -> Result<(), Error>;

    /// Find the stored response for a request.
    async fn lookup(&self, generation: &str, request: &CacheRequest) -> Result<Option<Response>, Error>;

    /// All generation names, oldest first.
    async fn names(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation with all its entries. Returns false if absent.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.create_generation(generation).await.map(|_| ())
    }

    async fn put(&self, generation: &str, request: &CacheRequest, response: &Response) -> Result<(), Error> {
        self.put_entry(generation, request, response).await
    }

    async fn put_all(&self, generation: &str, entries: &[(CacheRequest, Response)]) -> Result<(), Error> {
        self.put_entries(generation, entries).await
    }

    async fn lookup(&self, generation: &str, request: &CacheRequest) -> Result<Option<Response>, Error> {
        self.get_entry(generation, request).await
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        self.delete_generation(generation).await
    }
}
