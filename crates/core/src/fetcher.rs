//! The network capability consumed by the router.

use async_trait::async_trait;

use crate::Error;
use crate::request::{CacheRequest, Response};

/// Issue an HTTP request on behalf of the router.
///
/// Implementations return non-2xx responses as `Ok`; `Err` is reserved for
/// requests that produced no response at all (offline, DNS, timeout).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &CacheRequest) -> Result<Response, Error>;
}
