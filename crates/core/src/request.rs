//! Request and response values exchanged between the hosting runtime, the
//! network capability and the cache store.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// How the hosting runtime issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    SameOrigin,
    NoCors,
    Cors,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    /// Upper-case HTTP method.
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
}

/// RFC 7230 `tchar`.
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

impl CacheRequest {
    /// Build a request, normalizing the method to upper case.
    pub fn new(method: &str, url: Url, mode: RequestMode) -> Result<Self, Error> {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() || !method.bytes().all(is_token_char) {
            return Err(Error::InvalidInput(format!("invalid HTTP method: {method:?}")));
        }
        Ok(Self { method, url, mode })
    }

    /// A sub-resource GET.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::Cors }
    }

    /// A top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::Navigate }
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A captured HTTP response.
///
/// The body is an immutable shared buffer, so cloning yields an independent
/// readable copy and storing one copy never disturbs the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// URL the response was produced for.
    pub url: String,
    pub status: u16,
    /// Header pairs in received order.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_normalized() {
        let req = CacheRequest::new(" post ", url("http://localhost/"), RequestMode::Cors).unwrap();
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_invalid_method() {
        assert!(CacheRequest::new("", url("http://localhost/"), RequestMode::Cors).is_err());
        assert!(CacheRequest::new("GE T", url("http://localhost/"), RequestMode::Cors).is_err());
        assert!(CacheRequest::new("GET(1)", url("http://localhost/"), RequestMode::Cors).is_err());
    }

    #[test]
    fn test_extension_methods_accepted() {
        let req = CacheRequest::new("m-search", url("http://localhost/"), RequestMode::Cors).unwrap();
        assert_eq!(req.method, "M-SEARCH");
        assert!(CacheRequest::new("VERSION-CONTROL", url("http://localhost/"), RequestMode::Cors).is_ok());
    }

    #[test]
    fn test_navigate_constructor() {
        let req = CacheRequest::navigate(url("http://localhost/dashboard/"));
        assert!(req.is_get());
        assert!(req.is_navigation());
        assert!(!CacheRequest::get(url("http://localhost/app.js")).is_navigation());
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new("/", 200, "").is_ok());
        assert!(Response::new("/", 204, "").is_ok());
        assert!(!Response::new("/", 304, "").is_ok());
        assert!(!Response::new("/", 404, "").is_ok());
        assert!(!Response::new("/", 199, "").is_ok());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let response = Response::new("/", 200, "x").with_header("Content-Type", "text/css");
        assert_eq!(response.content_type(), Some("text/css"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/css"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Response::new("/app.js", 200, "console.log(1)").with_header("content-type", "text/javascript");
        let mut copy = original.clone();
        copy.headers.clear();
        copy.status = 500;
        assert_eq!(original.status, 200);
        assert_eq!(original.body, Bytes::from_static(b"console.log(1)"));
        assert_eq!(original.headers.len(), 1);
    }
}
