//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//! 1. non-GET methods bypass the router
//! 2. cross-origin URLs bypass the router
//! 3. deny-listed service domains bypass the router
//! 4. navigations are served network-first
//! 5. everything else is a static asset

use serde::Serialize;

use super::config::RouterConfig;
use crate::request::CacheRequest;

/// Category of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    NonCacheable,
    Navigation,
    StaticAsset,
}

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BypassReason {
    Method,
    CrossOrigin,
    DeniedDomain,
}

/// Reason the router must not intercept a request, if any.
pub fn bypass_reason(config: &RouterConfig, request: &CacheRequest) -> Option<BypassReason> {
    if !request.is_get() {
        Some(BypassReason::Method)
    } else if !config.is_same_origin(&request.url) {
        Some(BypassReason::CrossOrigin)
    } else if config.is_denied(&request.url) {
        Some(BypassReason::DeniedDomain)
    } else {
        None
    }
}

/// Classify a request. A pure function of method, URL and mode.
pub fn classify(config: &RouterConfig, request: &CacheRequest) -> RequestClass {
    if bypass_reason(config, request).is_some() {
        RequestClass::NonCacheable
    } else if request.is_navigation() {
        RequestClass::Navigation
    } else {
        RequestClass::StaticAsset
    }
}
