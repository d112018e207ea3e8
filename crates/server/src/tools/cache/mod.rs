//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and pruning the generation store.

pub mod generations;
pub mod get;
pub mod purge;

pub use generations::generations_impl;
pub use get::{CacheGetParams, get_impl};
pub use purge::purge_impl;

use sodalog_core::Registration;

/// Generations the registration still depends on: the active one first, then
/// the waiting one.
pub(crate) async fn protected_generations(registration: &Registration) -> Vec<String> {
    let status = registration.status().await;
    status
        .active
        .into_iter()
        .chain(status.waiting)
        .map(|router| router.generation)
        .collect()
}
