//! Client code for sodalog-sw.
//!
//! This crate provides the HTTP implementation of the network capability the
//! cache router consumes.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};
