//! Core types and shared functionality for sodalog-sw.
//!
//! This crate provides:
//! - The offline cache router and its deployment rollover
//! - Cache generation store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod request;
pub mod router;

pub use cache::{CacheDb, CacheStorage, EntryMeta};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use fetcher::Fetcher;
pub use request::{CacheRequest, RequestMode, Response};
pub use router::{
    ActivationReport, AssetStrategy, CacheRouter, InstallReport, Interception, LifecycleState, RegisterOutcome,
    Registration, RegistrationStatus, RequestClass, ResponseSource, RouterConfig, Served, classify,
};
