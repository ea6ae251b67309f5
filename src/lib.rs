//! cms-migrate - entry migrations against a headless CMS management API
//!
//! The library is the operation orchestration engine: it turns a stream of
//! entry-mutation intents into ordered, version-safe, rate-limited, retried
//! and tracked API calls. The `cmig` binary is a thin command layer on top.
//!
//! Layering, leaf first:
//! - [`resilience`] - retry policy and concurrency ceiling for single calls
//! - [`api`] - the remote-call surface and its live, resilient and dry-run
//!   implementations
//! - [`operations`] - version-aware transitions for one entry
//! - [`bulk`] - submit/poll protocol for bulk publish and unpublish
//! - [`batch`] - chunking of large entry streams
//! - [`tracking`] - per-run counters and progress reporting
//! - [`pipeline`] - the run driver composing all of the above

pub mod api;
pub mod auth;
pub mod batch;
pub mod bulk;
pub mod config;
pub mod error;
pub mod operations;
pub mod pipeline;
pub mod resilience;
pub mod source;
pub mod tracking;
pub mod types;
