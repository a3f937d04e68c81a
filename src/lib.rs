//! meshcheck core library.
//!
//! This crate validates snapshots of Istio configuration objects and reports
//! per-object findings with per-namespace summaries.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `snapshot`: Decoding of YAML/JSON snapshots into typed resources.
//! - `host`: Hostname normalization and wildcard matching.
//! - `registry`: Known services, service entries and namespaces of a run.
//! - `checks`: Catalog of check codes, messages and default severities.
//! - `checkers`: Per-object and group checkers.
//! - `validations`: Keyed results, merge protocol, aggregator and report.
//! - `engine`: Bounded parallel orchestration of a run.
//! - `validate`: Runner used by the `validate` and `summary` commands.
//! - `models`: Resource schema and validation output structs.
//! - `output`: Human/JSON printers.
pub mod checkers;
pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod models;
pub mod output;
pub mod registry;
pub mod snapshot;
pub mod validate;
pub mod validations;
