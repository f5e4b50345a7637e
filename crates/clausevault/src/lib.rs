//! # Clausevault Architecture
//!
//! Clausevault is the local persistence and diagnostics core of a clause
//! library. It keeps login settings (Tenants, Libraries, Users and their
//! refresh tokens), writes files that other processes may be holding, and
//! turns failed remote calls into messages a person can act on.
//!
//! It is a library first; the `cvault` binary is one thin client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Composition (init.rs)                                      │
//! │  - Resolves data root and config                            │
//! │  - Picks the settings backend exactly once                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - SettingsStore trait                                      │
//! │  - FileSettingsStore (JSON), RelationalSettingsStore (SQLite)│
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  I/O + Diagnostics (writer.rs, diagnostics.rs, classify.rs) │
//! │  - Bounded-retry file writes                                │
//! │  - Daily diagnostic log                                     │
//! │  - Remote failure → "<reason>: (<code>) <Name>"             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Recover Locally
//!
//! Failures inside persistence are recovered where plausible: transient write
//! errors are retried, an unreadable settings file becomes an empty document,
//! a missing reference resolves to nothing. Only the classifier produces a
//! final message for the caller to show or log. Nothing here is fatal to the
//! process.
//!
//! ## Module Overview
//!
//! - [`classify`]: Remote failure classification and diagnostic header parsing
//! - [`writer`]: Retrying file writer
//! - [`diagnostics`]: Daily log file entries
//! - [`store`]: Settings store contract and backends
//! - [`model`]: Tenant, Library, User and the settings document
//! - [`config`]: Configuration
//! - [`init`]: Composition root
//! - [`error`]: Error types

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod init;
pub mod model;
pub mod store;
pub mod writer;
