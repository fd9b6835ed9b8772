//! # medpredict
//!
//! Symptom-based disease prediction with reference-data enrichment.
//!
//! A caller submits symptom names; the engine maps them onto a fixed
//! vocabulary, runs a pre-trained classifier over the resulting binary
//! feature vector, and attaches the disease's description, precautions,
//! medications, diet and workout advice from reference tables.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐
//! │ ml_assets/   │──▶│ PredictionEngine │──▶│ CLI / HTTP API │
//! │ model + CSVs │   │ (medpredict-core)│   └───────┬────────┘
//! └──────────────┘   └──────────────────┘           │
//!                                                   ▼
//!                                          ┌────────────────┐
//!                                          │ SQLite audit   │
//!                                          │ prediction_logs│
//!                                          └────────────────┘
//! ```
//!
//! The prediction logic itself lives in the I/O-free `medpredict-core`
//! crate; this crate loads assets, persists the audit log, and exposes the
//! CLI and HTTP surfaces.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`assets`] | Asset discovery and loading into the engine |
//! | [`db`] | Database connection |
//! | [`migrate`] | Audit schema |
//! | [`audit_store`] | SQLite audit log |
//! | [`server`] | HTTP API |
//! | [`predict`] | `predict` and `validate` commands |
//! | [`symptoms`] | Listing and `check` commands |
//! | [`history`] | `history` command |
//! | [`telemetry`] | Tracing setup |

pub mod assets;
pub mod audit_store;
pub mod config;
pub mod db;
pub mod history;
pub mod migrate;
pub mod predict;
pub mod server;
pub mod symptoms;
pub mod telemetry;
