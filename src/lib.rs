//! shopfloor - repair-shop estimates, workorders and invoices
//!
//! This library carries a repair order through its life: a service writer
//! builds an estimate of jobs and line items, the customer approves or
//! declines the work through a public link, approved work becomes a
//! workorder, and a completed workorder (or the approved estimate itself)
//! is billed as an invoice.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (estimates, workorders, invoices, bundles)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `backup`: Backup archives and restore
//! - `export`: JSON, YAML and CSV export
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the `shopfloor` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfloor::config::{paths::ShopPaths, settings::Settings};
//! use shopfloor::services::EstimateService;
//! use shopfloor::storage::Storage;
//!
//! let paths = ShopPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::new(paths)?;
//! storage.load_all()?;
//! let estimate = EstimateService::new(&storage, &settings).require("EST-000001")?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ShopError, ShopResult};
