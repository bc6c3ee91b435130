//! Configuration module for shopfloor
//!
//! - Data directory resolution
//! - Shop settings persistence (tax rate, numbering, validity windows)

pub mod paths;
pub mod settings;

pub use paths::ShopPaths;
pub use settings::Settings;
