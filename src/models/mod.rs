//! Core data models for shopfloor
//!
//! This module contains the data structures of the repair-order lifecycle:
//! estimates with their jobs and items, public approval links, bundles,
//! workorders and invoices.

pub mod bundle;
pub mod estimate;
pub mod ids;
pub mod invoice;
pub mod line_item;
pub mod money;
pub mod public_link;
pub mod workorder;

pub use bundle::{Bundle, BundleItem};
pub use estimate::{
    Estimate, EstimateComment, EstimateItem, EstimateJob, EstimateSignature, EstimateStatus,
};
pub use ids::{BundleId, EstimateId, InvoiceId, ItemId, JobId, PublicLinkId, WorkorderId};
pub use invoice::{Invoice, InvoiceLine, InvoiceSection, InvoiceSource, InvoiceStatus, Payment};
pub use line_item::{ApprovalStatus, ItemType, PricedLine, Totals};
pub use money::{Money, Quantity};
pub use public_link::EstimatePublicLink;
pub use workorder::{
    Workorder, WorkorderItem, WorkorderJob, WorkorderStatus, WorkorderStatusHistory,
};
