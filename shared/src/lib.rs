//! Shared domain model for the Procurement Marketplace
//!
//! This crate holds the procurement document chain (component, enquiry,
//! quotation, counter-quotation, LOI, order, invoice, payment), the status
//! transition tables, the money arithmetic and the settlement ledger. It is
//! shared between the backend and the browser client (via WASM) and performs
//! no I/O: every mutator receives the current instant and returns a new
//! snapshot.

pub mod document;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod money;
pub mod types;
pub mod validation;

pub use document::*;
pub use error::*;
pub use ledger::*;
pub use lifecycle::*;
pub use models::*;
pub use money::*;
pub use types::*;
pub use validation::*;
