//! HTTP handlers

pub mod component;
pub mod enquiry;
pub mod health;
pub mod invoice;
pub mod ledger;
pub mod loi;
pub mod order;
pub mod payment;
pub mod quotation;

pub use component::*;
pub use enquiry::*;
pub use health::*;
pub use invoice::*;
pub use ledger::*;
pub use loi::*;
pub use order::*;
pub use payment::*;
pub use quotation::*;
