//! Procurement documents and their transitions

pub(crate) mod component;
pub(crate) mod counter;
pub(crate) mod enquiry;
pub(crate) mod invoice;
pub(crate) mod loi;
pub(crate) mod order;
pub(crate) mod payment;
pub(crate) mod quotation;

pub use component::*;
pub use counter::*;
pub use enquiry::*;
pub use invoice::*;
pub use loi::*;
pub use order::*;
pub use payment::*;
pub use quotation::*;
