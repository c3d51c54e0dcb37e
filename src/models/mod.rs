pub mod action;
pub mod document;
pub mod field;
pub mod intersection;

pub use action::*;
pub use document::{format_date, site_uid, Document, DynamicValue};
pub use field::*;
pub use intersection::*;
