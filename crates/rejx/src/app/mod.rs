//! Application layer: parsing, applying, discovering, and orchestrating.

pub mod apply;
pub mod discovery;
pub mod ops;
pub mod parse;
