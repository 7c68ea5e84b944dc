//! Value types and their wire form.

pub mod i256;
pub mod val;
