//! Algorithms over blocks: execution order and proof of work.

pub mod execution_order;
pub mod pow;
