//! Shared data structures for the controller optimization pipeline
//!
//! - `settings`: FunctionId-addressed controller settings vector
//! - `vehicle`: vehicle archetype records
//! - `request`: caller-supplied inputs and their normalization
//! - `optimization`: strategies, constraint categories and result records

mod optimization;
mod request;
mod settings;
mod vehicle;

pub use optimization::*;
pub use request::*;
pub use settings::*;
pub use vehicle::*;
