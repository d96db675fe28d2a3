//! Core definitions (error type, result alias and runtime shims), relied upon by all gridcore-* crates.

pub mod async_runtime;
pub mod error;
pub mod result;

pub use result::Result;
