//! CLI command implementations.

pub mod codes;
pub mod decode;
pub mod session;
