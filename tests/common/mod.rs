//! Common test utilities for mediagrab end-to-end tests

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod engine;
#[allow(dead_code)]
pub mod server;

#[allow(unused_imports)]
pub use assertions::*;
pub use engine::*;
pub use server::*;
