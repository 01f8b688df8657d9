//! Resource-bounded claim submission for deals past their deadline

mod batcher;
mod types;

pub use batcher::ClaimBatcher;
pub use types::*;
