//! Heuristic resolvers run by [`crate::KnowledgeStore::merge`].
//!
//! Each resolver reads the frozen fact set and returns plain relation
//! records; the store turns them into graph edges. Resolution never fails,
//! a missing match simply produces no record.

mod calls;
mod interfaces;
mod types;

pub use calls::{CallEdge, CallResolver};
pub use interfaces::{Implementation, InterfaceResolver};
pub use types::{FieldReference, TypeResolver};
