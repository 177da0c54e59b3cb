//! # relmap graph
//!
//! Cross-file knowledge graph of declared types, interfaces and functions.
//!
//! ## Features
//!
//! - **Fact store** - per-file declaration facts appended into one arena
//! - **Heuristic resolution** - field types, interface method sets, call sites
//! - **Bounded drawing** - depth-limited DOT output for struct and call graphs
//! - **Snippet collection** - cycle-safe gathering of reachable source text
//!
//! ## Architecture
//!
//! ```text
//! FileFacts[]
//!     │
//!     ├──> KnowledgeStore (ingest)
//!     │      ├─ Nodes: types, interfaces, functions (petgraph arena)
//!     │      └─ Lookups: by identity, by simple name, by package
//!     │
//!     ├──> merge (whole program, once)
//!     │      ├─ TypeResolver:      struct field -> type / interface
//!     │      ├─ InterfaceResolver: receiver method set ⊇ interface
//!     │      └─ CallResolver:      call site -> function (both directions)
//!     │
//!     └──> KnowledgeGraph (read-only)
//!            ├─ draw_*_graph       -> DotGraph
//!            ├─ collect_*_snippets -> identity -> source
//!            └─ relation_report / symbol_index
//! ```

mod config;
mod dot;
mod draw;
mod error;
mod graph;
mod report;
mod resolve;
mod snippets;
mod store;
mod types;

pub use config::{
    CallResolverConfig, DotConfig, GraphConfig, InterfaceResolverConfig, TypeResolverConfig,
};
pub use dot::{DotGraph, EdgeStyle};
pub use error::{GraphError, Result};
pub use graph::KnowledgeGraph;
pub use report::{RelationReport, SymbolIndex};
pub use resolve::{
    CallEdge, CallResolver, FieldReference, Implementation, InterfaceResolver, TypeResolver,
};
pub use store::{IngestSummary, KnowledgeStore};
pub use types::{
    CallResolution, Entity, EntityKind, FieldKey, FileFacts, FunctionDecl, ImportAlias,
    InterfaceDecl, Package, Relation, SourceFile, SymbolId, TypeDecl,
};
