use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::KnowledgeGraph;
use crate::resolve::{CallResolver, InterfaceResolver, TypeResolver};
use crate::types::*;
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of ingesting one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub path: String,
    pub types: usize,
    pub interfaces: usize,
    pub functions: usize,

    /// Declarations dropped because their identity was already registered
    pub duplicates: Vec<SymbolId>,
}

/// Owner of every ingested fact.
///
/// Declarations live in a petgraph arena; relations computed by
/// [`KnowledgeStore::merge`] become typed edges between arena nodes.
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    pub(crate) graph: DiGraph<Entity, Relation>,
    ids: HashMap<SymbolId, NodeIndex>,
    functions_by_name: HashMap<String, Vec<NodeIndex>>,
    types_by_name: HashMap<String, Vec<NodeIndex>>,
    interfaces_by_name: HashMap<String, Vec<NodeIndex>>,
    packages: IndexMap<String, Package>,
    /// File path -> (package position, file position)
    files: HashMap<String, (usize, usize)>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the facts of one source file.
    ///
    /// Nothing of the file is stored when its facts are malformed.
    pub fn add_file(&mut self, facts: FileFacts) -> Result<IngestSummary> {
        Self::validate(&facts)?;
        if self.files.contains_key(&facts.path) {
            return Err(GraphError::invalid_facts(&facts.path, "file already ingested"));
        }

        let FileFacts {
            package,
            path,
            imports,
            types,
            interfaces,
            functions,
        } = facts;

        let mut summary = IngestSummary {
            path: path.clone(),
            ..Default::default()
        };
        let mut symbols = Vec::new();

        for mut decl in types {
            decl.package = package.clone();
            decl.file = path.clone();
            if let Some(id) = self.register(Entity::Type(decl), &mut summary) {
                summary.types += 1;
                symbols.push(id);
            }
        }
        for mut decl in interfaces {
            decl.package = package.clone();
            decl.file = path.clone();
            if let Some(id) = self.register(Entity::Interface(decl), &mut summary) {
                summary.interfaces += 1;
                symbols.push(id);
            }
        }
        for mut decl in functions {
            decl.package = package.clone();
            decl.file = path.clone();
            if let Some(id) = self.register(Entity::Function(decl), &mut summary) {
                summary.functions += 1;
                symbols.push(id);
            }
        }

        let entry = self.packages.entry(package.clone());
        let package_pos = entry.index();
        let owner = entry.or_insert_with(|| Package {
            name: package.clone(),
            files: Vec::new(),
        });
        owner.files.push(SourceFile {
            path: path.clone(),
            package,
            imports,
            symbols,
        });
        let file_pos = owner.files.len() - 1;
        self.files.insert(path, (package_pos, file_pos));

        log::debug!(
            "Ingested {}: {} types, {} interfaces, {} functions",
            summary.path,
            summary.types,
            summary.interfaces,
            summary.functions
        );

        Ok(summary)
    }

    fn validate(facts: &FileFacts) -> Result<()> {
        if facts.path.trim().is_empty() {
            return Err(GraphError::invalid_facts("<unknown>", "missing file path"));
        }
        if facts.package.trim().is_empty() {
            return Err(GraphError::invalid_facts(&facts.path, "missing package name"));
        }
        if facts.package.contains('/') {
            return Err(GraphError::invalid_facts(
                &facts.path,
                format!("package name {:?} contains '/'", facts.package),
            ));
        }

        let names = facts
            .types
            .iter()
            .map(|decl| decl.name.as_str())
            .chain(facts.interfaces.iter().map(|decl| decl.name.as_str()))
            .chain(facts.functions.iter().map(|decl| decl.name.as_str()))
            .chain(facts.functions.iter().map(|decl| decl.receiver.as_str()));
        for name in names {
            if name.contains('/') {
                return Err(GraphError::invalid_facts(
                    &facts.path,
                    format!("symbol name {name:?} contains '/'"),
                ));
            }
        }
        let has_unnamed = facts.types.iter().any(|decl| decl.name.is_empty())
            || facts.interfaces.iter().any(|decl| decl.name.is_empty())
            || facts.functions.iter().any(|decl| decl.name.is_empty());
        if has_unnamed {
            return Err(GraphError::invalid_facts(
                &facts.path,
                "declaration without a name",
            ));
        }

        Ok(())
    }

    fn register(&mut self, entity: Entity, summary: &mut IngestSummary) -> Option<SymbolId> {
        let id = entity.id();
        if self.ids.contains_key(&id) {
            log::warn!(
                "Duplicate symbol {id} in {}, keeping the first declaration",
                entity.file()
            );
            summary.duplicates.push(id);
            return None;
        }

        let name = entity.name().to_string();
        let kind = entity.kind();
        let idx = self.graph.add_node(entity);
        self.ids.insert(id.clone(), idx);

        let by_name = match kind {
            EntityKind::Type => &mut self.types_by_name,
            EntityKind::Interface => &mut self.interfaces_by_name,
            EntityKind::Function => &mut self.functions_by_name,
        };
        by_name.entry(name).or_default().push(idx);

        Some(id)
    }

    /// Every function or method with the given simple name, in ingestion order
    pub fn all_functions_named(&self, name: &str) -> Vec<&FunctionDecl> {
        self.function_nodes_named(name)
            .iter()
            .filter_map(|&idx| self.function_at(idx))
            .collect()
    }

    /// Every struct type with the given simple name, in ingestion order
    pub fn all_types_named(&self, name: &str) -> Vec<&TypeDecl> {
        self.types_by_name
            .get(name)
            .map(|nodes| {
                nodes
                    .iter()
                    .filter_map(|&idx| match &self.graph[idx] {
                        Entity::Type(decl) => Some(decl),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every interface with the given simple name, in ingestion order
    pub fn all_interfaces_named(&self, name: &str) -> Vec<&InterfaceDecl> {
        self.interfaces_by_name
            .get(name)
            .map(|nodes| {
                nodes
                    .iter()
                    .filter_map(|&idx| match &self.graph[idx] {
                        Entity::Interface(decl) => Some(decl),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn entity(&self, id: &SymbolId) -> Option<&Entity> {
        self.node(id).map(|idx| &self.graph[idx])
    }

    pub fn type_decl(&self, id: &SymbolId) -> Option<&TypeDecl> {
        match self.entity(id)? {
            Entity::Type(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn interface_decl(&self, id: &SymbolId) -> Option<&InterfaceDecl> {
        match self.entity(id)? {
            Entity::Interface(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn function_decl(&self, id: &SymbolId) -> Option<&FunctionDecl> {
        self.node(id).and_then(|idx| self.function_at(idx))
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Packages in the order they were first seen
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn source_file(&self, path: &str) -> Option<&SourceFile> {
        let &(package_pos, file_pos) = self.files.get(path)?;
        self.packages
            .get_index(package_pos)
            .and_then(|(_, package)| package.files.get(file_pos))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Compute every derived relation and freeze the store.
    pub fn merge(mut self, config: &GraphConfig) -> KnowledgeGraph {
        let references = TypeResolver::new(&config.types).resolve(&self);
        let implementations = InterfaceResolver::new(&config.interfaces).resolve(&self);
        let call_resolver = CallResolver::new(&config.calls);
        let callees = call_resolver.resolve_callees(&self);
        let callers = call_resolver.resolve_callers(&self);

        log::info!(
            "Resolved {} field references, {} implementations, {} callee and {} caller edges",
            references.len(),
            implementations.len(),
            callees.len(),
            callers.len()
        );

        for reference in references {
            self.link(
                &reference.source,
                &reference.target,
                Relation::Field(reference.key),
            );
        }
        for implementation in implementations {
            self.link(
                &implementation.implementor,
                &implementation.interface,
                Relation::Implements {
                    ambiguous: implementation.ambiguous,
                },
            );
        }
        for edge in callees {
            self.link(&edge.caller, &edge.callee, Relation::Calls(edge.resolution));
        }
        for edge in callers {
            self.link(&edge.callee, &edge.caller, Relation::CalledBy(edge.resolution));
        }

        log::info!(
            "Merged knowledge graph: {} nodes, {} edges",
            self.node_count(),
            self.edge_count()
        );

        KnowledgeGraph::new(self, config.dot.clone())
    }

    fn link(&mut self, from: &SymbolId, to: &SymbolId, relation: Relation) {
        match (self.node(from), self.node(to)) {
            (Some(from), Some(to)) => {
                self.graph.add_edge(from, to, relation);
            }
            _ => log::debug!("Dropping relation {from} -> {to}: endpoint not in store"),
        }
    }

    pub(crate) fn node(&self, id: &SymbolId) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub(crate) fn function_nodes_named(&self, name: &str) -> &[NodeIndex] {
        self.functions_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn function_at(&self, idx: NodeIndex) -> Option<&FunctionDecl> {
        match self.graph.node_weight(idx)? {
            Entity::Function(decl) => Some(decl),
            _ => None,
        }
    }

    /// Functions in ingestion order
    pub(crate) fn functions(&self) -> impl Iterator<Item = (NodeIndex, &FunctionDecl)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.function_at(idx).map(|decl| (idx, decl)))
    }

    /// Struct types in ingestion order
    pub(crate) fn types(&self) -> impl Iterator<Item = (NodeIndex, &TypeDecl)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| match &self.graph[idx] {
                Entity::Type(decl) => Some((idx, decl)),
                _ => None,
            })
    }

    /// Interfaces in ingestion order
    pub(crate) fn interfaces(&self) -> impl Iterator<Item = (NodeIndex, &InterfaceDecl)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| match &self.graph[idx] {
                Entity::Interface(decl) => Some((idx, decl)),
                _ => None,
            })
    }
}
