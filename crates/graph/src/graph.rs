use crate::config::DotConfig;
use crate::resolve::CallEdge;
use crate::store::KnowledgeStore;
use crate::types::{CallResolution, Entity, FieldKey, Relation, SymbolId};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Merged, read-only knowledge graph.
///
/// Only [`KnowledgeStore::merge`] produces one, so every query sees the
/// complete set of derived relations.
#[derive(Debug)]
pub struct KnowledgeGraph {
    store: KnowledgeStore,
    dot: DotConfig,
}

impl KnowledgeGraph {
    pub(crate) fn new(store: KnowledgeStore, dot: DotConfig) -> Self {
        Self { store, dot }
    }

    /// Ingested facts
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn dot_config(&self) -> &DotConfig {
        &self.dot
    }

    pub fn node_count(&self) -> usize {
        self.store.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    /// Functions called by `id`
    pub fn callees_of(&self, id: &SymbolId) -> Vec<CallEdge> {
        let Some(idx) = self.store.node(id) else {
            return Vec::new();
        };
        self.callees(idx)
            .into_iter()
            .map(|(callee, resolution)| CallEdge {
                caller: id.clone(),
                callee: self.id_at(callee),
                resolution,
            })
            .collect()
    }

    /// Functions calling `id`
    pub fn callers_of(&self, id: &SymbolId) -> Vec<CallEdge> {
        let Some(idx) = self.store.node(id) else {
            return Vec::new();
        };
        self.callers(idx)
            .into_iter()
            .map(|(caller, resolution)| CallEdge {
                caller: self.id_at(caller),
                callee: id.clone(),
                resolution,
            })
            .collect()
    }

    /// Resolved non-builtin fields of a struct
    pub fn complex_fields(&self, id: &SymbolId) -> Vec<(FieldKey, SymbolId)> {
        let Some(idx) = self.store.node(id) else {
            return Vec::new();
        };
        self.field_targets(idx)
            .into_iter()
            .map(|(target, key)| (key.clone(), self.id_at(target)))
            .collect()
    }

    /// Structs implementing an interface
    pub fn implementors_of(&self, id: &SymbolId) -> Vec<SymbolId> {
        let Some(idx) = self.store.node(id) else {
            return Vec::new();
        };
        self.implementors(idx)
            .into_iter()
            .map(|implementor| self.id_at(implementor))
            .collect()
    }

    /// Interfaces a struct implements
    pub fn interfaces_of(&self, id: &SymbolId) -> Vec<SymbolId> {
        let Some(idx) = self.store.node(id) else {
            return Vec::new();
        };
        self.edges(idx, Direction::Outgoing)
            .into_iter()
            .filter(|(_, relation)| matches!(relation, Relation::Implements { .. }))
            .map(|(interface, _)| self.id_at(interface))
            .collect()
    }

    pub(crate) fn node(&self, id: &SymbolId) -> Option<NodeIndex> {
        self.store.node(id)
    }

    pub(crate) fn entity_at(&self, idx: NodeIndex) -> &Entity {
        &self.store.graph[idx]
    }

    pub(crate) fn id_at(&self, idx: NodeIndex) -> SymbolId {
        self.entity_at(idx).id()
    }

    /// Neighbours with their relations, in the order the edges were added
    fn edges(&self, idx: NodeIndex, direction: Direction) -> Vec<(NodeIndex, &Relation)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex, &Relation)> = self
            .store
            .graph
            .edges_directed(idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.id(), other, edge.weight())
            })
            .collect();
        edges.sort_by_key(|(edge, _, _)| edge.index());
        edges
            .into_iter()
            .map(|(_, other, relation)| (other, relation))
            .collect()
    }

    pub(crate) fn callees(&self, idx: NodeIndex) -> Vec<(NodeIndex, CallResolution)> {
        self.edges(idx, Direction::Outgoing)
            .into_iter()
            .filter_map(|(callee, relation)| match relation {
                Relation::Calls(resolution) => Some((callee, *resolution)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn callers(&self, idx: NodeIndex) -> Vec<(NodeIndex, CallResolution)> {
        self.edges(idx, Direction::Outgoing)
            .into_iter()
            .filter_map(|(caller, relation)| match relation {
                Relation::CalledBy(resolution) => Some((caller, *resolution)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn field_targets(&self, idx: NodeIndex) -> Vec<(NodeIndex, &FieldKey)> {
        self.edges(idx, Direction::Outgoing)
            .into_iter()
            .filter_map(|(target, relation)| match relation {
                Relation::Field(key) => Some((target, key)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn implementors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.edges(idx, Direction::Incoming)
            .into_iter()
            .filter(|(_, relation)| matches!(relation, Relation::Implements { .. }))
            .map(|(implementor, _)| implementor)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::types::{FileFacts, FunctionDecl, InterfaceDecl, TypeDecl};
    use pretty_assertions::assert_eq;

    fn merged() -> KnowledgeGraph {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("shop", "shop/shop.go")
                    .with_type(
                        TypeDecl::new("Cart")
                            .field("items", "[]Item")
                            .field("pricer", "Pricer"),
                    )
                    .with_type(TypeDecl::new("Item"))
                    .with_interface(InterfaceDecl::new("Pricer").method("Price", "Price() int"))
                    .with_function(
                        FunctionDecl::new("Price")
                            .receiver("Item")
                            .source("func (i Item) Price() int {\n\treturn round(1)\n}"),
                    )
                    .with_function(FunctionDecl::new("round").source("func round(x int) int {}")),
            )
            .unwrap();
        store.merge(&GraphConfig::default())
    }

    #[test]
    fn relation_views_follow_edges() {
        let graph = merged();
        let cart = SymbolId::type_id("shop", "Cart");
        let pricer = SymbolId::type_id("shop", "Pricer");
        let item = SymbolId::type_id("shop", "Item");
        let price = SymbolId::function("shop", "Item", "Price");
        let round = SymbolId::function("shop", "", "round");

        assert_eq!(
            graph.complex_fields(&cart),
            vec![
                (FieldKey::new("items", "[]Item"), item.clone()),
                (FieldKey::new("pricer", "Pricer"), pricer.clone()),
            ]
        );
        assert_eq!(graph.implementors_of(&pricer), vec![item.clone()]);
        assert_eq!(graph.interfaces_of(&item), vec![pricer]);

        let callees = graph.callees_of(&price);
        assert_eq!(callees.len(), 1);
        assert_eq!(callees[0].callee, round);
        assert_eq!(callees[0].resolution, CallResolution::Package);

        let callers = graph.callers_of(&round);
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].caller, price);
    }

    #[test]
    fn unknown_identities_have_no_relations() {
        let graph = merged();
        let missing = SymbolId::type_id("shop", "Missing");
        assert!(graph.complex_fields(&missing).is_empty());
        assert!(graph.callees_of(&missing).is_empty());
        assert!(graph.implementors_of(&missing).is_empty());
    }

    #[test]
    fn knowledge_graph_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KnowledgeGraph>();
    }
}
