use crate::graph::KnowledgeGraph;
use crate::types::SymbolId;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashSet};

impl KnowledgeGraph {
    /// Source of `id` and of every function it reaches through calls
    pub fn collect_callee_snippets(&self, id: &SymbolId) -> BTreeMap<String, String> {
        self.collect_snippets(id, |graph, idx| {
            graph
                .callees(idx)
                .into_iter()
                .map(|(callee, _)| callee)
                .collect()
        })
    }

    /// Source of `id` and of every function reaching it through calls
    pub fn collect_caller_snippets(&self, id: &SymbolId) -> BTreeMap<String, String> {
        self.collect_snippets(id, |graph, idx| {
            graph
                .callers(idx)
                .into_iter()
                .map(|(caller, _)| caller)
                .collect()
        })
    }

    /// Declaration of `id` and of every type it reaches through fields
    pub fn collect_struct_snippets(&self, id: &SymbolId) -> BTreeMap<String, String> {
        self.collect_snippets(id, |graph, idx| {
            graph
                .field_targets(idx)
                .into_iter()
                .map(|(target, _)| target)
                .collect()
        })
    }

    /// Unbounded walk; each identity is recorded once, which also ends cycles
    fn collect_snippets<F>(&self, id: &SymbolId, neighbours: F) -> BTreeMap<String, String>
    where
        F: Fn(&Self, NodeIndex) -> Vec<NodeIndex>,
    {
        let mut snippets = BTreeMap::new();
        let Some(start) = self.node(id) else {
            return snippets;
        };

        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            let entity = self.entity_at(idx);
            snippets.insert(entity.id().to_string(), entity.source().to_string());

            for next in neighbours(self, idx).into_iter().rev() {
                if !visited.contains(&next) {
                    stack.push(next);
                }
            }
        }

        log::debug!("Collected {} snippets from {id}", snippets.len());
        snippets
    }
}
