//! Depth-bounded drawing of the merged graph as DOT.
//!
//! A draw emits the start node, then spends one unit of budget per level:
//! depth 0 and 1 yield only the start node, depth 2 adds its direct
//! neighbours. Nodes reached again with a budget no larger than an earlier
//! visit are not expanded a second time. With `focus_packages` set, steps
//! into other packages are left out.

use crate::dot::{entity_label, DotGraph, EdgeStyle};
use crate::graph::KnowledgeGraph;
use crate::types::{CallResolution, Entity, SymbolId};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Traversal {
    Callee,
    Caller,
    Struct,
}

/// One neighbour reached from the node being expanded
struct Step {
    next: NodeIndex,
    from: NodeIndex,
    to: NodeIndex,
    style: EdgeStyle,
}

struct Drawing<'g> {
    graph: &'g KnowledgeGraph,
    traversal: Traversal,
    dot: DotGraph,

    /// Largest remaining budget each node was expanded with
    expanded: HashMap<NodeIndex, usize>,
}

impl<'g> Drawing<'g> {
    fn new(graph: &'g KnowledgeGraph, traversal: Traversal) -> Self {
        Self {
            graph,
            traversal,
            dot: DotGraph::new(),
            expanded: HashMap::new(),
        }
    }

    fn visit(&mut self, idx: NodeIndex, budget: usize) {
        let entity = self.graph.entity_at(idx);
        self.dot.add_node(&entity.id(), &entity_label(entity));

        let remaining = budget.saturating_sub(1);
        if remaining == 0 {
            return;
        }
        if self
            .expanded
            .get(&idx)
            .is_some_and(|&previous| previous >= remaining)
        {
            return;
        }
        self.expanded.insert(idx, remaining);

        for step in self.steps(idx) {
            if !self.in_focus(step.next) {
                continue;
            }
            let from = self.graph.id_at(step.from);
            let to = self.graph.id_at(step.to);
            self.dot.add_edge(&from, &to, &step.style);
            self.visit(step.next, remaining);
        }
    }

    fn steps(&self, idx: NodeIndex) -> Vec<Step> {
        match self.traversal {
            Traversal::Callee => self
                .graph
                .callees(idx)
                .into_iter()
                .map(|(callee, resolution)| Step {
                    next: callee,
                    from: idx,
                    to: callee,
                    style: self.call_style(resolution),
                })
                .collect(),
            Traversal::Caller => self
                .graph
                .callers(idx)
                .into_iter()
                .map(|(caller, resolution)| Step {
                    next: caller,
                    from: caller,
                    to: idx,
                    style: self.call_style(resolution),
                })
                .collect(),
            Traversal::Struct => match self.graph.entity_at(idx) {
                Entity::Type(_) => self
                    .graph
                    .field_targets(idx)
                    .into_iter()
                    .map(|(target, key)| Step {
                        next: target,
                        from: idx,
                        to: target,
                        style: EdgeStyle::Label(key.to_string()),
                    })
                    .collect(),
                Entity::Interface(_) => self
                    .graph
                    .implementors(idx)
                    .into_iter()
                    .map(|implementor| Step {
                        next: implementor,
                        from: implementor,
                        to: idx,
                        style: EdgeStyle::Dashed,
                    })
                    .collect(),
                Entity::Function(_) => Vec::new(),
            },
        }
    }

    fn in_focus(&self, idx: NodeIndex) -> bool {
        let focus = &self.graph.dot_config().focus_packages;
        focus.is_empty()
            || focus
                .iter()
                .any(|package| package == self.graph.entity_at(idx).package())
    }

    fn call_style(&self, resolution: CallResolution) -> EdgeStyle {
        if self.graph.dot_config().mark_fallback_edges && resolution.is_fallback() {
            EdgeStyle::Dotted
        } else {
            EdgeStyle::Plain
        }
    }
}

impl KnowledgeGraph {
    /// Call graph rooted at `id`, following callees
    pub fn draw_callee_graph(&self, id: &SymbolId, depth: usize) -> DotGraph {
        self.draw(id, depth, Traversal::Callee)
    }

    /// Call graph rooted at `id`, following callers
    pub fn draw_caller_graph(&self, id: &SymbolId, depth: usize) -> DotGraph {
        self.draw(id, depth, Traversal::Caller)
    }

    /// Field references of a struct; interfaces expand to their implementors
    pub fn draw_struct_graph(&self, id: &SymbolId, depth: usize) -> DotGraph {
        self.draw(id, depth, Traversal::Struct)
    }

    fn draw(&self, id: &SymbolId, depth: usize, traversal: Traversal) -> DotGraph {
        let Some(start) = self.node(id) else {
            log::debug!("Nothing to draw for unknown symbol {id}");
            return DotGraph::new();
        };

        let mut drawing = Drawing::new(self, traversal);
        drawing.visit(start, depth);
        log::debug!(
            "Drew {traversal:?} graph of {id} at depth {depth}: {} nodes, {} edges",
            drawing.dot.node_count(),
            drawing.dot.edge_count()
        );
        drawing.dot
    }
}
