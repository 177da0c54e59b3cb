use crate::types::{Entity, SymbolId};
use indexmap::IndexSet;
use std::fmt;

/// Decoration of an edge statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeStyle {
    /// `a->b;`
    Plain,

    /// `impl->iface [style="dashed"];`
    Dashed,

    /// Call edge found by the unique-name fallback
    Dotted,

    /// `a->b [label="field:type"];`
    Label(String),
}

/// Graphviz description produced by the draw queries.
///
/// Statements keep their first-emission order and are never repeated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotGraph {
    nodes: IndexSet<String>,
    edges: IndexSet<String>,
}

impl DotGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node statement, returns false when it was already present.
    ///
    /// `label` is inserted as-is so it may carry `\l` line breaks.
    pub fn add_node(&mut self, id: &SymbolId, label: &str) -> bool {
        self.nodes.insert(format!(
            "{} [label=\"{label}\", shape=\"box\"];",
            quote(&id.to_string())
        ))
    }

    /// Add an edge statement, returns false when it was already present
    pub fn add_edge(&mut self, from: &SymbolId, to: &SymbolId, style: &EdgeStyle) -> bool {
        let from = quote(&from.to_string());
        let to = quote(&to.to_string());
        let statement = match style {
            EdgeStyle::Plain => format!("{from}->{to};"),
            EdgeStyle::Dashed => format!("{from}->{to} [style=\"dashed\"];"),
            EdgeStyle::Dotted => format!("{from}->{to} [style=\"dotted\"];"),
            EdgeStyle::Label(label) => format!("{from}->{to} [label=\"{}\"];", escape(label)),
        };
        self.edges.insert(statement)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_statements(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edge_statements(&self) -> impl Iterator<Item = &str> {
        self.edges.iter().map(String::as_str)
    }

    /// `digraph { ... }` text handed to the renderer
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DotGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {{")?;
        for statement in self.nodes.iter().chain(&self.edges) {
            writeln!(f, "{statement}")?;
        }
        writeln!(f, "}}")
    }
}

fn quote(id: &str) -> String {
    format!("\"{}\"", escape(id))
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Multi-line box label of an entity, lines left-aligned with `\l`
pub(crate) fn entity_label(entity: &Entity) -> String {
    let mut lines = Vec::new();
    match entity {
        Entity::Type(decl) => {
            lines.push(format!("struct: {}", decl.name));
            lines.push("----".to_string());
            lines.push(format!("package: {}", decl.package));
            lines.push(format!("file: {}", decl.file));
            lines.push("----".to_string());
            lines.extend(
                decl.fields
                    .iter()
                    .map(|(name, type_text)| format!("{name}: {type_text}")),
            );
        }
        Entity::Interface(decl) => {
            lines.push(format!("interface: {}", decl.name));
            lines.push("----".to_string());
            lines.push(format!("package: {}", decl.package));
            lines.push(format!("file: {}", decl.file));
            lines.push("----".to_string());
            lines.extend(decl.methods.values().cloned());
        }
        Entity::Function(decl) => {
            lines.push(format!("function: {}", decl.name));
            if decl.is_method() {
                lines.push(format!("receiver: {}", decl.receiver));
            }
            lines.push(format!("package: {}", decl.package));
            lines.push(format!("file: {}", decl.file));
        }
    }

    let mut label = String::new();
    for line in lines {
        label.push_str(&escape(&line));
        label.push_str("\\l");
    }
    label
}
