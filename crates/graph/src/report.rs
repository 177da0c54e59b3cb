use crate::graph::KnowledgeGraph;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Package -> symbol name -> method names
pub type RelationReport = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Flat listing of every identity, each list sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolIndex {
    pub functions: Vec<String>,
    pub structs: Vec<String>,
    pub interfaces: Vec<String>,
}

impl KnowledgeGraph {
    /// Whole-program summary of declared symbols and their methods.
    ///
    /// Types and interfaces appear even without methods; receivers with no
    /// struct declaration still get an entry; free functions are listed
    /// under the empty symbol name.
    pub fn relation_report(&self) -> RelationReport {
        let mut report: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
        let store = self.store();

        for (_, decl) in store.types() {
            report
                .entry(decl.package.clone())
                .or_default()
                .entry(decl.name.clone())
                .or_default();
        }
        for (_, decl) in store.interfaces() {
            report
                .entry(decl.package.clone())
                .or_default()
                .entry(decl.name.clone())
                .or_default()
                .extend(decl.methods.keys().cloned());
        }
        for (_, decl) in store.functions() {
            report
                .entry(decl.package.clone())
                .or_default()
                .entry(decl.receiver.clone())
                .or_default()
                .insert(decl.name.clone());
        }

        report
            .into_iter()
            .map(|(package, symbols)| {
                let symbols = symbols
                    .into_iter()
                    .map(|(symbol, methods)| (symbol, methods.into_iter().collect()))
                    .collect();
                (package, symbols)
            })
            .collect()
    }

    pub fn symbol_index(&self) -> SymbolIndex {
        let store = self.store();
        let sorted = |mut ids: Vec<String>| {
            ids.sort();
            ids
        };

        SymbolIndex {
            functions: sorted(store.functions().map(|(_, d)| d.id().to_string()).collect()),
            structs: sorted(store.types().map(|(_, d)| d.id().to_string()).collect()),
            interfaces: sorted(store.interfaces().map(|(_, d)| d.id().to_string()).collect()),
        }
    }
}
