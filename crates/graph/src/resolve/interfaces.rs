//! Method-set matching of receivers against interfaces.

use crate::config::InterfaceResolverConfig;
use crate::store::KnowledgeStore;
use crate::types::SymbolId;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// Struct whose methods cover an interface's method names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Implementation {
    pub implementor: SymbolId,
    pub interface: SymbolId,

    /// Receiver name is declared as a struct in more than one package
    pub ambiguous: bool,
}

pub struct InterfaceResolver<'c> {
    config: &'c InterfaceResolverConfig,
}

impl<'c> InterfaceResolver<'c> {
    pub fn new(config: &'c InterfaceResolverConfig) -> Self {
        Self { config }
    }

    /// Receiver name -> method names, across the whole program
    fn method_sets(store: &KnowledgeStore) -> IndexMap<&str, HashSet<&str>> {
        let mut sets: IndexMap<&str, HashSet<&str>> = IndexMap::new();
        for (_, decl) in store.functions() {
            if decl.is_method() {
                sets.entry(decl.receiver.as_str())
                    .or_default()
                    .insert(decl.name.as_str());
            }
        }
        sets
    }

    pub fn resolve(&self, store: &KnowledgeStore) -> Vec<Implementation> {
        let method_sets = Self::method_sets(store);
        let mut implementations = Vec::new();

        for (_, interface) in store.interfaces() {
            if interface.methods.is_empty() && !self.config.match_empty_interfaces {
                continue;
            }

            for (receiver, methods) in &method_sets {
                if *receiver == interface.name {
                    continue;
                }
                if !interface
                    .methods
                    .keys()
                    .all(|name| methods.contains(name.as_str()))
                {
                    continue;
                }

                let types = store.all_types_named(receiver);
                if types.is_empty() {
                    log::debug!(
                        "Receiver {receiver} satisfies {} but is not a known struct",
                        interface.id()
                    );
                    continue;
                }

                let ambiguous = types.len() > 1;
                if ambiguous {
                    log::debug!(
                        "Receiver {receiver} is declared in {} packages, linking all to {}",
                        types.len(),
                        interface.id()
                    );
                }
                for decl in types {
                    implementations.push(Implementation {
                        implementor: decl.id(),
                        interface: interface.id(),
                        ambiguous,
                    });
                }
            }
        }

        implementations
    }
}
