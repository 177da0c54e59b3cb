//! Line-oriented call-site matching.
//!
//! Each function body is tokenized into `name(` call sites. A site is then
//! matched against the functions sharing its name, restricted by how it was
//! written:
//!
//! ```text
//! f(...)        receiver-less function of the caller's package
//! alias.f(...)  function of the imported package
//! x.f(...)      function sharing the caller's receiver name
//! ```
//!
//! Dot calls that match no restriction may still resolve to a function whose
//! name is unique program-wide; those edges carry
//! [`CallResolution::UniqueNameFallback`].

use crate::config::CallResolverConfig;
use crate::store::KnowledgeStore;
use crate::types::{CallResolution, FunctionDecl, SymbolId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Directed call relation between two functions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallEdge {
    pub caller: SymbolId,
    pub callee: SymbolId,
    pub resolution: CallResolution,
}

/// `name(` occurrence in a function body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CallSite<'a> {
    name: &'a str,

    /// Text before the dot for `selector.name(`
    selector: Option<&'a str>,
}

pub struct CallResolver<'c> {
    config: &'c CallResolverConfig,
}

impl<'c> CallResolver<'c> {
    pub fn new(config: &'c CallResolverConfig) -> Self {
        Self { config }
    }

    /// Caller -> callee edges, found by scanning each caller's body
    pub fn resolve_callees(&self, store: &KnowledgeStore) -> Vec<CallEdge> {
        let mut edges = Vec::new();

        for (_, caller) in store.functions() {
            let caller_id = caller.id();
            let mut seen = HashSet::new();

            for site in call_sites(caller) {
                let Some((callee, resolution)) = self.match_site(store, caller, &site) else {
                    continue;
                };
                let callee_id = callee.id();
                if seen.insert(callee_id.clone()) {
                    edges.push(CallEdge {
                        caller: caller_id.clone(),
                        callee: callee_id,
                        resolution,
                    });
                }
            }
        }

        edges
    }

    /// Callee -> caller edges, found by re-testing every mention of each
    /// callee's name from the callee's side
    pub fn resolve_callers(&self, store: &KnowledgeStore) -> Vec<CallEdge> {
        let mut mentions: HashMap<&str, Vec<(&FunctionDecl, CallSite<'_>)>> = HashMap::new();
        for (_, caller) in store.functions() {
            for site in call_sites(caller) {
                mentions.entry(site.name).or_default().push((caller, site));
            }
        }

        let mut edges = Vec::new();
        for (_, callee) in store.functions() {
            let Some(sites) = mentions.get(callee.name.as_str()) else {
                continue;
            };
            let callee_id = callee.id();
            let mut seen = HashSet::new();

            for (caller, site) in sites {
                match self.match_site(store, caller, site) {
                    Some((found, resolution)) if found.id() == callee_id => {
                        let caller_id = caller.id();
                        if seen.insert(caller_id.clone()) {
                            edges.push(CallEdge {
                                caller: caller_id,
                                callee: callee_id.clone(),
                                resolution,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        edges
    }

    fn match_site<'s>(
        &self,
        store: &'s KnowledgeStore,
        caller: &FunctionDecl,
        site: &CallSite<'_>,
    ) -> Option<(&'s FunctionDecl, CallResolution)> {
        let candidates = store.all_functions_named(site.name);
        if candidates.is_empty() {
            return None;
        }
        let caller_id = caller.id();
        let not_caller = |decl: &&&FunctionDecl| decl.id() != caller_id;

        let Some(selector) = site.selector else {
            return candidates
                .iter()
                .filter(not_caller)
                .find(|decl| !decl.is_method() && decl.package == caller.package)
                .map(|decl| (*decl, CallResolution::Package));
        };

        let alias = store
            .source_file(&caller.file)
            .and_then(|file| file.import_alias(selector));

        let restricted = match alias {
            Some(alias) => {
                let target = alias.target_package();
                candidates
                    .iter()
                    .filter(not_caller)
                    .find(|decl| decl.package == target)
                    .map(|decl| (*decl, CallResolution::Import))
            }
            // receiver names are compared across packages; a free caller
            // matches receiver-less functions
            None => candidates
                .iter()
                .filter(not_caller)
                .find(|decl| decl.receiver == caller.receiver)
                .map(|decl| (*decl, CallResolution::Receiver)),
        };
        if restricted.is_some() {
            return restricted;
        }

        if self.config.unique_name_fallback {
            if let [only] = candidates.as_slice() {
                if only.id() != caller_id {
                    log::debug!(
                        "Call {selector}.{}( in {caller_id} resolved by unique name to {}",
                        site.name,
                        only.id()
                    );
                    return Some((*only, CallResolution::UniqueNameFallback));
                }
            }
        }

        None
    }
}

/// Call sites of a function body.
///
/// The signature line is skipped (apart from anything after its opening
/// brace), as are blank lines, comment lines and lines calling the
/// function's own name.
fn call_sites(decl: &FunctionDecl) -> Vec<CallSite<'_>> {
    let mut lines = decl.source.lines();
    let mut body = Vec::new();
    if let Some((_, rest)) = lines.next().and_then(|signature| signature.split_once('{')) {
        body.push(rest);
    }
    body.extend(lines);

    let mut sites = Vec::new();
    for line in body {
        if is_skipped(line) {
            continue;
        }
        let found = scan_line(line);
        if found.iter().any(|site| site.name == decl.name) {
            continue;
        }
        sites.extend(found);
    }
    sites
}

fn is_skipped(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.starts_with("//")
        || line.starts_with("/*")
        || line.starts_with("*/")
        || line.starts_with("* ")
        || line == "*"
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn scan_line(line: &str) -> Vec<CallSite<'_>> {
    let bytes = line.as_bytes();
    let mut sites = Vec::new();

    for (open, _) in line.match_indices('(') {
        let mut start = open;
        while start > 0 && is_ident_byte(bytes[start - 1]) {
            start -= 1;
        }
        if start == open || bytes[start].is_ascii_digit() {
            continue;
        }

        let selector = if start > 0 && bytes[start - 1] == b'.' {
            let dot = start - 1;
            let mut from = dot;
            while from > 0 && (is_ident_byte(bytes[from - 1]) || bytes[from - 1] == b'.') {
                from -= 1;
            }
            Some(&line[from..dot])
        } else {
            None
        };

        sites.push(CallSite {
            name: &line[start..open],
            selector,
        });
    }

    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileFacts;
    use pretty_assertions::assert_eq;

    fn triples(edges: &[CallEdge]) -> Vec<(String, String, CallResolution)> {
        edges
            .iter()
            .map(|e| (e.caller.to_string(), e.callee.to_string(), e.resolution))
            .collect()
    }

    fn resolve(store: &KnowledgeStore) -> Vec<(String, String, CallResolution)> {
        triples(&CallResolver::new(&CallResolverConfig::default()).resolve_callees(store))
    }

    #[test]
    fn scan_line_splits_free_and_dot_calls() {
        let sites = scan_line("\tx := helper(db.Open(cfg), s.cache.Get(k))");
        assert_eq!(
            sites,
            vec![
                CallSite {
                    name: "helper",
                    selector: None
                },
                CallSite {
                    name: "Open",
                    selector: Some("db")
                },
                CallSite {
                    name: "Get",
                    selector: Some("s.cache")
                },
            ]
        );
        assert!(scan_line("if (a > 1) && 2(").is_empty());
    }

    #[test]
    fn free_calls_stay_in_the_callers_package() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("a", "a/a.go")
                    .with_function(FunctionDecl::new("run").source("func run() {\n\tstart()\n}"))
                    .with_function(FunctionDecl::new("start").source("func start() {}")),
            )
            .unwrap();
        store
            .add_file(
                FileFacts::new("b", "b/b.go")
                    .with_function(FunctionDecl::new("start").source("func start() {}"))
                    .with_function(FunctionDecl::new("go").source("func go() {\n\tstart()\n}")),
            )
            .unwrap();

        assert_eq!(
            resolve(&store),
            vec![
                ("a//run".to_string(), "a//start".to_string(), CallResolution::Package),
                ("b//go".to_string(), "b//start".to_string(), CallResolution::Package),
            ]
        );
    }

    #[test]
    fn dot_calls_follow_import_aliases() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("api", "api/handler.go")
                    .import("store", "\"example.com/internal/store\"")
                    .with_function(
                        FunctionDecl::new("Handle").source("func Handle() {\n\tstore.Load()\n}"),
                    ),
            )
            .unwrap();
        store
            .add_file(
                FileFacts::new("store", "store/load.go")
                    .with_function(FunctionDecl::new("Load").source("func Load() {}")),
            )
            .unwrap();
        store
            .add_file(
                FileFacts::new("cache", "cache/load.go")
                    .with_function(FunctionDecl::new("Load").source("func Load() {}")),
            )
            .unwrap();

        assert_eq!(
            resolve(&store),
            vec![(
                "api//Handle".to_string(),
                "store//Load".to_string(),
                CallResolution::Import
            )]
        );
    }

    #[test]
    fn dot_calls_on_the_receiver_match_sibling_methods() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("cache", "cache/lru.go")
                    .with_function(
                        FunctionDecl::new("Get")
                            .receiver("LRU")
                            .source("func (c *LRU) Get(k string) {\n\tc.touch(k)\n}"),
                    )
                    .with_function(FunctionDecl::new("touch").receiver("Other"))
                    .with_function(FunctionDecl::new("touch").receiver("LRU")),
            )
            .unwrap();

        assert_eq!(
            resolve(&store),
            vec![(
                "cache/LRU/Get".to_string(),
                "cache/LRU/touch".to_string(),
                CallResolution::Receiver
            )]
        );
    }

    #[test]
    fn receiver_matches_ignore_the_package() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("a", "a/r.go").with_function(
                    FunctionDecl::new("Do")
                        .receiver("R")
                        .source("func (r *R) Do() {\n\tr.Step()\n}"),
                ),
            )
            .unwrap();
        store
            .add_file(
                FileFacts::new("b", "b/r.go")
                    .with_function(FunctionDecl::new("Step").receiver("R")),
            )
            .unwrap();
        store
            .add_file(
                FileFacts::new("c", "c/z.go")
                    .with_function(FunctionDecl::new("Step").receiver("Z")),
            )
            .unwrap();

        assert_eq!(
            resolve(&store),
            vec![("a/R/Do".to_string(), "b/R/Step".to_string(), CallResolution::Receiver)]
        );
    }

    #[test]
    fn free_callers_match_receiver_less_dot_calls() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("a", "a/run.go")
                    .with_function(FunctionDecl::new("run").source("func run() {\n\tx.helper()\n}"))
                    .with_function(FunctionDecl::new("helper")),
            )
            .unwrap();
        store
            .add_file(FileFacts::new("b", "b/helper.go").with_function(FunctionDecl::new("helper")))
            .unwrap();

        let config = CallResolverConfig::default();
        let resolver = CallResolver::new(&config);
        let expected = vec![("a//run".to_string(), "a//helper".to_string(), CallResolution::Receiver)];
        assert_eq!(triples(&resolver.resolve_callees(&store)), expected);
        assert_eq!(triples(&resolver.resolve_callers(&store)), expected);
    }

    #[test]
    fn unique_names_fall_back_and_are_marked() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("main", "main/main.go").with_function(
                    FunctionDecl::new("main").source("func main() {\n\tsrv.ListenAndServe()\n}"),
                ),
            )
            .unwrap();
        store
            .add_file(
                FileFacts::new("http", "http/server.go")
                    .with_function(FunctionDecl::new("ListenAndServe").receiver("Server")),
            )
            .unwrap();

        assert_eq!(
            resolve(&store),
            vec![(
                "main//main".to_string(),
                "http/Server/ListenAndServe".to_string(),
                CallResolution::UniqueNameFallback
            )]
        );

        let strict = CallResolverConfig {
            unique_name_fallback: false,
        };
        assert!(CallResolver::new(&strict).resolve_callees(&store).is_empty());
    }

    #[test]
    fn self_calls_comments_and_signatures_are_ignored() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("p", "p/walk.go")
                    .with_function(FunctionDecl::new("walk").source(
                        "func walk(n int) {\n\t// visit()\n\t/* visit() */\n\n\twalk(n - 1); visit()\n}",
                    ))
                    .with_function(FunctionDecl::new("visit").source("func visit() {}")),
            )
            .unwrap();

        assert!(resolve(&store).is_empty());
    }

    #[test]
    fn one_line_bodies_are_scanned_and_edges_deduplicated() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("p", "p/init.go")
                    .with_function(
                        FunctionDecl::new("init").source("func init() { setup() }\n\tsetup()"),
                    )
                    .with_function(FunctionDecl::new("setup")),
            )
            .unwrap();

        assert_eq!(
            resolve(&store),
            vec![("p//init".to_string(), "p//setup".to_string(), CallResolution::Package)]
        );
    }

    #[test]
    fn caller_pass_is_the_transpose() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("p", "p/cycle.go")
                    .with_function(FunctionDecl::new("a").source("func a() {\n\tb()\n}"))
                    .with_function(FunctionDecl::new("b").source("func b() {\n\ta()\n\tc()\n}"))
                    .with_function(FunctionDecl::new("c").source("func c() {}")),
            )
            .unwrap();

        let config = CallResolverConfig::default();
        let resolver = CallResolver::new(&config);
        let mut callees = triples(&resolver.resolve_callees(&store));
        let mut callers = triples(&resolver.resolve_callers(&store));
        callees.sort();
        callers.sort();

        assert_eq!(callees, callers);
        assert_eq!(callees.len(), 3);
    }
}
