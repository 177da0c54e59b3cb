//! Field type text -> known struct / interface.

use crate::config::TypeResolverConfig;
use crate::store::KnowledgeStore;
use crate::types::{EntityKind, FieldKey, ImportAlias, SymbolId};
use indexmap::IndexSet;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const BUILTIN_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "float32", "float64", "complex64", "complex128", "byte",
    "rune", "error", "any",
];

/// Struct field resolved to a declared type or interface
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldReference {
    pub source: SymbolId,
    pub key: FieldKey,
    pub target: SymbolId,
    pub target_kind: EntityKind,
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'s> {
    idx: NodeIndex,
    name: &'s str,
    package: &'s str,
    kind: EntityKind,
}

/// Every struct and interface name, grouped by package
struct Catalog<'s> {
    all: Vec<Candidate<'s>>,
    by_package: HashMap<&'s str, Vec<Candidate<'s>>>,
}

impl<'s> Catalog<'s> {
    fn build(store: &'s KnowledgeStore, builtins: &HashSet<&str>) -> Self {
        let types = store.types().map(|(idx, decl)| Candidate {
            idx,
            name: decl.name.as_str(),
            package: decl.package.as_str(),
            kind: EntityKind::Type,
        });
        let interfaces = store.interfaces().map(|(idx, decl)| Candidate {
            idx,
            name: decl.name.as_str(),
            package: decl.package.as_str(),
            kind: EntityKind::Interface,
        });

        let all: Vec<_> = types
            .chain(interfaces)
            .filter(|candidate| !builtins.contains(candidate.name))
            .collect();
        let mut by_package: HashMap<&str, Vec<Candidate>> = HashMap::new();
        for candidate in &all {
            by_package
                .entry(candidate.package)
                .or_default()
                .push(*candidate);
        }

        Self { all, by_package }
    }
}

/// Longest-matching type and interface for one piece of type text
#[derive(Debug, Default)]
struct Best<'s> {
    ty: Option<(usize, Candidate<'s>)>,
    interface: Option<(usize, Candidate<'s>)>,
}

impl<'s> Best<'s> {
    fn offer(&mut self, matched_len: usize, candidate: Candidate<'s>, home_package: &str) {
        let slot = match candidate.kind {
            EntityKind::Interface => &mut self.interface,
            _ => &mut self.ty,
        };
        let replace = match slot {
            None => true,
            Some((len, current)) => {
                matched_len > *len
                    || (matched_len == *len
                        && current.package != home_package
                        && candidate.package == home_package)
            }
        };
        if replace {
            *slot = Some((matched_len, candidate));
        }
    }

    fn winners(&self) -> impl Iterator<Item = Candidate<'s>> + '_ {
        self.ty
            .iter()
            .chain(self.interface.iter())
            .map(|(_, candidate)| *candidate)
    }
}

/// Matches raw field type text against every known struct and interface.
pub struct TypeResolver<'c> {
    config: &'c TypeResolverConfig,
}

impl<'c> TypeResolver<'c> {
    pub fn new(config: &'c TypeResolverConfig) -> Self {
        Self { config }
    }

    fn builtins(&self) -> HashSet<&str> {
        BUILTIN_TYPES
            .iter()
            .copied()
            .chain(self.config.extra_builtins.iter().map(String::as_str))
            .collect()
    }

    /// Resolve every field of every struct. Pure function of the store.
    pub fn resolve(&self, store: &KnowledgeStore) -> Vec<FieldReference> {
        let builtins = self.builtins();
        let catalog = Catalog::build(store, &builtins);
        let mut references = Vec::new();

        for (idx, decl) in store.types() {
            let imports = store
                .source_file(&decl.file)
                .map(|file| file.imports.as_slice())
                .unwrap_or(&[]);
            let source = decl.id();
            let mut found: IndexSet<(FieldKey, NodeIndex)> = IndexSet::new();

            for (field, raw) in &decl.fields {
                for (label, part) in field_parts(raw) {
                    if part.is_empty() || builtins.contains(part.as_str()) {
                        continue;
                    }
                    let best = self.best_match(&part, &catalog, imports, &decl.package);
                    for winner in best.winners() {
                        if winner.idx == idx {
                            continue;
                        }
                        found.insert((FieldKey::new(field.as_str(), label.as_str()), winner.idx));
                    }
                }
            }

            for (key, target) in found {
                let entity = &store.graph[target];
                references.push(FieldReference {
                    source: source.clone(),
                    key,
                    target: entity.id(),
                    target_kind: entity.kind(),
                });
            }
        }

        references
    }

    fn best_match<'s>(
        &self,
        text: &str,
        catalog: &Catalog<'s>,
        imports: &[ImportAlias],
        home_package: &str,
    ) -> Best<'s> {
        let mut best = Best::default();
        if text.is_empty() {
            return best;
        }

        let qualifiers = qualifiers(text);
        if qualifiers.is_empty() {
            for candidate in &catalog.all {
                if pattern_matches(text, candidate.name) {
                    best.offer(candidate.name.len(), *candidate, home_package);
                }
            }
            return best;
        }

        for qualifier in qualifiers {
            let package = imports
                .iter()
                .find(|import| import.alias == qualifier)
                .map(ImportAlias::target_package)
                .unwrap_or(qualifier);
            let Some(candidates) = catalog.by_package.get(package) else {
                continue;
            };
            for candidate in candidates {
                let qualified = format!("{qualifier}.{}", candidate.name);
                if pattern_matches(text, &qualified) {
                    best.offer(qualified.len(), *candidate, home_package);
                }
            }
        }

        best
    }
}

/// Drop channel wrappers (`chan`, `<-chan`, `chan<-`) wherever they occur,
/// then all whitespace.
fn normalize(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = find_channel_keyword(rest) {
        text.push_str(rest[..pos].trim_end().trim_end_matches("<-"));
        rest = rest[pos + "chan".len()..].trim_start();
        rest = rest.strip_prefix("<-").unwrap_or(rest);
    }
    text.push_str(rest);
    text.retain(|c| !c.is_whitespace());
    text
}

/// Offset of a `chan` keyword, not part of a longer identifier.
fn find_channel_keyword(text: &str) -> Option<usize> {
    text.match_indices("chan").map(|(pos, _)| pos).find(|&pos| {
        let before = text[..pos].chars().next_back();
        let after = text[pos + "chan".len()..].chars().next();
        !before.is_some_and(is_ident_char)
            && after.is_some_and(|c| c.is_whitespace() || matches!(c, '(' | '<' | '*' | '['))
    })
}

/// `(label, normalized text)` pairs matched for one field. Map keys and
/// values are split apart before normalizing, recursively for nested maps.
fn field_parts(raw: &str) -> Vec<(String, String)> {
    if split_map(raw).is_none() {
        return vec![(raw.trim().to_string(), normalize(raw))];
    }
    map_parts(raw)
        .into_iter()
        .map(|part| (part.clone(), part))
        .collect()
}

fn map_parts(raw: &str) -> Vec<String> {
    match split_map(raw) {
        Some((key, value)) => {
            let mut parts = map_parts(key);
            parts.extend(map_parts(value));
            parts
        }
        None => vec![normalize(raw)],
    }
}

/// Split `map[K]V` (possibly nested inside another container) into key and value text.
fn split_map(text: &str) -> Option<(&str, &str)> {
    let start = text.find("map[")? + "map[".len();
    let mut depth = 1usize;
    for (offset, c) in text[start..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    return Some((&text[start..end], &text[end + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Package qualifiers in front of every `.` of the type text.
fn qualifiers(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    for (dot, _) in text.match_indices('.') {
        let head = &text[..dot];
        let start = head
            .char_indices()
            .rev()
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(pos, c)| pos + c.len_utf8())
            .unwrap_or(0);
        let qualifier = &head[start..];
        if !qualifier.is_empty() && !found.contains(&qualifier) {
            found.push(qualifier);
        }
    }
    found
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `text` denotes `name`: exact (optionally behind one `*`), as a collection
/// element, or as the key of a map.
fn pattern_matches(text: &str, name: &str) -> bool {
    if text == name || text.strip_prefix('*') == Some(name) {
        return true;
    }
    if let Some(head) = text.strip_suffix(name) {
        if head.ends_with(']') || head.ends_with("]*") {
            return true;
        }
    }
    text.starts_with("map[")
        && (text.contains(&format!("[{name}]")) || text.contains(&format!("[*{name}]")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileFacts, InterfaceDecl, TypeDecl};
    use pretty_assertions::assert_eq;

    fn resolve(store: &KnowledgeStore) -> Vec<FieldReference> {
        TypeResolver::new(&TypeResolverConfig::default()).resolve(store)
    }

    fn targets(refs: &[FieldReference], field: &str) -> Vec<String> {
        refs.iter()
            .filter(|r| r.key.field == field)
            .map(|r| r.target.to_string())
            .collect()
    }

    #[test]
    fn patterns_cover_pointers_collections_and_map_keys() {
        assert!(pattern_matches("Foo", "Foo"));
        assert!(pattern_matches("*Foo", "Foo"));
        assert!(pattern_matches("[]Foo", "Foo"));
        assert!(pattern_matches("[]*Foo", "Foo"));
        assert!(pattern_matches("[4]Foo", "Foo"));
        assert!(pattern_matches("map[Foo]int", "Foo"));
        assert!(pattern_matches("map[*Foo]int", "Foo"));
        assert!(!pattern_matches("FooBar", "Foo"));
        assert!(!pattern_matches("[]LineItem", "Item"));
        assert!(!pattern_matches("**Foo", "Foo"));
    }

    #[test]
    fn normalize_strips_channels_and_spaces() {
        assert_eq!(normalize("chan *Job"), "*Job");
        assert_eq!(normalize("<-chan Event"), "Event");
        assert_eq!(normalize("map[string] []Foo"), "map[string][]Foo");
        assert_eq!(normalize("channelConfig"), "channelConfig");
        assert_eq!(normalize("[]chan Job"), "[]Job");
        assert_eq!(normalize("chan<- *Job"), "*Job");
        assert_eq!(normalize("[]<-chan Event"), "[]Event");
    }

    #[test]
    fn nested_maps_split_into_every_key_and_value() {
        assert_eq!(
            field_parts("map[Outer]map[Kk]Val")
                .into_iter()
                .map(|(_, part)| part)
                .collect::<Vec<_>>(),
            vec!["Outer", "Kk", "Val"]
        );
        assert_eq!(
            field_parts("chan *Job"),
            vec![("chan *Job".to_string(), "*Job".to_string())]
        );
    }

    #[test]
    fn channels_inside_maps_and_slices_resolve() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("q", "q/queue.go")
                    .with_type(
                        TypeDecl::new("Queue")
                            .field("ByName", "map[string]chan *Job")
                            .field("Lanes", "[]chan Job")
                            .field("Direct", "chan *Job"),
                    )
                    .with_type(TypeDecl::new("Job")),
            )
            .unwrap();

        let refs = resolve(&store);
        assert_eq!(targets(&refs, "ByName"), vec!["q/Job"]);
        assert_eq!(targets(&refs, "Lanes"), vec!["q/Job"]);
        assert_eq!(targets(&refs, "Direct"), vec!["q/Job"]);
    }

    #[test]
    fn nested_map_keys_are_not_shadowed_by_values() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("m", "m/m.go")
                    .with_type(TypeDecl::new("Table").field("Deep", "map[Outer]map[Kk]Val"))
                    .with_type(TypeDecl::new("Outer"))
                    .with_type(TypeDecl::new("Kk"))
                    .with_type(TypeDecl::new("Val")),
            )
            .unwrap();

        let refs = resolve(&store);
        let keys: Vec<_> = refs.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["Deep:Outer", "Deep:Kk", "Deep:Val"]);
        assert_eq!(targets(&refs, "Deep"), vec!["m/Outer", "m/Kk", "m/Val"]);
    }

    #[test]
    fn split_map_balances_brackets() {
        assert_eq!(split_map("map[string]*Foo"), Some(("string", "*Foo")));
        assert_eq!(split_map("map[[2]Key]Val"), Some(("[2]Key", "Val")));
        assert_eq!(split_map("[]map[Foo]Bar"), Some(("Foo", "Bar")));
        assert_eq!(split_map("map[Foo"), None);
        assert_eq!(split_map("Foo"), None);
    }

    #[test]
    fn qualifiers_are_recovered_from_each_dot() {
        assert_eq!(qualifiers("pkgb.Client"), vec!["pkgb"]);
        assert_eq!(qualifiers("[]*pkg.Widget"), vec!["pkg"]);
        assert_eq!(qualifiers("map[a.K]b.V"), vec!["a", "b"]);
        assert!(qualifiers("Local").is_empty());
    }

    #[test]
    fn exact_match_beats_overlapping_names() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("m", "m/m.go")
                    .with_type(TypeDecl::new("Holder").field("A", "Foo").field("B", "*FooBar"))
                    .with_type(TypeDecl::new("Foo"))
                    .with_type(TypeDecl::new("FooBar")),
            )
            .unwrap();

        let refs = resolve(&store);
        assert_eq!(targets(&refs, "A"), vec!["m/Foo"]);
        assert_eq!(targets(&refs, "B"), vec!["m/FooBar"]);
    }

    #[test]
    fn longest_candidate_wins() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("shop", "shop/order.go")
                    .with_type(TypeDecl::new("Order").field("Lines", "[]LineItem"))
                    .with_type(TypeDecl::new("Item"))
                    .with_type(TypeDecl::new("LineItem")),
            )
            .unwrap();

        assert_eq!(targets(&resolve(&store), "Lines"), vec!["shop/LineItem"]);
    }

    #[test]
    fn qualified_field_only_searches_its_package() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("app", "app/app.go")
                    .with_type(TypeDecl::new("App").field("W", "pkg.Widget"))
                    .with_type(TypeDecl::new("Widget")),
            )
            .unwrap();
        store
            .add_file(FileFacts::new("pkg", "pkg/widget.go").with_type(TypeDecl::new("Widget")))
            .unwrap();

        assert_eq!(targets(&resolve(&store), "W"), vec!["pkg/Widget"]);
    }

    #[test]
    fn qualifier_goes_through_the_import_table() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("a", "a/service.go")
                    .import("pkgb", "\"example.com/b\"")
                    .with_type(TypeDecl::new("Service").field("Client", "pkgb.Client")),
            )
            .unwrap();
        store
            .add_file(FileFacts::new("b", "b/client.go").with_type(TypeDecl::new("Client")))
            .unwrap();

        let refs = resolve(&store);
        assert_eq!(targets(&refs, "Client"), vec!["b/Client"]);
        assert_eq!(refs[0].key.to_string(), "Client:pkgb.Client");
    }

    #[test]
    fn map_fields_record_key_and_value() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("m", "m/m.go")
                    .with_type(TypeDecl::new("Index").field("ByKey", "map[*Key][]Value"))
                    .with_type(TypeDecl::new("Key"))
                    .with_type(TypeDecl::new("Value")),
            )
            .unwrap();

        let refs = resolve(&store);
        let keys: Vec<_> = refs.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["ByKey:*Key", "ByKey:[]Value"]);
        assert_eq!(targets(&refs, "ByKey"), vec!["m/Key", "m/Value"]);
    }

    #[test]
    fn type_and_interface_winners_are_both_kept() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("x", "x/x.go")
                    .with_type(TypeDecl::new("Holder").field("Src", "chan Reader"))
                    .with_interface(InterfaceDecl::new("Reader").method("Read", "Read() error")),
            )
            .unwrap();
        store
            .add_file(FileFacts::new("y", "y/y.go").with_type(TypeDecl::new("Reader")))
            .unwrap();

        let refs = resolve(&store);
        let kinds: Vec<_> = refs.iter().map(|r| (r.target.to_string(), r.target_kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("y/Reader".to_string(), EntityKind::Type),
                ("x/Reader".to_string(), EntityKind::Interface),
            ]
        );
    }

    #[test]
    fn builtins_and_self_references_are_skipped() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("t", "t/tree.go")
                    .with_type(
                        TypeDecl::new("Node")
                            .field("Name", "string")
                            .field("Children", "[]*Node")
                            .field("Stamp", "Time"),
                    )
                    .with_type(TypeDecl::new("Time")),
            )
            .unwrap();

        assert_eq!(targets(&resolve(&store), "Children"), Vec::<String>::new());
        assert_eq!(targets(&resolve(&store), "Stamp"), vec!["t/Time"]);

        let config = TypeResolverConfig {
            extra_builtins: vec!["Time".to_string()],
        };
        assert!(TypeResolver::new(&config).resolve(&store).is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut store = KnowledgeStore::new();
        store
            .add_file(
                FileFacts::new("m", "m/m.go")
                    .with_type(TypeDecl::new("A").field("B", "*B").field("Cs", "map[string]C"))
                    .with_type(TypeDecl::new("B"))
                    .with_type(TypeDecl::new("C")),
            )
            .unwrap();

        assert_eq!(resolve(&store), resolve(&store));
    }
}
