use crate::config::FrontendConfig;
use crate::error::{FrontendError, Result};
use relmap_graph::{FileFacts, FunctionDecl, ImportAlias, InterfaceDecl, TypeDecl};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Declaration extractor for Go sources
pub struct GoExtractor {
    config: FrontendConfig,
    parser: Parser,
}

impl GoExtractor {
    pub fn new(config: FrontendConfig) -> Result<Self> {
        config.validate()?;

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| FrontendError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { config, parser })
    }

    /// Read and extract one file; `root` only shortens the recorded path
    pub fn extract_file(&mut self, root: &Path, path: &Path) -> Result<FileFacts> {
        let label = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let bytes = std::fs::read(path)?;
        let source = String::from_utf8(bytes).map_err(|_| FrontendError::Utf8 {
            path: label.clone(),
        })?;

        self.extract(&label, &source)
    }

    /// Extract the declarations of one source text
    pub fn extract(&mut self, path: &str, source: &str) -> Result<FileFacts> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| FrontendError::parse(path, "Failed to parse source code"))?;
        let root = tree.root_node();

        if self.config.reject_syntax_errors && root.has_error() {
            let line = first_error(root).map_or(0, |node| node.start_position().row + 1);
            return Err(FrontendError::parse(path, format!("syntax error at line {line}")));
        }

        let mut facts = FileFacts::new(String::new(), path);
        let mut cursor = root.walk();
        let children: Vec<_> = root.named_children(&mut cursor).collect();

        for child in children {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = first_named_child(child) {
                        facts.package = text(name, source).to_string();
                    }
                }
                "import_declaration" => extract_imports(child, source, &mut facts.imports),
                "type_declaration" => extract_types(child, source, &mut facts),
                "function_declaration" | "method_declaration" => {
                    if let Some(decl) = extract_function(child, source) {
                        facts.functions.push(decl);
                    }
                }
                _ => {}
            }
        }

        if facts.package.is_empty() {
            return Err(FrontendError::parse(path, "missing package clause"));
        }

        log::debug!(
            "Extracted {path}: package {}, {} imports, {} types, {} interfaces, {} functions",
            facts.package,
            facts.imports.len(),
            facts.types.len(),
            facts.interfaces.len(),
            facts.functions.len()
        );
        Ok(facts)
    }
}

fn text<'s>(node: Node, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

fn first_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let child = node.named_children(&mut cursor).next();
    child
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn extract_imports(node: Node, source: &str, imports: &mut Vec<ImportAlias>) {
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();

    for child in children {
        match child.kind() {
            "import_spec" => {
                if let Some(import) = import_spec(child, source) {
                    imports.push(import);
                }
            }
            "import_spec_list" => extract_imports(child, source, imports),
            _ => {}
        }
    }
}

fn import_spec(node: Node, source: &str) -> Option<ImportAlias> {
    let target = text(node.child_by_field_name("path")?, source)
        .trim_matches(|c| c == '"' || c == '`')
        .to_string();

    match node.child_by_field_name("name") {
        Some(name) if name.kind() == "package_identifier" => {
            Some(ImportAlias::new(text(name, source), target))
        }
        // `_` and `.` imports bind no name
        Some(_) => None,
        None => {
            let mut import = ImportAlias::new(String::new(), target);
            import.alias = import.target_package().to_string();
            Some(import)
        }
    }
}

fn extract_types(node: Node, source: &str, facts: &mut FileFacts) {
    let mut cursor = node.walk();
    let specs: Vec<_> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "type_spec")
        .collect();

    for spec in specs {
        let (Some(name), Some(body)) =
            (spec.child_by_field_name("name"), spec.child_by_field_name("type"))
        else {
            continue;
        };
        let name = text(name, source);
        // Specs of a grouped `type (...)` block get their own keyword
        let snippet = format!("type {}", text(spec, source));

        match body.kind() {
            "struct_type" => {
                let mut decl = TypeDecl::new(name).snippet(snippet);
                for (field, type_text) in struct_fields(body, source) {
                    decl = decl.field(field, type_text);
                }
                facts.types.push(decl);
            }
            "interface_type" => {
                let mut decl = InterfaceDecl::new(name).snippet(snippet);
                for (method, signature) in interface_methods(body, source) {
                    decl = decl.method(method, signature);
                }
                facts.interfaces.push(decl);
            }
            _ => {}
        }
    }
}

/// Field name -> type text; embedded fields are keyed by their type text
fn struct_fields(node: Node, source: &str) -> Vec<(String, String)> {
    let mut cursor = node.walk();
    let Some(list) = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "field_declaration_list")
    else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    let mut cursor = list.walk();
    let declarations: Vec<_> = list
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "field_declaration")
        .collect();

    for declaration in declarations {
        let Some(ty) = declaration.child_by_field_name("type") else {
            continue;
        };

        let mut cursor = declaration.walk();
        let names: Vec<_> = declaration
            .children_by_field_name("name", &mut cursor)
            .map(|name| text(name, source).to_string())
            .collect();

        if names.is_empty() {
            // `*Base` keeps its star: the type node starts after it
            let embedded = source
                .get(declaration.start_byte()..ty.end_byte())
                .unwrap_or("")
                .to_string();
            fields.push((embedded.clone(), embedded));
        } else {
            let type_text = text(ty, source);
            fields.extend(names.into_iter().map(|name| (name, type_text.to_string())));
        }
    }

    fields
}

fn interface_methods(node: Node, source: &str) -> Vec<(String, String)> {
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();

    children
        .into_iter()
        .filter(|child| matches!(child.kind(), "method_elem" | "method_spec"))
        .filter_map(|method| {
            let name = method.child_by_field_name("name")?;
            Some((text(name, source).to_string(), text(method, source).to_string()))
        })
        .collect()
}

fn extract_function(node: Node, source: &str) -> Option<FunctionDecl> {
    let name = text(node.child_by_field_name("name")?, source);
    let mut decl = FunctionDecl::new(name).source(text(node, source));

    if let Some(receiver) = node.child_by_field_name("receiver") {
        decl = decl.receiver(receiver_type(receiver, source));
    }
    if let Some(params) = node.child_by_field_name("parameters") {
        for param in parameter_types(params, source) {
            decl = decl.param(param);
        }
    }
    if let Some(result) = node.child_by_field_name("result") {
        let returns = if result.kind() == "parameter_list" {
            parameter_types(result, source)
        } else {
            vec![text(result, source).trim_start_matches('*').to_string()]
        };
        for ty in returns {
            decl = decl.returns(ty);
        }
    }

    Some(decl)
}

/// Receiver type name with pointer and type parameters stripped
fn receiver_type(receiver: Node, source: &str) -> String {
    let mut cursor = receiver.walk();
    let Some(ty) = receiver
        .named_children(&mut cursor)
        .find(|child| child.kind() == "parameter_declaration")
        .and_then(|param| param.child_by_field_name("type"))
    else {
        return String::new();
    };

    let ty = text(ty, source).trim_start_matches('*').trim();
    ty.split('[').next().unwrap_or(ty).trim().to_string()
}

/// One entry per declared name, leading `*` trimmed
fn parameter_types(list: Node, source: &str) -> Vec<String> {
    let mut cursor = list.walk();
    let params: Vec<_> = list.named_children(&mut cursor).collect();
    let mut types = Vec::new();

    for param in params {
        let variadic = match param.kind() {
            "parameter_declaration" => false,
            "variadic_parameter_declaration" => true,
            _ => continue,
        };
        let Some(ty) = param.child_by_field_name("type") else {
            continue;
        };
        let ty = text(ty, source).trim_start_matches('*');
        let ty = if variadic {
            format!("...{ty}")
        } else {
            ty.to_string()
        };

        let mut cursor = param.walk();
        let names = param.children_by_field_name("name", &mut cursor).count().max(1);
        types.extend(std::iter::repeat(ty).take(names));
    }

    types
}
