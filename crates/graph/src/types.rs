use crate::error::{GraphError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable key of a graph node.
///
/// Rendered as `package/receiver/name` for functions (empty receiver segment
/// for free functions) and `package/name` for types and interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SymbolId {
    /// Struct type or interface
    Type { package: String, name: String },

    /// Free function (empty receiver) or method
    Function {
        package: String,
        receiver: String,
        name: String,
    },
}

impl SymbolId {
    pub fn type_id(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Type {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn function(
        package: impl Into<String>,
        receiver: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::Function {
            package: package.into(),
            receiver: receiver.into(),
            name: name.into(),
        }
    }

    pub fn package(&self) -> &str {
        match self {
            Self::Type { package, .. } | Self::Function { package, .. } => package,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Type { name, .. } | Self::Function { name, .. } => name,
        }
    }

    /// Receiver of a function identity; `None` for types.
    pub fn receiver(&self) -> Option<&str> {
        match self {
            Self::Type { .. } => None,
            Self::Function { receiver, .. } => Some(receiver),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function { .. })
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { package, name } => write!(f, "{package}/{name}"),
            Self::Function {
                package,
                receiver,
                name,
            } => write!(f, "{package}/{receiver}/{name}"),
        }
    }
}

impl FromStr for SymbolId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().trim_matches('"').split('/').collect();
        match parts.as_slice() {
            [package, name] if !package.is_empty() && !name.is_empty() => {
                Ok(Self::type_id(*package, *name))
            }
            [package, receiver, name] if !package.is_empty() && !name.is_empty() => {
                Ok(Self::function(*package, *receiver, *name))
            }
            _ => Err(GraphError::InvalidIdentity(s.to_string())),
        }
    }
}

impl TryFrom<String> for SymbolId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SymbolId> for String {
    fn from(id: SymbolId) -> Self {
        id.to_string()
    }
}

/// Local import name mapped to the imported package path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportAlias {
    pub alias: String,
    pub target: String,
}

impl ImportAlias {
    pub fn new(alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            target: target.into(),
        }
    }

    /// Package name the import target most likely declares.
    ///
    /// Last path segment, skipping a trailing `/vN` major-version segment and
    /// dropping a `.vN` suffix (`gopkg.in/yaml.v3` -> `yaml`).
    pub fn target_package(&self) -> &str {
        let path = self.target.trim_matches('"');
        let mut segments = path.rsplit('/');
        let mut last = segments.next().unwrap_or(path);
        if is_major_version(last) {
            if let Some(parent) = segments.next() {
                last = parent;
            }
        }
        match last.rsplit_once('.') {
            Some((head, tail)) if is_major_version(tail) => head,
            _ => last,
        }
    }
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// Struct-like type declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,

    /// Filled in from the owning file on ingestion
    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub file: String,

    /// Field name -> raw type text (embedded fields keyed by their type text)
    #[serde(default)]
    pub fields: IndexMap<String, String>,

    /// Full declaration source
    #[serde(default)]
    pub snippet: String,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: add a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, type_text: impl Into<String>) -> Self {
        self.fields.insert(name.into(), type_text.into());
        self
    }

    /// Builder: set source snippet
    #[must_use]
    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn id(&self) -> SymbolId {
        SymbolId::type_id(&self.package, &self.name)
    }
}

/// Interface declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,

    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub file: String,

    /// Method name -> signature text
    #[serde(default)]
    pub methods: IndexMap<String, String>,

    #[serde(default)]
    pub snippet: String,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: add a method
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.methods.insert(name.into(), signature.into());
        self
    }

    /// Builder: set source snippet
    #[must_use]
    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn id(&self) -> SymbolId {
        SymbolId::type_id(&self.package, &self.name)
    }
}

/// Function or method declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,

    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub file: String,

    /// Receiver type name, empty for free functions
    #[serde(default)]
    pub receiver: String,

    #[serde(default)]
    pub params: Vec<String>,

    #[serde(default)]
    pub returns: Vec<String>,

    /// Signature and body
    #[serde(default)]
    pub source: String,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: set receiver type name
    #[must_use]
    pub fn receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = receiver.into();
        self
    }

    /// Builder: add a parameter type
    #[must_use]
    pub fn param(mut self, type_text: impl Into<String>) -> Self {
        self.params.push(type_text.into());
        self
    }

    /// Builder: add a return type
    #[must_use]
    pub fn returns(mut self, type_text: impl Into<String>) -> Self {
        self.returns.push(type_text.into());
        self
    }

    /// Builder: set source text
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn is_method(&self) -> bool {
        !self.receiver.is_empty()
    }

    pub fn id(&self) -> SymbolId {
        SymbolId::function(&self.package, &self.receiver, &self.name)
    }
}

/// Everything the front-end extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    pub package: String,
    pub path: String,

    #[serde(default)]
    pub imports: Vec<ImportAlias>,

    #[serde(default)]
    pub types: Vec<TypeDecl>,

    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,

    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

impl FileFacts {
    pub fn new(package: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Builder: add an import alias
    #[must_use]
    pub fn import(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.imports.push(ImportAlias::new(alias, target));
        self
    }

    /// Builder: add a struct type
    #[must_use]
    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    /// Builder: add an interface
    #[must_use]
    pub fn with_interface(mut self, decl: InterfaceDecl) -> Self {
        self.interfaces.push(decl);
        self
    }

    /// Builder: add a function
    #[must_use]
    pub fn with_function(mut self, decl: FunctionDecl) -> Self {
        self.functions.push(decl);
        self
    }
}

/// Ingested file, owned by its package.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub path: String,
    pub package: String,
    pub imports: Vec<ImportAlias>,

    /// Identities of the declarations registered from this file
    pub symbols: Vec<SymbolId>,
}

impl SourceFile {
    pub fn import_alias(&self, alias: &str) -> Option<&ImportAlias> {
        self.imports.iter().find(|import| import.alias == alias)
    }
}

/// Package accumulated from all files declaring it.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub name: String,
    pub files: Vec<SourceFile>,
}

/// Node weight of the knowledge graph arena.
#[derive(Debug, Clone)]
pub enum Entity {
    Type(TypeDecl),
    Interface(InterfaceDecl),
    Function(FunctionDecl),
}

impl Entity {
    pub fn id(&self) -> SymbolId {
        match self {
            Self::Type(decl) => decl.id(),
            Self::Interface(decl) => decl.id(),
            Self::Function(decl) => decl.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Type(decl) => &decl.name,
            Self::Interface(decl) => &decl.name,
            Self::Function(decl) => &decl.name,
        }
    }

    pub fn package(&self) -> &str {
        match self {
            Self::Type(decl) => &decl.package,
            Self::Interface(decl) => &decl.package,
            Self::Function(decl) => &decl.package,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::Type(decl) => &decl.file,
            Self::Interface(decl) => &decl.file,
            Self::Function(decl) => &decl.file,
        }
    }

    /// Source text handed out by snippet collection
    pub fn source(&self) -> &str {
        match self {
            Self::Type(decl) => &decl.snippet,
            Self::Interface(decl) => &decl.snippet,
            Self::Function(decl) => &decl.source,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Type(_) => EntityKind::Type,
            Self::Interface(_) => EntityKind::Interface,
            Self::Function(_) => EntityKind::Function,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Type,
    Interface,
    Function,
}

/// Field of a struct together with the raw type text that was matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub field: String,
    pub type_text: String,
}

impl FieldKey {
    pub fn new(field: impl Into<String>, type_text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            type_text: type_text.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.type_text)
    }
}

/// How a call edge was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallResolution {
    /// `f(` matched a free function of the caller's package
    Package,

    /// `x.f(` matched a method on the caller's own receiver
    Receiver,

    /// `alias.f(` matched a function of the imported package
    Import,

    /// Nothing else matched and `f` is unique program-wide
    UniqueNameFallback,
}

impl CallResolution {
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::UniqueNameFallback)
    }
}

/// Edge weight of the knowledge graph arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Struct field references a type or interface
    Field(FieldKey),

    /// Implementor -> interface
    Implements { ambiguous: bool },

    /// Caller -> callee, found from the caller's side
    Calls(CallResolution),

    /// Callee -> caller, found from the callee's side
    CalledBy(CallResolution),
}
