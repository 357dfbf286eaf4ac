//! Resolved type graph
//!
//! Data structures for the schema-to-type resolution engine: the canonical
//! [`TypePath`] addressing scheme, the resolved [`TypeDescriptor`] output
//! unit, and the [`TypeGraph`] engine state threaded through every
//! resolution call (descriptor table, deferred set, name registry,
//! time-import flag).
//!
//! All engine state lives in BTree collections so iteration order, and
//! with it the produced descriptor set, is the same on every run.

pub mod resolver;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::codegen::config::GeneratorConfig;
use crate::schema::SchemaNode;

/// Canonical structural address of a schema node within the document.
///
/// The document root is `#`; children append `/properties/<name>`,
/// `/items`, `/items/<n>`, `/definitions/<name>`, `/additionalProperties`.
/// TypePath is the sole identity used for resolution and deduplication:
/// two nodes at different paths are never the same type, except when one
/// is an internal reference to the other's path.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypePath(String);

impl TypePath {
    /// The document root path, `#`
    pub fn root() -> Self {
        TypePath("#".to_string())
    }

    /// The empty path, used as the parent of the document root
    pub fn empty() -> Self {
        TypePath(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "#"
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn property(&self, name: &str) -> Self {
        TypePath(format!("{}/properties/{}", self.0, name))
    }

    pub fn items(&self) -> Self {
        TypePath(format!("{}/items", self.0))
    }

    pub fn items_at(&self, index: usize) -> Self {
        TypePath(format!("{}/items/{}", self.0, index))
    }

    pub fn definition(&self, name: &str) -> Self {
        TypePath(format!("{}/definitions/{}", self.0, name))
    }

    pub fn additional_properties(&self) -> Self {
        TypePath(format!("{}/additionalProperties", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypePath {
    fn from(s: &str) -> Self {
        TypePath(s.to_string())
    }
}

impl From<String> for TypePath {
    fn from(s: String) -> Self {
        TypePath(s)
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A primitive target-language type aliased by a descriptor or field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// `format: "date-time"` override; requires the time import
    Timestamp,
    /// Untyped value
    Any,
}

impl Primitive {
    /// The Go keyword this primitive renders to
    pub fn go_keyword(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Integer => "int",
            Primitive::Number => "float64",
            Primitive::Boolean => "bool",
            Primitive::Null => "nil",
            Primitive::Timestamp => "time.Time",
            Primitive::Any => "interface{}",
        }
    }
}

/// Structural kind of a resolved descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Alias of a primitive keyword
    Primitive(Primitive),
    /// Nested structure with named fields
    Struct,
    /// Homogeneous collection; `None` means untyped elements
    Collection(Option<TypePath>),
    /// Associative map keyed by string; `None` means untyped values
    Map(Option<TypePath>),
    /// Alias of another descriptor (a named definition that is a bare
    /// internal reference)
    Reference(TypePath),
}

/// Value type of a struct field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Primitive(Primitive),
    /// The field aliases another descriptor
    Ref(TypePath),
    Collection(Option<TypePath>),
    Map(Option<TypePath>),
}

/// One resolved struct field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Generated field name, always exported
    pub name: String,
    pub value: FieldType,
    pub nullable: bool,
    /// Original property name, preserved for the wire-format tag
    pub property_name: String,
    /// Drives `omitempty` in the serialization tag
    pub required: bool,
}

/// The resolved output unit: one type declaration to be emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Generated type name (may be renamed by deduplication)
    pub name: String,
    pub kind: TypeKind,
    pub nullable: bool,
    /// Fields, ordered by generated name at finalization
    pub fields: Vec<FieldDescriptor>,
    pub doc: Option<String>,
    /// Pre-disambiguation name; mutated only by the deduplicator
    pub orig_name: String,
    /// Structural parent path; empty for the document root
    pub parent: TypePath,
}

/// A schema node held back until its dependency becomes resolvable
#[derive(Debug, Clone)]
pub struct DeferredEntry {
    pub node: SchemaNode,
    pub name: String,
    pub desc: Option<String>,
    pub parent: TypePath,
    /// Set for named-definition entries, so a resolution landing on a
    /// foreign path registers an alias descriptor
    pub alias_def: bool,
}

/// Mapping from generated name to the set of paths claiming it
#[derive(Debug, Default)]
pub struct NameRegistry {
    by_name: BTreeMap<String, BTreeSet<TypePath>>,
}

impl NameRegistry {
    pub fn add(&mut self, name: String, path: TypePath) {
        self.by_name.entry(name).or_default().insert(path);
    }

    pub fn remove(&mut self, name: &str, path: &TypePath) {
        if let Some(paths) = self.by_name.get_mut(name) {
            paths.remove(path);
            if paths.is_empty() {
                self.by_name.remove(name);
            }
        }
    }

    pub fn paths(&self, name: &str) -> Option<&BTreeSet<TypePath>> {
        self.by_name.get(name)
    }

    pub fn is_colliding(&self, name: &str) -> bool {
        self.paths(name).map(|p| p.len() > 1).unwrap_or(false)
    }

    /// Names currently claimed by more than one path, with their claimants
    pub fn collisions(&self) -> Vec<(String, Vec<TypePath>)> {
        self.by_name
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(name, paths)| (name.clone(), paths.iter().cloned().collect()))
            .collect()
    }
}

/// Engine state for one resolution run.
///
/// Built by [`resolver`], renamed in place by the deduplication pass, then
/// read out in emission order. Descriptors are created once and only ever
/// renamed afterward, never restructured.
#[derive(Debug)]
pub struct TypeGraph {
    pub(crate) config: GeneratorConfig,
    pub(crate) descriptors: BTreeMap<TypePath, TypeDescriptor>,
    pub(crate) deferred: BTreeMap<TypePath, DeferredEntry>,
    pub(crate) names: NameRegistry,
    pub(crate) needs_time_import: bool,
}

impl TypeGraph {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            descriptors: BTreeMap::new(),
            deferred: BTreeMap::new(),
            names: NameRegistry::default(),
            needs_time_import: false,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Look up a resolved descriptor by path
    pub fn get(&self, path: &TypePath) -> Option<&TypeDescriptor> {
        self.descriptors.get(path)
    }

    /// Generated name of the descriptor at `path`, if resolved
    pub fn name_of(&self, path: &TypePath) -> Option<&str> {
        self.descriptors.get(path).map(|d| d.name.as_str())
    }

    /// Whether any descriptor aliased the timestamp type
    pub fn needs_time_import(&self) -> bool {
        self.needs_time_import
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// All descriptors in the deterministic emission order (by name)
    pub fn ordered_descriptors(&self) -> Vec<&TypeDescriptor> {
        let mut descriptors: Vec<&TypeDescriptor> = self.descriptors.values().collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Register a descriptor under its path and claim its name.
    ///
    /// Nodes that defer still register their partially-built descriptor,
    /// which is what lets a reference to an in-flight ancestor (the
    /// document root included) resolve; re-resolution overwrites it.
    pub(crate) fn register(&mut self, path: &TypePath, descriptor: TypeDescriptor) {
        self.names.add(descriptor.name.clone(), path.clone());
        self.descriptors.insert(path.clone(), descriptor);
    }

    pub(crate) fn defer(
        &mut self,
        path: &TypePath,
        node: &SchemaNode,
        name: &str,
        desc: Option<&str>,
        parent: &TypePath,
    ) {
        let alias_def = self
            .deferred
            .get(path)
            .map(|entry| entry.alias_def)
            .unwrap_or(false);
        self.deferred.insert(
            path.clone(),
            DeferredEntry {
                node: node.clone(),
                name: name.to_string(),
                desc: desc.map(String::from),
                parent: parent.clone(),
                alias_def,
            },
        );
    }
}
