//! Type graph builder and deferred resolution
//!
//! `resolve_node` walks one schema node, decides its structural kind, and
//! either registers a descriptor under its path or records a deferred
//! entry when a dependency (an internal reference or a nested child) is
//! not yet resolvable. `drain_deferred` then retries the deferred set in
//! rounds to a fixpoint: each round snapshots the pending paths, attempts
//! every entry, and fails if the set did not change.

use tracing::debug;

use super::{FieldDescriptor, FieldType, Primitive, TypeDescriptor, TypeGraph, TypeKind, TypePath};
use crate::codegen::names::singularize;
use crate::error::{GeneratorError, Result};
use crate::schema::{AdditionalProperties, Category, Items, SchemaNode, TypeSpec};

/// Outcome of one resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The node resolved to this path (for references, the target's path)
    Resolved(TypePath),
    /// A dependency was not yet resolvable; a deferred entry was recorded
    Deferred,
}

/// Structural shape of a node, decided from its category and format
enum Shape {
    Object,
    Array,
    Primitive(Primitive),
}

/// A `date-time` format overrides the declared category entirely, the way
/// the emitted timestamp type replaces whatever scalar was declared.
fn shape_of(category: Option<Category>, format: Option<&str>) -> Shape {
    if format == Some("date-time") {
        return Shape::Primitive(Primitive::Timestamp);
    }
    match category {
        Some(Category::Object) => Shape::Object,
        Some(Category::Array) => Shape::Array,
        Some(Category::String) => Shape::Primitive(Primitive::String),
        Some(Category::Integer) => Shape::Primitive(Primitive::Integer),
        Some(Category::Number) => Shape::Primitive(Primitive::Number),
        Some(Category::Boolean) => Shape::Primitive(Primitive::Boolean),
        Some(Category::Null) => Shape::Primitive(Primitive::Null),
        Some(Category::Unknown) | None => Shape::Primitive(Primitive::Any),
    }
}

/// How an object-category node is realized
enum ObjectKind<'a> {
    /// Own properties, no additional-properties schema
    Struct,
    /// No own properties, a value schema for additional properties
    MapOf(&'a SchemaNode),
    /// Neither: a map of untyped values
    Untyped,
}

fn classify_object<'a>(node: &'a SchemaNode, path: &TypePath) -> Result<ObjectKind<'a>> {
    let has_properties = !node.properties.is_empty();
    match (&node.additional_properties, has_properties) {
        (Some(AdditionalProperties::Schema(schema)), false) => Ok(ObjectKind::MapOf(schema)),
        (Some(AdditionalProperties::Schema(_)), true) => {
            Err(GeneratorError::UnsupportedObject { path: path.clone() })
        }
        (Some(AdditionalProperties::Allowed(true)), true) => Ok(ObjectKind::Untyped),
        (_, true) => Ok(ObjectKind::Struct),
        (_, false) => Ok(ObjectKind::Untyped),
    }
}

impl TypeGraph {
    /// Resolve a full document: the root node, its definitions, and the
    /// deferred set, to completion. The root descriptor is named by the
    /// configured root type name and is always nullable, which is what
    /// breaks a self-reference at the document root.
    pub fn resolve_document(&mut self, root: &SchemaNode) -> Result<()> {
        if self.config.root_type_name.is_empty() {
            return Err(GeneratorError::EmptyIdentifier {
                input: String::new(),
            });
        }
        let root_name = self.config.root_type_name.clone();
        let root_desc = root.description().map(String::from);
        self.resolve_node(
            root,
            &root_name,
            root_desc.as_deref(),
            &TypePath::root(),
            &TypePath::empty(),
        )?;
        self.drain_deferred()
    }

    /// Resolve one schema node at `path`.
    ///
    /// Callers receiving [`Resolution::Deferred`] must treat their own
    /// resolution as incomplete and defer themselves.
    pub fn resolve_node(
        &mut self,
        node: &SchemaNode,
        proposed_name: &str,
        proposed_desc: Option<&str>,
        path: &TypePath,
        parent: &TypePath,
    ) -> Result<Resolution> {
        if !node.definitions.is_empty() {
            self.resolve_definitions(node, path)?;
        }

        // references are aliases, not copies: no new descriptor
        if let Some(reference) = node.reference.as_deref() {
            let target = TypePath::from(reference);
            if self.descriptors.contains_key(&target) {
                return Ok(Resolution::Resolved(target));
            }
            self.defer(path, node, proposed_name, proposed_desc, parent);
            return Ok(Resolution::Deferred);
        }

        let (name, orig_name) = if path.is_root() {
            let root = self.config.root_type_name.clone();
            (root.clone(), root)
        } else {
            let orig = node.title().unwrap_or(proposed_name).to_string();
            let name = self.config.type_name(&orig)?;
            (name, orig)
        };

        let mut nullable = path.is_root();
        let category = match node.type_spec {
            TypeSpec::Absent => None,
            TypeSpec::Single(c) => Some(c),
            TypeSpec::NullableUnion(c) => {
                nullable = true;
                Some(c)
            }
        };

        let mut descriptor = TypeDescriptor {
            name,
            kind: TypeKind::Primitive(Primitive::Any),
            nullable,
            fields: Vec::new(),
            doc: node
                .description()
                .map(String::from)
                .or_else(|| proposed_desc.map(String::from)),
            orig_name,
            parent: parent.clone(),
        };

        match shape_of(category, node.format.as_deref()) {
            Shape::Object => match classify_object(node, path)? {
                ObjectKind::Struct => {
                    descriptor.kind = TypeKind::Struct;
                }
                ObjectKind::MapOf(value_schema) => {
                    let value_name = singularize(&descriptor.orig_name);
                    let value_path = path.additional_properties();
                    match self.resolve_node(
                        value_schema,
                        &value_name,
                        node.description(),
                        &value_path,
                        path,
                    )? {
                        Resolution::Resolved(value) => {
                            descriptor.kind = TypeKind::Map(Some(value));
                        }
                        Resolution::Deferred => {
                            return Ok(self.defer_parent(
                                path,
                                descriptor,
                                node,
                                proposed_name,
                                proposed_desc,
                                parent,
                            ));
                        }
                    }
                }
                ObjectKind::Untyped => {
                    descriptor.kind = TypeKind::Map(None);
                }
            },
            Shape::Array => match node.items.as_ref() {
                Some(Items::Single(item)) => {
                    let element_name = singularize(&descriptor.orig_name);
                    match self.resolve_element(item, &element_name, node, &path.items(), path)? {
                        Some(element) => descriptor.kind = TypeKind::Collection(Some(element)),
                        None => {
                            return Ok(self.defer_parent(
                                path,
                                descriptor,
                                node,
                                proposed_name,
                                proposed_desc,
                                parent,
                            ));
                        }
                    }
                }
                Some(Items::Tuple(items)) if items.len() == 1 => {
                    let element_name = singularize(&descriptor.orig_name);
                    match self.resolve_element(
                        &items[0],
                        &element_name,
                        node,
                        &path.items_at(0),
                        path,
                    )? {
                        Some(element) => descriptor.kind = TypeKind::Collection(Some(element)),
                        None => {
                            return Ok(self.defer_parent(
                                path,
                                descriptor,
                                node,
                                proposed_name,
                                proposed_desc,
                                parent,
                            ));
                        }
                    }
                }
                _ => {
                    descriptor.kind = TypeKind::Collection(None);
                }
            },
            Shape::Primitive(primitive) => {
                if primitive == Primitive::Timestamp {
                    self.needs_time_import = true;
                }
                descriptor.kind = TypeKind::Primitive(primitive);
            }
        }

        if matches!(descriptor.kind, TypeKind::Struct) {
            for (property_name, property) in &node.properties {
                match self.resolve_field(property_name, property, node, path)? {
                    Some(field) => descriptor.fields.push(field),
                    None => {
                        return Ok(self.defer_parent(
                            path,
                            descriptor,
                            node,
                            proposed_name,
                            proposed_desc,
                            parent,
                        ));
                    }
                }
            }
            descriptor.fields.sort_by(|a, b| a.name.cmp(&b.name));
        }

        self.register(path, descriptor);
        Ok(Resolution::Resolved(path.clone()))
    }

    /// Resolve a collection or map element schema; `None` means the
    /// element deferred and the caller must defer itself.
    fn resolve_element(
        &mut self,
        element: &SchemaNode,
        element_name: &str,
        container: &SchemaNode,
        element_path: &TypePath,
        parent: &TypePath,
    ) -> Result<Option<TypePath>> {
        match self.resolve_node(
            element,
            element_name,
            container.description(),
            element_path,
            parent,
        )? {
            Resolution::Resolved(path) => Ok(Some(path)),
            Resolution::Deferred => Ok(None),
        }
    }

    /// Build one struct field; `None` means a dependency deferred and the
    /// whole parent node must defer.
    fn resolve_field(
        &mut self,
        property_name: &str,
        property: &SchemaNode,
        node: &SchemaNode,
        path: &TypePath,
    ) -> Result<Option<FieldDescriptor>> {
        let required = node.is_required(property_name);
        let seed = property.title().unwrap_or(property_name);
        let field_name = self.config.field_name(seed)?;

        // reference fields alias the target descriptor and inherit its
        // nullability
        if let Some(reference) = property.reference.as_deref() {
            let target = TypePath::from(reference);
            return match self.descriptors.get(&target).map(|d| d.nullable) {
                Some(nullable) => Ok(Some(FieldDescriptor {
                    name: field_name,
                    value: FieldType::Ref(target),
                    nullable,
                    property_name: property_name.to_string(),
                    required,
                })),
                None => Ok(None),
            };
        }

        let field_path = path.property(property_name);
        let mut nullable = false;
        let category = match property.type_spec {
            TypeSpec::Absent => {
                // an untyped field stays untyped regardless of format
                return Ok(Some(FieldDescriptor {
                    name: field_name,
                    value: FieldType::Primitive(Primitive::Any),
                    nullable,
                    property_name: property_name.to_string(),
                    required,
                }));
            }
            TypeSpec::Single(c) => c,
            TypeSpec::NullableUnion(c) => {
                nullable = true;
                c
            }
        };

        let value = match shape_of(Some(category), property.format.as_deref()) {
            Shape::Object => match classify_object(property, &field_path)? {
                ObjectKind::Struct => {
                    match self.resolve_node(
                        property,
                        &field_name,
                        property.description(),
                        &field_path,
                        path,
                    )? {
                        Resolution::Resolved(p) => FieldType::Ref(p),
                        Resolution::Deferred => return Ok(None),
                    }
                }
                ObjectKind::MapOf(value_schema) => {
                    let value_name = singularize(property_name);
                    match self.resolve_element(
                        value_schema,
                        &value_name,
                        property,
                        &field_path.additional_properties(),
                        path,
                    )? {
                        Some(p) => FieldType::Map(Some(p)),
                        None => return Ok(None),
                    }
                }
                ObjectKind::Untyped => FieldType::Map(None),
            },
            Shape::Array => match property.items.as_ref() {
                Some(Items::Single(item)) => {
                    let element_name = singularize(property_name);
                    match self.resolve_element(
                        item,
                        &element_name,
                        property,
                        &field_path.items(),
                        path,
                    )? {
                        Some(p) => FieldType::Collection(Some(p)),
                        None => return Ok(None),
                    }
                }
                Some(Items::Tuple(items)) if items.len() == 1 => {
                    let element_name = singularize(property_name);
                    match self.resolve_element(
                        &items[0],
                        &element_name,
                        property,
                        &field_path.items_at(0),
                        path,
                    )? {
                        Some(p) => FieldType::Collection(Some(p)),
                        None => return Ok(None),
                    }
                }
                _ => FieldType::Collection(None),
            },
            Shape::Primitive(primitive) => {
                if primitive == Primitive::Timestamp {
                    self.needs_time_import = true;
                }
                FieldType::Primitive(primitive)
            }
        };

        Ok(Some(FieldDescriptor {
            name: field_name,
            value,
            nullable,
            property_name: property_name.to_string(),
            required,
        }))
    }

    /// Resolve each nested definition as an independent named type,
    /// parented at `path`. A definition that is itself a bare reference
    /// registers an alias descriptor once its target resolves.
    fn resolve_definitions(&mut self, node: &SchemaNode, path: &TypePath) -> Result<()> {
        for (definition_name, definition) in &node.definitions {
            let definition_path = path.definition(definition_name);
            match self.resolve_node(
                definition,
                definition_name,
                definition.description(),
                &definition_path,
                path,
            )? {
                Resolution::Resolved(target) if target != definition_path => {
                    self.register_alias(&definition_path, &target, definition, definition_name, path)?;
                }
                Resolution::Resolved(_) => {}
                Resolution::Deferred => {
                    if let Some(entry) = self.deferred.get_mut(&definition_path) {
                        entry.alias_def = true;
                    }
                }
            }
        }
        Ok(())
    }

    fn register_alias(
        &mut self,
        path: &TypePath,
        target: &TypePath,
        node: &SchemaNode,
        proposed_name: &str,
        parent: &TypePath,
    ) -> Result<()> {
        let orig_name = node.title().unwrap_or(proposed_name).to_string();
        let name = self.config.type_name(&orig_name)?;
        let nullable = self
            .descriptors
            .get(target)
            .map(|d| d.nullable)
            .unwrap_or(false);
        let descriptor = TypeDescriptor {
            name,
            kind: TypeKind::Reference(target.clone()),
            nullable,
            fields: Vec::new(),
            doc: node.description().map(String::from),
            orig_name,
            parent: parent.clone(),
        };
        self.register(path, descriptor);
        Ok(())
    }

    fn defer_parent(
        &mut self,
        path: &TypePath,
        descriptor: TypeDescriptor,
        node: &SchemaNode,
        proposed_name: &str,
        proposed_desc: Option<&str>,
        parent: &TypePath,
    ) -> Resolution {
        self.register(path, descriptor);
        self.defer(path, node, proposed_name, proposed_desc, parent);
        Resolution::Deferred
    }

    /// Drain the deferred set to empty.
    ///
    /// Each round snapshots the pending paths, re-attempts every entry,
    /// and compares; an unchanged set means no entry can ever make
    /// progress and resolution fails with the full stuck set.
    pub fn drain_deferred(&mut self) -> Result<()> {
        let mut round = 0usize;
        while !self.deferred.is_empty() {
            round += 1;
            let snapshot: Vec<TypePath> = self.deferred.keys().cloned().collect();
            debug!(round, pending = snapshot.len(), "retrying deferred schema paths");

            for path in &snapshot {
                let entry = match self.deferred.get(path) {
                    Some(entry) => entry.clone(),
                    None => continue,
                };
                match self.resolve_node(
                    &entry.node,
                    &entry.name,
                    entry.desc.as_deref(),
                    path,
                    &entry.parent,
                )? {
                    Resolution::Resolved(target) => {
                        self.deferred.remove(path);
                        if entry.alias_def && target != *path {
                            self.register_alias(path, &target, &entry.node, &entry.name, &entry.parent)?;
                        }
                    }
                    Resolution::Deferred => {}
                }
            }

            let after: Vec<TypePath> = self.deferred.keys().cloned().collect();
            if after == snapshot {
                return Err(GeneratorError::Unresolvable { paths: after });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::config::GeneratorConfig;

    fn graph_for(json: serde_json::Value) -> TypeGraph {
        let node: SchemaNode = serde_json::from_value(json).unwrap();
        let config = GeneratorConfig {
            root_type_name: "root".to_string(),
            ..Default::default()
        };
        let mut graph = TypeGraph::new(config);
        graph.resolve_document(&node).unwrap();
        graph
    }

    #[test]
    fn test_scalar_root() {
        let graph = graph_for(serde_json::json!({"type": "string"}));
        let root = graph.get(&TypePath::root()).unwrap();
        assert_eq!(root.kind, TypeKind::Primitive(Primitive::String));
        assert!(root.nullable);
    }

    #[test]
    fn test_struct_fields_sorted_by_name() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "integer"},
                "alpha": {"type": "string"}
            },
            "required": ["alpha"]
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        assert_eq!(root.kind, TypeKind::Struct);
        let names: Vec<&str> = root.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert!(root.fields[0].required);
        assert!(!root.fields[1].required);
    }

    #[test]
    fn test_nullable_union_field_both_orders() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "properties": {
                "a": {"type": ["string", "null"]},
                "b": {"type": ["null", "integer"]}
            }
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        let a = root.fields.iter().find(|f| f.property_name == "a").unwrap();
        assert_eq!(a.value, FieldType::Primitive(Primitive::String));
        assert!(a.nullable);
        let b = root.fields.iter().find(|f| f.property_name == "b").unwrap();
        assert_eq!(b.value, FieldType::Primitive(Primitive::Integer));
        assert!(b.nullable);
    }

    #[test]
    fn test_untyped_union_field() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "properties": {
                "x": {"type": ["string", "integer", "null"]},
                "y": {"type": ["string", "integer"]}
            }
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        for field in &root.fields {
            assert_eq!(field.value, FieldType::Primitive(Primitive::Any));
            assert!(!field.nullable);
        }
    }

    #[test]
    fn test_shared_reference_resolves_to_one_descriptor() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "definitions": {
                "address": {
                    "type": "object",
                    "properties": {"street": {"type": "string"}}
                }
            },
            "properties": {
                "home": {"$ref": "#/definitions/address"},
                "work": {"$ref": "#/definitions/address"}
            }
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        let address_path = TypePath::root().definition("address");
        for field in &root.fields {
            assert_eq!(field.value, FieldType::Ref(address_path.clone()));
        }
        // one descriptor for the target, not a copy per referrer
        assert!(graph.get(&address_path).is_some());
        assert_eq!(graph.descriptor_count(), 2);
    }

    #[test]
    fn test_forward_reference_defers_then_resolves() {
        // "a" aliases "b", and the root field references "a" before the
        // alias exists, so both the root and "a" go through the deferred
        // fixpoint
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"type": "object", "properties": {"n": {"type": "integer"}}}
            },
            "properties": {
                "x": {"$ref": "#/definitions/a"}
            }
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        assert_eq!(
            root.fields[0].value,
            FieldType::Ref(TypePath::root().definition("a"))
        );
        let alias = graph.get(&TypePath::root().definition("a")).unwrap();
        assert_eq!(
            alias.kind,
            TypeKind::Reference(TypePath::root().definition("b"))
        );
    }

    #[test]
    fn test_root_self_reference_through_map() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "additionalProperties": {"$ref": "#"}
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        assert_eq!(root.kind, TypeKind::Map(Some(TypePath::root())));
        assert!(root.nullable);
    }

    #[test]
    fn test_unresolvable_cycle_fails_with_stuck_set() {
        let node: SchemaNode = serde_json::from_value(serde_json::json!({
            "type": "object",
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"$ref": "#/definitions/missing"}
            }
        }))
        .unwrap();
        let config = GeneratorConfig {
            root_type_name: "root".to_string(),
            ..Default::default()
        };
        let mut graph = TypeGraph::new(config);
        match graph.resolve_document(&node) {
            Err(GeneratorError::Unresolvable { paths }) => {
                assert!(paths.contains(&TypePath::root().definition("b")));
            }
            other => panic!("Expected Unresolvable, got {:?}", other),
        }
    }

    #[test]
    fn test_collection_element_singularized() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"id": {"type": "string"}}
                    }
                }
            }
        }));
        let element_path = TypePath::root().property("items").items();
        let element = graph.get(&element_path).unwrap();
        assert_eq!(element.orig_name, "item");
        assert_eq!(element.name, "item");
    }

    #[test]
    fn test_tuple_items_of_length_one_behaves_like_single() {
        let graph = graph_for(serde_json::json!({
            "type": "array",
            "items": [{"type": "string"}]
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        let element_path = TypePath::root().items_at(0);
        assert_eq!(root.kind, TypeKind::Collection(Some(element_path.clone())));
        assert_eq!(
            graph.get(&element_path).unwrap().kind,
            TypeKind::Primitive(Primitive::String)
        );
    }

    #[test]
    fn test_tuple_items_of_length_two_is_untyped() {
        let graph = graph_for(serde_json::json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "integer"}]
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        assert_eq!(root.kind, TypeKind::Collection(None));
    }

    #[test]
    fn test_date_time_format_overrides_category() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "properties": {
                "created": {"type": "string", "format": "date-time"}
            }
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        assert_eq!(
            root.fields[0].value,
            FieldType::Primitive(Primitive::Timestamp)
        );
        assert!(graph.needs_time_import());
    }

    #[test]
    fn test_properties_with_additional_properties_schema_is_an_error() {
        let node: SchemaNode = serde_json::from_value(serde_json::json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "additionalProperties": {"type": "integer"}
        }))
        .unwrap();
        let config = GeneratorConfig {
            root_type_name: "root".to_string(),
            ..Default::default()
        };
        let mut graph = TypeGraph::new(config);
        match graph.resolve_document(&node) {
            Err(GeneratorError::UnsupportedObject { path }) => {
                assert!(path.is_root());
            }
            other => panic!("Expected UnsupportedObject, got {:?}", other),
        }
    }

    #[test]
    fn test_object_with_additional_properties_true_is_untyped_map() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "additionalProperties": true
        }));
        let root = graph.get(&TypePath::root()).unwrap();
        assert_eq!(root.kind, TypeKind::Map(None));
    }

    #[test]
    fn test_definition_that_is_a_reference_becomes_an_alias() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "definitions": {
                "base": {"type": "object", "properties": {"n": {"type": "integer"}}},
                "alias": {"$ref": "#/definitions/base"}
            },
            "properties": {}
        }));
        let alias = graph.get(&TypePath::root().definition("alias")).unwrap();
        assert_eq!(
            alias.kind,
            TypeKind::Reference(TypePath::root().definition("base"))
        );
    }

    #[test]
    fn test_title_overrides_proposed_name() {
        let graph = graph_for(serde_json::json!({
            "type": "object",
            "properties": {
                "payload": {
                    "title": "Envelope",
                    "type": "object",
                    "properties": {"n": {"type": "integer"}}
                }
            }
        }));
        let nested = graph.get(&TypePath::root().property("payload")).unwrap();
        assert_eq!(nested.orig_name, "Envelope");
        assert_eq!(nested.name, "envelope");
    }

    #[test]
    fn test_determinism_across_runs() {
        let document = serde_json::json!({
            "type": "object",
            "definitions": {
                "address": {"type": "object", "properties": {"street": {"type": "string"}}}
            },
            "properties": {
                "home": {"$ref": "#/definitions/address"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "age": {"type": ["integer", "null"]}
            },
            "required": ["home"]
        });
        let first = graph_for(document.clone());
        let second = graph_for(document);
        let left: Vec<_> = first.ordered_descriptors().into_iter().cloned().collect();
        let right: Vec<_> = second.ordered_descriptors().into_iter().cloned().collect();
        assert_eq!(left, right);
    }
}
