//! Go source emitter
//!
//! Renders the ordered descriptor set to Go source text. This module only
//! consumes resolved descriptors, never raw schema JSON; everything it
//! needs (names, kinds, field lists, the time-import flag) was decided by
//! resolution and deduplication. Output is rendered pre-formatted with
//! tab indentation and is byte-stable for a given descriptor set.

use crate::graph::{FieldDescriptor, FieldType, TypeDescriptor, TypeGraph, TypeKind, TypePath};

/// Render the complete generated file
pub fn render(graph: &TypeGraph) -> String {
    let mut out = String::new();
    out.push_str(&format!("package {}\n\n", graph.config().package_name));
    out.push_str("// Code generated by gotyper. DO NOT EDIT.\n\n");
    if graph.needs_time_import() {
        out.push_str("import \"time\"\n\n");
    }

    let descriptors = graph.ordered_descriptors();
    for (index, descriptor) in descriptors.iter().enumerate() {
        render_type(&mut out, descriptor, graph);
        if index + 1 < descriptors.len() {
            out.push('\n');
        }
    }
    out
}

fn render_type(out: &mut String, descriptor: &TypeDescriptor, graph: &TypeGraph) {
    if let Some(doc) = &descriptor.doc {
        out.push_str(&format!("// {}\n", doc));
    }
    match &descriptor.kind {
        TypeKind::Primitive(primitive) => {
            out.push_str(&format!("type {} {}\n", descriptor.name, primitive.go_keyword()));
        }
        TypeKind::Reference(target) => {
            out.push_str(&format!(
                "type {} {}\n",
                descriptor.name,
                descriptor_name(graph, target)
            ));
        }
        TypeKind::Collection(element) => {
            out.push_str(&format!(
                "type {} []{}\n",
                descriptor.name,
                element_name(graph, element)
            ));
        }
        TypeKind::Map(element) => {
            out.push_str(&format!(
                "type {} map[string]{}\n",
                descriptor.name,
                element_name(graph, element)
            ));
        }
        TypeKind::Struct => {
            out.push_str(&format!("type {} struct {{\n", descriptor.name));
            for field in &descriptor.fields {
                render_field(out, field, graph);
            }
            out.push_str("}\n");
        }
    }
}

fn render_field(out: &mut String, field: &FieldDescriptor, graph: &TypeGraph) {
    let mut type_str = match &field.value {
        FieldType::Primitive(primitive) => primitive.go_keyword().to_string(),
        FieldType::Ref(path) => descriptor_name(graph, path),
        FieldType::Collection(element) => format!("[]{}", element_name(graph, element)),
        FieldType::Map(element) => format!("map[string]{}", element_name(graph, element)),
    };
    if field.nullable && type_str != "interface{}" {
        type_str = format!("*{}", type_str);
    }

    let tag = if field.required {
        format!("`json:\"{}\"`", field.property_name)
    } else {
        format!("`json:\"{},omitempty\"`", field.property_name)
    };

    out.push_str(&format!("\t{} {} {}\n", field.name, type_str, tag));
}

fn descriptor_name(graph: &TypeGraph, path: &TypePath) -> String {
    graph.name_of(path).unwrap_or("interface{}").to_string()
}

fn element_name(graph: &TypeGraph, element: &Option<TypePath>) -> String {
    match element {
        Some(path) => descriptor_name(graph, path),
        None => "interface{}".to_string(),
    }
}
