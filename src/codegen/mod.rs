//! Code generation
//!
//! Orchestrates the pipeline over a parsed schema document:
//! resolution (with the deferred fixpoint) builds the type graph, name
//! deduplication makes descriptor names injective, and the emitter
//! renders the ordered descriptor set to Go source.
//!
//! The emitter never reads raw schema JSON - only resolved descriptors.

pub mod config;
pub mod golang;
pub mod names;

pub use config::{GeneratorConfig, NamingConfig};

use crate::error::Result;
use crate::graph::TypeGraph;
use crate::schema::SchemaNode;

/// Resolve a schema document and render the generated Go source.
///
/// `config.root_type_name` must be set; callers reading the document from
/// a file usually derive it from the file name.
pub fn generate(document: &SchemaNode, config: &GeneratorConfig) -> Result<String> {
    let graph = resolve(document, config)?;
    Ok(golang::render(&graph))
}

/// Resolve a schema document into a deduplicated type graph without
/// rendering it, for callers that want the descriptor set itself.
pub fn resolve(document: &SchemaNode, config: &GeneratorConfig) -> Result<TypeGraph> {
    let mut graph = TypeGraph::new(config.clone());
    graph.resolve_document(document)?;
    graph.dedupe_names()?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_end_to_end() {
        let document: SchemaNode = serde_json::from_value(serde_json::json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": ["integer", "null"]}
            },
            "required": ["name"]
        }))
        .unwrap();
        let config = GeneratorConfig {
            root_type_name: "person".to_string(),
            ..Default::default()
        };
        let source = generate(&document, &config).unwrap();
        assert!(source.contains("type person struct {"));
        assert!(source.contains("\tAge *int `json:\"age,omitempty\"`"));
        assert!(source.contains("\tName string `json:\"name\"`"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let document: SchemaNode = serde_json::from_value(serde_json::json!({
            "type": "object",
            "definitions": {
                "tag": {"type": "string"}
            },
            "properties": {
                "tags": {"type": "array", "items": {"$ref": "#/definitions/tag"}},
                "label": {"type": "string"}
            }
        }))
        .unwrap();
        let config = GeneratorConfig {
            root_type_name: "doc".to_string(),
            ..Default::default()
        };
        let first = generate(&document, &config).unwrap();
        let second = generate(&document, &config).unwrap();
        assert_eq!(first, second);
    }
}
