//! JSON Schema document model
//!
//! A parsed document is a tree of [`SchemaNode`]s and is read-only from
//! parse time onward. The heterogeneous JSON Schema fields (`type`,
//! `items`, `additionalProperties`) are decided once here, at parse time,
//! rather than re-inspected at each use site.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Scalar category named by a schema `type` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Object,
    Array,
    /// Anything else maps to an untyped value
    Unknown,
}

impl Category {
    pub fn parse(s: &str) -> Self {
        match s {
            "string" => Category::String,
            "integer" => Category::Integer,
            "number" => Category::Number,
            "boolean" => Category::Boolean,
            "null" => Category::Null,
            "object" => Category::Object,
            "array" => Category::Array,
            _ => Category::Unknown,
        }
    }
}

/// The `type` specifier of a schema node, reduced to a closed variant.
///
/// A two-element array where one element is `"null"` unwraps to
/// `NullableUnion` of the other element. Every other array shape (wrong
/// length, no null marker, non-string entries) is an untyped union and
/// collapses to `Absent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeSpec {
    #[default]
    Absent,
    Single(Category),
    NullableUnion(Category),
}

impl TypeSpec {
    fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => TypeSpec::Single(Category::parse(s)),
            serde_json::Value::Array(entries) if entries.len() == 2 => {
                match (&entries[0], &entries[1]) {
                    (serde_json::Value::String(a), serde_json::Value::String(b)) => {
                        if a == "null" {
                            TypeSpec::NullableUnion(Category::parse(b))
                        } else if b == "null" {
                            TypeSpec::NullableUnion(Category::parse(a))
                        } else {
                            TypeSpec::Absent
                        }
                    }
                    _ => TypeSpec::Absent,
                }
            }
            _ => TypeSpec::Absent,
        }
    }
}

impl<'de> Deserialize<'de> for TypeSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(TypeSpec::from_value(&value))
    }
}

/// The `items` specifier: a single element schema or a fixed tuple
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Single(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

/// The `additionalProperties` specifier: a blanket bool or a value schema
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// One typed definition within the input document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaNode {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub type_spec: TypeSpec,

    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, SchemaNode>,

    #[serde(default)]
    pub items: Option<Items>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub definitions: BTreeMap<String, SchemaNode>,

    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
}

impl SchemaNode {
    /// Parse a schema document from JSON text
    pub fn from_json(content: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Title, treating an empty string as missing
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Description, treating an empty string as missing
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// Whether a property name appears in the `required` list
    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}
