//! Generator configuration
//!
//! One record for the run-wide naming/export policy plus the acronym
//! dictionary used by identifier generation. Classification and
//! resolution are otherwise config-free.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Run-wide generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Go package name for the generated file
    pub package_name: String,

    /// Name of the root descriptor; used verbatim
    pub root_type_name: String,

    /// Prefix prepended to every non-root exported type name
    pub type_name_prefix: String,

    /// Switches identifier casing to exported and enables prefixing.
    /// Callers usually derive this from the package/prefix context (see
    /// [`GeneratorConfig::for_package`]).
    pub export_types: bool,

    /// Naming conventions
    pub naming: NamingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            package_name: "main".to_string(),
            root_type_name: String::new(),
            type_name_prefix: String::new(),
            export_types: false,
            naming: NamingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Config for a package/prefix context: type names are exported when
    /// a non-default package or a prefix is requested, unexported for the
    /// default `main`-package run.
    pub fn for_package(package_name: impl Into<String>, type_name_prefix: impl Into<String>) -> Self {
        let package_name = package_name.into();
        let type_name_prefix = type_name_prefix.into();
        let export_types = package_name != "main" || !type_name_prefix.is_empty();
        Self {
            package_name,
            type_name_prefix,
            export_types,
            ..Default::default()
        }
    }

    /// Generate a type name from an original schema name
    pub fn type_name(&self, orig_name: &str) -> Result<String> {
        if self.export_types {
            let identifier = super::names::generate_identifier(orig_name, true, &self.naming)?;
            Ok(format!("{}{}", self.type_name_prefix, identifier))
        } else {
            super::names::generate_identifier(orig_name, false, &self.naming)
        }
    }

    /// Generate a field name from an original property name or title.
    /// Field names are always exported.
    pub fn field_name(&self, orig_name: &str) -> Result<String> {
        super::names::generate_identifier(orig_name, true, &self.naming)
    }
}

/// Naming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Initialisms kept all-caps in generated identifiers (e.g. ID, URL)
    pub acronyms: HashSet<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            acronyms: [
                "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
                "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH",
                "TCP", "TLS", "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM",
                "XML", "XSRF", "XSS",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
