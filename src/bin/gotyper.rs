//! Go type generator CLI
//!
//! Reads a JSON Schema document, resolves it into a type graph, and
//! writes the generated Go source to a file or stdout.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gotyper::codegen::names::generate_identifier;
use gotyper::{GeneratorConfig, SchemaNode};

#[derive(Parser)]
#[command(name = "gotyper")]
#[command(about = "Generate Go type declarations from a JSON Schema document")]
struct Cli {
    /// File containing a valid JSON Schema document
    input: PathBuf,

    /// Output to console instead of a file
    #[arg(short = 'c', long)]
    console: bool,

    /// Filename for output; default is <roottype>_schematype.go
    #[arg(short, long)]
    out_file: Option<PathBuf>,

    /// Package name for the generated file
    #[arg(short, long, default_value = "main")]
    package: String,

    /// Name of the root type; default is generated from the filename
    #[arg(short, long)]
    root_type: Option<String>,

    /// Prefix for non-root type names
    #[arg(long)]
    prefix: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let content = fs::read_to_string(&cli.input)?;
    let document = SchemaNode::from_json(&content)?;

    let mut config = GeneratorConfig::for_package(cli.package, cli.prefix.unwrap_or_default());
    config.root_type_name = match cli.root_type {
        Some(name) => name,
        None => {
            let exported = config.package_name != "main";
            generate_identifier(&schema_name(&cli.input), exported, &config.naming)?
        }
    };

    let source = gotyper::generate(&document, &config)?;

    if cli.console {
        print!("{}", source);
    } else {
        let out_path = cli
            .out_file
            .unwrap_or_else(|| default_output_name(&config.root_type_name));
        fs::write(&out_path, source)?;
        println!("Wrote {}", out_path.display());
    }
    Ok(())
}

/// Schema name from the input path: the base name up to the first dot
fn schema_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn default_output_name(root_type_name: &str) -> PathBuf {
    PathBuf::from(format!("{}_schematype.go", root_type_name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_name_strips_extensions() {
        assert_eq!(schema_name(Path::new("/tmp/person.schema.json")), "person");
        assert_eq!(schema_name(Path::new("config.json")), "config");
    }

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output_name("PersonRecord"),
            PathBuf::from("personrecord_schematype.go")
        );
    }

    #[test]
    fn test_run_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("person.json");
        fs::write(
            &input,
            r#"{
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }"#,
        )
        .unwrap();
        let out_file = dir.path().join("person_schematype.go");

        let cli = Cli {
            input,
            console: false,
            out_file: Some(out_file.clone()),
            package: "main".to_string(),
            root_type: None,
            prefix: None,
        };
        run(cli).unwrap();

        let generated = fs::read_to_string(&out_file).unwrap();
        assert!(generated.starts_with("package main\n"));
        assert!(generated.contains("type person struct {"));
        assert!(generated.contains("\tName string `json:\"name\"`"));
    }

    #[test]
    fn test_run_rejects_unresolvable_schema() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.json");
        fs::write(
            &input,
            r##"{"type": "object", "properties": {"x": {"$ref": "#/definitions/missing"}}}"##,
        )
        .unwrap();

        let cli = Cli {
            input,
            console: false,
            out_file: Some(dir.path().join("out.go")),
            package: "main".to_string(),
            root_type: None,
            prefix: None,
        };
        assert!(run(cli).is_err());
    }
}
