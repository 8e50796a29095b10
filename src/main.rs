//! Command-line interface for xmlfacets
//!
//! Exit status: 0 when the document is valid, 1 when it is invalid, 2 when
//! the request could not be evaluated (unreadable files, bad schema, unknown
//! type, malformed XML).

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::process::ExitCode;

#[cfg(feature = "cli")]
use xmlfacets::{Limits, Loader, NamespaceContext, QName, Schema, ValidationMode, Validator};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmlfacets")]
#[command(author, version, about = "Validate XML documents against declarative facet schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an XML document against a schema description
    Validate {
        /// Path to the JSON schema description
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Type to validate the root against (Clark or prefixed name);
        /// defaults to the global element matching the root
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Validation mode
        #[arg(short, long, value_enum, default_value_t = Mode::Strict)]
        mode: Mode,

        /// Resource limits preset
        #[arg(long, value_enum, default_value_t = LimitsPreset::Default)]
        limits: LimitsPreset,

        /// Print the report as JSON
        #[arg(short, long)]
        json: bool,

        /// Path to the XML file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Summarize a schema description
    Inspect {
        /// Path to the JSON schema description
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Show the resolved definition of a single type
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Strict,
    Lax,
}

#[cfg(feature = "cli")]
impl From<Mode> for ValidationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Strict => ValidationMode::Strict,
            Mode::Lax => ValidationMode::Lax,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LimitsPreset {
    Default,
    Strict,
    Permissive,
}

#[cfg(feature = "cli")]
impl From<LimitsPreset> for Limits {
    fn from(preset: LimitsPreset) -> Self {
        match preset {
            LimitsPreset::Default => Limits::default(),
            LimitsPreset::Strict => Limits::strict(),
            LimitsPreset::Permissive => Limits::permissive(),
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            schema,
            type_name,
            mode,
            limits,
            json,
            file,
        } => cmd_validate(schema, type_name, mode.into(), limits.into(), json, file),
        Commands::Inspect {
            schema,
            type_name,
            json,
        } => cmd_inspect(schema, type_name, json).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Resolve a name typed on the command line against the schema's namespaces
#[cfg(feature = "cli")]
fn resolve_name(schema: &Schema, name: &str) -> xmlfacets::Result<QName> {
    let mut context = NamespaceContext::new();
    if let Some(target) = &schema.target_namespace {
        context.set_default_namespace(target.as_str());
    }
    context.resolve(name)
}

#[cfg(feature = "cli")]
fn cmd_validate(
    schema_path: PathBuf,
    type_name: Option<String>,
    mode: ValidationMode,
    limits: Limits,
    json_output: bool,
    file: PathBuf,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let loader = Loader::new().with_limits(limits.clone());
    let schema = loader.load_schema(&schema_path)?;
    let node = loader.load_document(&file)?;

    let validator = Validator::new(&schema).with_mode(mode).with_limits(limits);
    let report = match type_name {
        Some(name) => validator.validate(&node, &resolve_name(&schema, &name)?)?,
        None => validator.validate_element(&node)?,
    };

    if json_output {
        println!("{}", report.to_json()?);
    } else if report.valid {
        println!("✓ {} is valid", file.display());
    } else {
        println!("✗ {} is invalid", file.display());
        println!();
        println!("Errors:");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    Ok(if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(feature = "cli")]
fn cmd_inspect(
    schema_path: PathBuf,
    type_name: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Loader::new().load_schema(&schema_path)?;

    if let Some(name) = type_name {
        return print_type_details(&schema, &resolve_name(&schema, &name)?, json_output);
    }

    if json_output {
        print_schema_json(&schema)?;
    } else {
        print_schema_summary(&schema);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn print_schema_summary(schema: &Schema) {
    println!("xmlfacets v{}", xmlfacets::VERSION);
    println!();
    println!("Schema Information:");
    match &schema.target_namespace {
        Some(ns) => println!("  Target Namespace: {}", ns),
        None => println!("  Target Namespace: (none)"),
    }
    println!();
    println!("Statistics:");
    println!("  Global Elements: {}", schema.element_count());
    println!("  Types: {}", schema.type_count());

    println!("\n=== Global Elements ===");
    for (name, type_name) in schema.elements() {
        println!("  {} : {}", name, type_name);
    }

    println!("\n=== Types ===");
    for def in schema.types().filter(|d| !xmlfacets::validators::is_builtin(&d.name)) {
        match def.base_name() {
            Some(base) => println!("  {} ({}, from {})", def.name, def.content.as_str(), base),
            None => println!("  {} ({})", def.name, def.content.as_str()),
        }
    }
}

#[cfg(feature = "cli")]
fn print_schema_json(schema: &Schema) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::json;

    let elements: Vec<_> = schema
        .elements()
        .map(|(name, type_name)| json!({ "name": name, "type": type_name }))
        .collect();
    let types: Vec<_> = schema
        .types()
        .filter(|d| !xmlfacets::validators::is_builtin(&d.name))
        .map(|d| {
            json!({
                "name": d.name,
                "content": d.content.as_str(),
                "base": d.base_name(),
            })
        })
        .collect();

    let output = json!({
        "targetNamespace": schema.target_namespace,
        "statistics": {
            "globalElements": schema.element_count(),
            "types": schema.type_count(),
        },
        "elements": elements,
        "types": types,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(feature = "cli")]
fn print_type_details(
    schema: &Schema,
    name: &QName,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ty = schema.resolve(name)?;

    if json_output {
        let attributes: Vec<_> = ty
            .attributes
            .values()
            .map(|a| {
                serde_json::json!({
                    "name": a.name,
                    "use": a.use_mode.as_str(),
                    "type": a.value_type,
                })
            })
            .collect();
        let children: Vec<_> = ty
            .children
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "type": c.type_name,
                    "occurs": c.occurs.to_string(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "name": ty.name,
            "content": ty.content.as_str(),
            "whiteSpace": ty.white_space,
            "facets": ty.facets.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            "attributes": attributes,
            "children": children,
            "lineage": ty.lineage,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Type: {}", ty.name);
    println!("  Content: {}", ty.content.as_str());
    println!("  White Space: {:?}", ty.white_space);
    for facet in &ty.facets {
        println!("  Facet: {}", facet);
    }
    for attribute in ty.attributes.values() {
        println!(
            "  Attribute: {} : {} ({})",
            attribute.name, attribute.value_type, attribute.use_mode
        );
    }
    for child in &ty.children {
        println!("  Child: {} : {} {}", child.name, child.type_name, child.occurs);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
