//! Command-line interface for xmlbind

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs::File;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xmlbind::schema::schema_locations;
#[cfg(feature = "cli")]
use xmlbind::{DataBinder, Error, NodeType, ParseOptions, Serializable, StreamingDataBinder, ToplevelNode};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmlbind")]
#[command(author, version, about = "Namespace-aware XML data binding tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Bind a document generically and print it back as XML
    Parse {
        /// Path to the XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print without indentation
        #[arg(short, long)]
        compact: bool,
    },

    /// Validate a document against the schema it declares
    Validate {
        /// Path to the XML file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory holding the schema files
        #[arg(short, long, value_name = "DIR")]
        schema_dir: PathBuf,
    },

    /// Show the root element and its declared schema locations
    Sniff {
        /// Path to the XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print every completed TAG element as soon as it is read
    Stream {
        /// Path to the XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tag to yield
        #[arg(short, long)]
        tag: String,

        /// Namespace alias of the tag
        #[arg(short, long, value_name = "ALIAS")]
        namespace: Option<String>,
    },
}

#[cfg(feature = "cli")]
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { file, compact } => cmd_parse(file, compact),
        Commands::Validate { file, schema_dir } => cmd_validate(file, schema_dir),
        Commands::Sniff { file, json } => cmd_sniff(file, json),
        Commands::Stream { file, tag, namespace } => cmd_stream(file, tag, namespace),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_parse(file: PathBuf, compact: bool) -> Result<(), Box<dyn std::error::Error>> {
    let binder = DataBinder::new();
    let root = binder.parse_path(&file, &ParseOptions::default())?;
    let xml = binder.to_xml(&root, !compact)?;
    if compact {
        println!("{}", xml);
    } else {
        print!("{}", xml);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_validate(file: PathBuf, schema_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let binder = DataBinder::new();
    let mut stream = File::open(&file)?;

    match binder.validate(&mut stream, Some(&schema_dir)) {
        Ok(schema) => {
            println!("valid");
            tracing::info!(schema = %schema.display(), "document is valid");
            Ok(())
        }
        Err(Error::SchemaValidation(err)) => {
            println!("invalid");
            for line in &err.log {
                println!("  - {}", line);
            }
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(feature = "cli")]
fn cmd_sniff(file: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::{json, Map, Value};

    let root = ToplevelNode::from_reader(File::open(&file)?);
    let Some(name) = root.name.as_deref() else {
        return Err(Error::InvalidXml("no root element found".to_string()).into());
    };
    let locations = match schema_locations(&root) {
        Ok(locations) => locations,
        Err(Error::UnknownSchema(_)) => Vec::new(),
        Err(err) => return Err(err.into()),
    };

    if json_output {
        let attributes: Map<String, Value> = root
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), json!(value)))
            .collect();
        let output = json!({
            "root": name,
            "attributes": attributes,
            "schemaLocations": locations,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Root: {}", name);
    if !root.attributes.is_empty() {
        println!("Attributes:");
        for (key, value) in &root.attributes {
            println!("  {} = {}", key, value);
        }
    }
    if locations.is_empty() {
        println!("Schema locations: (none)");
    } else {
        println!("Schema locations:");
        for location in &locations {
            println!("  {}", location);
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_stream(file: PathBuf, tag: String, namespace: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut binder = StreamingDataBinder::new();
    binder.register_type(NodeType::generic().yielding(), Some(&tag), namespace.as_deref())?;

    for item in binder.parse_reader(File::open(&file)?) {
        let xml = item?.element_tree()?.to_xml_string(false)?;
        // one element per line, without the declaration
        let fragment = xml.split_once("?>").map_or(xml.as_str(), |(_, rest)| rest);
        println!("{}", fragment);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
