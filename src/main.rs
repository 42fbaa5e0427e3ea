//! Command-line interface for xmltool

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::process;

#[cfg(feature = "cli")]
use xmltool::commands::{chk, export, CheckParams, ExportFormat, ExportParams};
#[cfg(feature = "cli")]
use xmltool::reporter::Reporter;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmltool")]
#[command(author, version, about = "XML Schema validation and conversion tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an XML document against an XML Schema
    Chk {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Path to the XML file to validate
        #[arg(value_name = "XML")]
        xml: PathBuf,

        /// Increase verbosity (-v warnings, -vv debug)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Convert an XML document to JSON
    Json {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Path to the XML file to convert
        #[arg(value_name = "XML")]
        xml: PathBuf,

        /// Path to the JSON file to write
        #[arg(value_name = "JSON")]
        output: PathBuf,

        /// Replace the output file if it exists
        #[arg(short, long)]
        overwrite: bool,

        /// Increase verbosity (-v warnings, -vv debug)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Convert an XML document to YAML
    Yaml {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Path to the XML file to convert
        #[arg(value_name = "XML")]
        xml: PathBuf,

        /// Path to the YAML file to write
        #[arg(value_name = "YAML")]
        output: PathBuf,

        /// Replace the output file if it exists
        #[arg(short, long)]
        overwrite: bool,

        /// Increase verbosity (-v warnings, -vv debug)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },
}

#[cfg(feature = "cli")]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();
    log::debug!("{:?}", cli);

    let result = match cli.command {
        Commands::Chk {
            schema,
            xml,
            verbose,
        } => {
            let mut reporter = Reporter::stdio(verbose);
            chk::run(&CheckParams { schema, xml, verbose }, &mut reporter)
        }
        Commands::Json {
            schema,
            xml,
            output,
            overwrite,
            verbose,
        } => cmd_export(schema, xml, output, overwrite, verbose, ExportFormat::Json),
        Commands::Yaml {
            schema,
            xml,
            output,
            overwrite,
            verbose,
        } => cmd_export(schema, xml, output, overwrite, verbose, ExportFormat::Yaml),
    };

    // Failures were already reported
    if result.is_err() {
        process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_export(
    schema: PathBuf,
    xml: PathBuf,
    output: PathBuf,
    overwrite: bool,
    verbose: u8,
    format: ExportFormat,
) -> Result<(), xmltool::commands::OperationError> {
    let mut reporter = Reporter::stdio(verbose);
    let params = ExportParams {
        schema,
        xml,
        output,
        overwrite,
        verbose,
        format,
    };
    export::run(&params, &mut reporter)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
