//! nestconf CLI - Parse, validate and query brace-delimited config files
//!
//! Usage:
//!   nestconf [OPTIONS] <COMMAND> <FILE>
//!
//! Commands:
//!   parse     Parse and display the configuration tree
//!   validate  Check the file for errors
//!   stats     Show configuration statistics
//!   get       Print the value(s) at a directive path

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use nestconf_core::{ConfigEntry, ConfigNode, ConfigValue, Parser, DEFAULT_MAX_DEPTH};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, ClapParser)]
#[command(name = "nestconf", version, about = "Parse, validate and query nginx-style config files")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Show spans in tree output and enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fail on the first malformed construct instead of recovering
    #[arg(long, global = true)]
    strict: bool,

    /// Maximum block nesting depth
    #[arg(long, global = true, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Disable the nesting depth limit
    #[arg(long, global = true, conflicts_with = "max_depth")]
    no_depth_limit: bool,

    /// Keep the tokens of multi-token directives as lists
    #[arg(long, global = true)]
    token_lists: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse and display the configuration tree
    Parse {
        /// Config file, or `-` for stdin
        file: PathBuf,
    },
    /// Check the file for errors without printing the tree
    Validate {
        /// Config file, or `-` for stdin
        file: PathBuf,
    },
    /// Show configuration statistics
    Stats {
        /// Config file, or `-` for stdin
        file: PathBuf,
    },
    /// Print the value(s) found by walking nested blocks
    Get {
        /// Config file, or `-` for stdin
        file: PathBuf,
        /// Directive names from the top level down
        #[arg(required = true)]
        path: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let (Command::Parse { file }
    | Command::Validate { file }
    | Command::Stats { file }
    | Command::Get { file, .. }) = &cli.command;
    let input = read_input(file)?;
    debug!(file = %file.display(), bytes = input.len(), "read input");

    let max_depth = (!cli.no_depth_limit).then_some(cli.max_depth);
    let mut parser = Parser::new()
        .with_recovery(!cli.strict)
        .with_max_depth(max_depth)
        .with_token_lists(cli.token_lists);

    match &cli.command {
        Command::Parse { .. } => cmd_parse(&mut parser, &input, cli),
        Command::Validate { .. } => cmd_validate(&mut parser, &input, cli),
        Command::Stats { .. } => cmd_stats(&mut parser, &input),
        Command::Get { path, .. } => cmd_get(&mut parser, &input, path, cli),
    }
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        io::read_to_string(io::stdin()).context("failed to read stdin")
    } else {
        fs::read_to_string(file).with_context(|| format!("failed to read '{}'", file.display()))
    }
}

/// Parse according to `--strict`: strict mode fails on the first error,
/// otherwise errors are reported as warnings.
fn load<'a>(parser: &mut Parser, input: &'a str, strict: bool) -> Result<ConfigNode<'a>> {
    if strict {
        return Ok(parser.parse(input)?);
    }
    let result = parser.parse_with_recovery(input);
    for error in result.errors.iter() {
        eprintln!("warning: {}", error);
    }
    Ok(result.config)
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(parser: &mut Parser, input: &str, cli: &Cli) -> Result<()> {
    let config = load(parser, input, cli.strict)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&JsonNode(&config))?);
    } else {
        print_node(&config, 0, cli.verbose);
    }
    Ok(())
}

// =============================================================================
// Validate Command
// =============================================================================

fn cmd_validate(parser: &mut Parser, input: &str, cli: &Cli) -> Result<()> {
    let result = parser.parse_with_recovery(input);

    if result.errors.is_empty() {
        if cli.json {
            println!(r#"{{"valid": true, "errors": []}}"#);
        } else {
            println!("Valid: no errors found");
        }
        return Ok(());
    }

    if cli.json {
        let errors: Vec<_> = result
            .errors
            .iter()
            .map(|e| {
                serde_json::json!({
                    "kind": format!("{:?}", e.kind),
                    "message": e.message,
                    "span": {"start": e.span.start, "end": e.span.end},
                    "recoverable": e.recoverable
                })
            })
            .collect();
        println!("{}", serde_json::json!({"valid": false, "errors": errors}));
    } else {
        eprintln!("Invalid: {} error(s) found", result.errors.len());
        for error in result.errors.iter() {
            let (line, column) = line_column(input, error.span.start as usize);
            eprintln!("  - {}:{}: {}", line, column, error);
        }
    }
    bail!("{} error(s) found", result.errors.len())
}

/// One-based line and column of a byte offset.
fn line_column(input: &str, offset: usize) -> (usize, usize) {
    let before = &input[..offset.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before, |i| &before[i + 1..]).chars().count() + 1;
    (line, column)
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(parser: &mut Parser, input: &str) -> Result<()> {
    let result = parser.parse_with_recovery(input);
    let stats = result.config.stats();

    println!("Config Statistics");
    println!("-----------------");
    println!("Top-level names: {}", result.config.len());
    println!();
    println!("Content:");
    println!("  Directives:     {}", stats.directives);
    println!("  Blocks:         {}", stats.blocks);
    println!("  Values:         {}", stats.values);
    println!("  Repeated names: {}", stats.repeated);
    println!("  Max depth:      {}", stats.max_depth);
    println!();
    println!("Size:");
    println!("  Bytes:          {}", input.len());
    println!("  Lines:          {}", input.lines().count());
    println!();
    println!("Errors:         {}", result.errors.len());

    Ok(())
}

// =============================================================================
// Get Command
// =============================================================================

fn cmd_get(parser: &mut Parser, input: &str, path: &[String], cli: &Cli) -> Result<()> {
    let config = load(parser, input, cli.strict)?;
    let Some(entry) = config.get_path(path) else {
        bail!("no directive at '{}'", path.join(" "));
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&JsonEntry(entry))?);
        return Ok(());
    }

    for value in entry.values() {
        match value {
            ConfigValue::Str(s) => println!("{}", s),
            ConfigValue::List(items) => println!("{}", items.join(" ")),
            ConfigValue::Block(node) => print_node(node, 0, cli.verbose),
        }
    }
    Ok(())
}

// =============================================================================
// JSON Output
// =============================================================================

struct JsonNode<'n, 'a>(&'n ConfigNode<'a>);

struct JsonEntry<'n, 'a>(&'n ConfigEntry<'a>);

struct JsonValue<'n, 'a>(&'n ConfigValue<'a>);

impl Serialize for JsonNode<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, entry) in self.0.iter() {
            map.serialize_entry(name, &JsonEntry(entry))?;
        }
        map.end()
    }
}

impl Serialize for JsonEntry<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            ConfigEntry::Single(value) => JsonValue(value).serialize(serializer),
            ConfigEntry::Many(values) => serializer.collect_seq(values.iter().map(JsonValue)),
        }
    }
}

impl Serialize for JsonValue<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            ConfigValue::Str(s) => serializer.serialize_str(s),
            ConfigValue::List(items) => serializer.collect_seq(items),
            ConfigValue::Block(node) => JsonNode(node).serialize(serializer),
        }
    }
}

// =============================================================================
// Text Output
// =============================================================================

fn print_node(node: &ConfigNode, indent: usize, verbose: bool) {
    let prefix = "  ".repeat(indent);

    for (name, entry) in node.iter() {
        for (i, value) in entry.values().iter().enumerate() {
            let label = if entry.is_many() {
                format!("{}[{}]", name, i)
            } else {
                name.to_string()
            };

            match value {
                ConfigValue::Str(s) => println!("{}{} = {:?}", prefix, label, s),
                ConfigValue::List(items) => println!("{}{} = {:?}", prefix, label, items),
                ConfigValue::Block(child) => {
                    if verbose {
                        println!(
                            "{}{} {{  # bytes {}..{}",
                            prefix, label, child.span.start, child.span.end
                        );
                    } else {
                        println!("{}{} {{", prefix, label);
                    }
                    print_node(child, indent + 1, verbose);
                    println!("{}}}", prefix);
                }
            }
        }
    }
}
