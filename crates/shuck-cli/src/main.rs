//! shuck - unpack anything by asking the right tool
//!
//! This crate provides the command-line interface for shuck: it resolves
//! each named archive, drives the matching chain of external tools, and
//! reorganizes whatever they produced in the current directory.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use shuck_core::{Config, Processor};
use std::path::{Path, PathBuf};
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod prompt;

use prompt::TermPrompt;

/// shuck - unpack anything by asking the right tool
///
/// Shuck figures out what kind of archive a file is, hands it to the
/// right external tools, and tidies up the result so one archive leaves
/// one predictable thing behind.
#[derive(Parser)]
#[command(name = "shuck")]
#[command(author, version, about = "Unpack any archive with one command", long_about = None)]
struct Cli {
    /// Archive files to unpack
    #[arg(required_unless_present = "supported")]
    archives: Vec<PathBuf>,

    /// List archive contents instead of extracting
    #[arg(short, long)]
    list: bool,

    /// With --list, print the listing as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Unpack archives found inside archives without asking
    #[arg(short, long)]
    recursive: bool,

    /// Never prompt; every question falls to its default
    #[arg(short, long)]
    batch: bool,

    /// Flatten extracted files into the current directory
    #[arg(short = 'F', long)]
    flat: bool,

    /// Replace an existing directory that matches the archive name
    #[arg(short, long)]
    overwrite: bool,

    /// What to do with single-entry archives: here, wrap, ask
    #[arg(long, value_name = "POLICY")]
    one_entry: Option<String>,

    /// Delete each source archive after it unpacked cleanly
    #[arg(short, long)]
    delete: bool,

    /// Stop following nested archives at this depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Show the supported archive suffixes and exit
    #[arg(short, long)]
    supported: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(_) => process::exit(0),
        Err(e) => {
            error!("Error: {}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if cli.supported {
        print_supported();
        return Ok(());
    }

    // SHUCK_NO_CONFIG keeps scripted runs away from the user's config file
    let config = if std::env::var_os("SHUCK_NO_CONFIG").is_some() {
        Config::default()
    } else {
        Config::load_or_default()
    };

    let mut options = config.options();
    if cli.batch {
        options.batch = true;
    }
    if cli.recursive {
        options.recursive = true;
    }
    if cli.flat {
        options.flat = true;
    }
    if cli.overwrite {
        options.overwrite = true;
    }
    if cli.delete {
        options.delete_source = true;
    }
    if let Some(depth) = cli.max_depth {
        options.max_depth = depth;
    }
    if let Some(ref value) = cli.one_entry {
        options.one_entry = value.parse()?;
    }

    if cli.list {
        return run_list(&cli.archives, cli.json);
    }

    let stdin = std::io::stdin();
    let mut processor = Processor::new(
        options,
        Box::new(TermPrompt),
        Box::new(stdin.lock()),
        Box::new(std::io::stderr()),
    );
    processor.process(&cli.archives);
    processor.finish()?;

    Ok(())
}

#[derive(Serialize)]
struct Listing<'a> {
    archive: String,
    entries: &'a [String],
}

/// List each archive's contents on stdout. Unreadable archives are
/// reported and counted, the rest still print.
fn run_list(paths: &[PathBuf], json: bool) -> Result<()> {
    let mut listings = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        match list_one(path) {
            Ok(entries) => listings.push((path, entries)),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                failures.push(e);
            }
        }
    }

    if json {
        let payload: Vec<Listing> = listings
            .iter()
            .map(|(path, entries)| Listing {
                archive: path.display().to_string(),
                entries,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let many = paths.len() > 1;
        for (i, (path, entries)) in listings.iter().enumerate() {
            if many {
                if i > 0 {
                    println!();
                }
                println!("{}:", path.display());
            }
            for entry in entries {
                println!("{}", entry);
            }
        }
    }

    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0).into()),
        n => Err(shuck_core::Error::PartialFailure { count: n as u32 }.into()),
    }
}

fn list_one(path: &Path) -> shuck_core::Result<Vec<String>> {
    let archive = shuck_core::resolve(path)?;
    shuck_core::list(archive)
}

/// Print the suffix table shuck resolves by name
fn print_supported() {
    println!("{:<10} {:<12} {}", "Suffix", "Kind", "Encoding");
    println!("{}", "-".repeat(34));

    for &(ext, kind, encoding) in shuck_core::format::extension_table() {
        let encoding_str = encoding
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(".{:<9} {:<12} {}", ext, kind, encoding_str);
    }
}

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General error
/// - 2: Missing tool or IO failure
/// - 3: Unrecognized or unusable input
/// - 4: Extraction failure, including partial ones
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(shuck_err) = err.downcast_ref::<shuck_core::Error>() {
        match shuck_err {
            shuck_core::Error::Io(_) => 2,
            shuck_core::Error::ToolNotFound { .. } => 2,
            shuck_core::Error::UnknownFormat(_) => 3,
            shuck_core::Error::InvalidPath(_) => 3,
            shuck_core::Error::CommandFailed { .. } => 4,
            shuck_core::Error::ExtractionEmpty { .. } => 4,
            shuck_core::Error::PartialFailure { .. } => 4,
            shuck_core::Error::Config(_) => 1,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}
