//! Command-line driver for the canonical S-expression library

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sexprs::{canonical, reader, text, ContentHash, Sexp};
use std::fs;
use std::io::{self, Write};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sexprs")]
#[command(about = "Canonical S-expression reader, packer and text renderer")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an S-expression file and display it
    Parse {
        /// Input file path
        file: String,
        /// Show the content hash of the canonical form
        #[arg(long)]
        hash: bool,
        /// Show the canonical packing as hex
        #[arg(long)]
        canonical: bool,
        /// Emit the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the canonical packing of an S-expression file
    Pack {
        /// Input file path
        input: String,
        /// Output file (stdout if omitted)
        output: Option<String>,
    },
    /// Round-trip expressions (one per line; stdin if no file) through the
    /// base64 text envelope and report equality
    Check {
        /// Input file path
        file: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Parse {
            file,
            hash,
            canonical,
            json,
        } => parse_command(&file, hash, canonical, json),
        Commands::Pack { input, output } => pack_command(&input, output),
        Commands::Check { file } => check_command(file.as_deref()),
    }
}

fn parse_command(file: &str, show_hash: bool, show_canonical: bool, json: bool) -> Result<()> {
    let e = load_file(file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&e)?);
    } else {
        println!("{}", text::to_text(&e));
    }
    if show_canonical {
        println!(
            "canonical ({} bytes): {}",
            canonical::packed_size(&e),
            hex::encode(canonical::pack(&e))
        );
    }
    if show_hash {
        println!("hash: {}", ContentHash::hash(&e));
    }
    Ok(())
}

fn pack_command(input: &str, output: Option<String>) -> Result<()> {
    let e = load_file(input)?;
    let packed = canonical::pack(&e);
    match output {
        Some(path) => {
            fs::write(&path, &packed).with_context(|| format!("failed to write {path}"))?;
            info!("wrote {} canonical bytes to {}", packed.len(), path);
        }
        None => io::stdout().write_all(&packed)?,
    }
    Ok(())
}

/// One expression per line: parse, render, wrap in the base64 envelope,
/// reparse, compare. Mirrors the reference test driver.
fn check_command(file: Option<&str>) -> Result<()> {
    let input = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
        }
        None => io::read_to_string(io::stdin())?,
    };

    let mut failures = 0usize;
    for line in input.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let e = match reader::parse(line) {
            Ok(Some(e)) => e,
            Ok(None) => continue,
            Err(err) => {
                warn!("err: {err}");
                failures += 1;
                continue;
            }
        };
        let b64 = text::to_base64_text(&e);
        match reader::parse(&b64) {
            Ok(Some(e64)) if e64 == e => {
                println!("{}\t{}\n\tequal", text::to_text(&e), b64);
            }
            Ok(_) => {
                warn!("{line}: not equal after round trip");
                failures += 1;
            }
            Err(err) => {
                warn!("b64 err: {err}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} expression(s) failed");
    }
    Ok(())
}

fn load_file(path: &str) -> Result<Sexp> {
    let data = fs::read(path).with_context(|| format!("failed to read {path}"))?;
    match reader::parse_bytes(&data).with_context(|| format!("parse error in {path}"))? {
        Some((e, _)) => Ok(e),
        None => bail!("{path}: no expression found"),
    }
}
