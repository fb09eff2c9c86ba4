//! netlist-cst - parse a SPICE or Spectre netlist and report syntax errors.
//!
//! # Usage
//!
//! ```bash
//! netlist-cst --dialect ngspice amp.cir
//! RUST_LOG=netlist_cst=debug netlist-cst --tree --strict top.scs
//! ```

use std::path::PathBuf;

use clap::Parser;
use netlist_cst::{diagnostics, error::Result, Dialect, DialectConfig, NetlistError, SourceText};
use tracing_subscriber::EnvFilter;

/// Netlist syntax checker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist
    #[arg(value_name = "NETLIST")]
    file: PathBuf,

    /// Simulator dialect
    #[arg(short, long, value_enum, default_value_t = Dialect::Generic)]
    dialect: Dialect,

    /// Reject constructs the lenient grammar accepts
    #[arg(long)]
    strict: bool,

    /// Treat the first line as a free-text title
    #[arg(long)]
    title_line: bool,

    /// Print the syntax tree
    #[arg(long)]
    tree: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = DialectConfig::for_dialect(args.dialect)
        .strict(args.strict)
        .with_title_line(args.title_line);

    let source = SourceText::read(&args.file)?;
    let tree = source.parse(&config);

    if args.tree {
        print!("{}", tree.dump());
    }

    let name = args.file.display().to_string();
    let found = diagnostics::collect(&tree);
    for diagnostic in &found {
        eprintln!("{}", diagnostic.render(&name, source.as_str()));
    }

    if tree.had_errors() {
        return Err(NetlistError::syntax_errors(name, found.len()));
    }
    Ok(())
}
