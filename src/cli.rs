// CLI-specific types and structures

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "matchfn")]
#[command(about = "Regex search/replace driven by named replace functions")]
#[command(
    long_about = "Regex search/replace driven by named replace functions\n\nFunctions are either built in (case transforms) or user scripts written in Rhai,\nstored by name in a JSON function store. Each script defines\n\n  fn replace(m, number, file_name, metadata, dictionaries, functions) { ... }\n\nand returns the replacement text for the match `m`."
)]
#[command(version)]
pub struct Cli {
    /// User function store (JSON object of name -> script source)
    #[arg(long = "functions", global = true, help_heading = "Configuration")]
    pub functions: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true, help_heading = "Display Options")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace every match of PATTERN using the function called FUNCTION
    Run(RunArgs),
    /// List available function names
    List {
        /// Reload the function store before listing
        #[arg(long = "refresh")]
        refresh: bool,
    },
    /// Print the source of a function
    Show { name: String },
    /// Compile a script file and report problems
    Check { file: PathBuf },
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    pub pattern: String,
    pub function: String,
    /// Input files; stdin when empty
    pub files: Vec<PathBuf>,

    #[arg(short = 'i', long = "ignore-case", help_heading = "Pattern Options")]
    pub ignore_case: bool,
    #[arg(short = 'm', long = "multi-line", help_heading = "Pattern Options")]
    pub multi_line: bool,
    #[arg(short = 's', long = "dot-all", help_heading = "Pattern Options")]
    pub dot_all: bool,

    /// Context name passed to the function (defaults to the file path)
    #[arg(long = "context", help_heading = "Processing Options")]
    pub context: Option<String>,
    /// JSON file with document metadata
    #[arg(long = "metadata", help_heading = "Processing Options")]
    pub metadata: Option<PathBuf>,
    /// Word list used for dictionary lookups
    #[arg(long = "dictionary", help_heading = "Processing Options")]
    pub dictionary: Option<PathBuf>,

    /// Write results back to the input files
    #[arg(long = "in-place", help_heading = "Output Options")]
    pub in_place: bool,
    /// Report the number of replacements on stderr
    #[arg(long = "count", help_heading = "Output Options")]
    pub count: bool,
}
