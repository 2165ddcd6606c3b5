use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use regex::{Regex, RegexBuilder};

use matchfn::config::StoreLocation;
use matchfn::host::{
    Dictionaries, DocumentMetadata, NoDictionaries, StaticHost, WordListDictionary,
};
use matchfn::{replace_all, Function, FunctionRegistry, JsonFunctionStore};

mod cli;

use cli::{Cli, Command, RunArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
}

impl ExitCode {
    fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

/// Problems with how matchfn was invoked, reported with exit code 2.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct UsageError(String);

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::Success.exit(),
        Err(e) => {
            eprintln!("matchfn: Error: {:#}", e);
            if e.downcast_ref::<UsageError>().is_some() {
                ExitCode::InvalidUsage.exit();
            }
            ExitCode::GeneralError.exit();
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut registry = open_registry(cli.functions.as_deref())?;
    match cli.command {
        Command::Run(args) => run_replace(&mut registry, &args),
        Command::List { refresh } => list_functions(&mut registry, refresh),
        Command::Show { name } => show_function(&mut registry, &name),
        Command::Check { file } => check_script(&registry, &file),
    }
}

fn open_registry(cli_path: Option<&Path>) -> Result<FunctionRegistry> {
    let location = StoreLocation::resolve(cli_path);
    log::debug!(
        "using function store {} ({:?})",
        location.path.display(),
        location.origin
    );
    let store = JsonFunctionStore::open(&location.path)
        .context("Failed to load user functions")?;
    Ok(FunctionRegistry::new(Box::new(store)))
}

fn list_functions(registry: &mut FunctionRegistry, refresh: bool) -> Result<()> {
    let functions = registry.get(refresh);
    let mut stdout = io::stdout().lock();
    for name in registry.enumerate_names() {
        let builtin = functions.get(&name).is_some_and(|f| f.is_builtin());
        if builtin {
            writeln!(stdout, "{}  (built-in)", name)?;
        } else {
            writeln!(stdout, "{}", name)?;
        }
    }
    Ok(())
}

fn show_function(registry: &mut FunctionRegistry, name: &str) -> Result<()> {
    let function = registry
        .lookup(name)
        .ok_or_else(|| UsageError(format!("no function named '{}'", name)))?;
    let source = function.source().unwrap_or_default();
    let mut stdout = io::stdout().lock();
    stdout.write_all(source.as_bytes())?;
    if !source.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}

fn check_script(registry: &FunctionRegistry, file: &Path) -> Result<()> {
    let bytes = fs::read(file)
        .with_context(|| format!("Failed to read script '{}'", file.display()))?;
    let name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Function::from_source_bytes(&name, &bytes, registry.compiler())
        .with_context(|| format!("'{}' is not a valid replace function", file.display()))?;
    println!("{}: ok", file.display());
    Ok(())
}

fn build_regex(args: &RunArgs) -> Result<Regex> {
    RegexBuilder::new(&args.pattern)
        .case_insensitive(args.ignore_case)
        .multi_line(args.multi_line)
        .dot_matches_new_line(args.dot_all)
        .build()
        .map_err(|e| UsageError(format!("invalid pattern: {}", e)).into())
}

fn build_host(args: &RunArgs) -> Result<StaticHost> {
    let metadata = match &args.metadata {
        Some(path) => DocumentMetadata::from_file(path)?,
        None => DocumentMetadata::default(),
    };
    let dictionaries: Arc<dyn Dictionaries> = match &args.dictionary {
        Some(path) => Arc::new(WordListDictionary::from_file(path)?),
        None => Arc::new(NoDictionaries),
    };
    Ok(StaticHost::new(metadata, dictionaries))
}

fn run_replace(registry: &mut FunctionRegistry, args: &RunArgs) -> Result<()> {
    if args.in_place && args.files.is_empty() {
        return Err(UsageError("--in-place needs at least one input file".to_string()).into());
    }
    let regex = build_regex(args)?;
    let host = build_host(args)?;
    if registry.lookup(&args.function).is_none() {
        return Err(UsageError(format!("no function named '{}'", args.function)).into());
    }

    if args.files.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        let context = args.context.clone().unwrap_or_default();
        let output = replace_text(registry, args, &regex, &host, &text, &context, "<stdin>")?;
        io::stdout().lock().write_all(output.as_bytes())?;
        return Ok(());
    }

    for path in &args.files {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let label = path.display().to_string();
        let context = args.context.clone().unwrap_or_else(|| label.clone());
        let output = replace_text(registry, args, &regex, &host, &text, &context, &label)?;

        if args.in_place {
            if output != text {
                fs::write(path, &output)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?;
            }
        } else {
            io::stdout().lock().write_all(output.as_bytes())?;
        }
    }
    Ok(())
}

// One session per input, so numbering restarts for every file.
fn replace_text(
    registry: &mut FunctionRegistry,
    args: &RunArgs,
    regex: &Regex,
    host: &StaticHost,
    text: &str,
    context: &str,
    label: &str,
) -> Result<String> {
    let mut session = registry
        .session(&args.function, context, host)
        .ok_or_else(|| UsageError(format!("no function named '{}'", args.function)))?;
    let replaced = replace_all(text, regex, &mut session)
        .with_context(|| format!("Replace aborted in {}", label))?;
    if args.count {
        eprintln!("{}: {} replacements", label, replaced.count);
    }
    Ok(replaced.text)
}
