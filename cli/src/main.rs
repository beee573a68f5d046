mod config;
mod output;
mod render;

use std::fs;
use std::path::PathBuf;

use argspec_core::{Compiler, ParserDef, SpecialChars, tokenize_line};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::output::{
    DefinitionReport, ErrorReport, LineOutcome, OutputFormat, format_batch, format_definition,
    format_matches,
};

#[derive(Debug, Parser)]
#[command(name = "argspec")]
#[command(about = "Compile usage grammars and match command lines against them")]
#[command(version)]
struct Cli {
    /// Log compilation and matching steps to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a usage grammar and print its nodes.
    Check(CheckArgs),
    /// Match arguments (given after `--`) against a usage grammar.
    Match(MatchArgs),
    /// Match every line of a file against a usage grammar, in parallel.
    MatchFile(MatchFileArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// YAML file overriding the special characters.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Usage grammar, e.g. "[-l] [--color=<mode>] <dirs...>".
    #[arg(allow_hyphen_values = true)]
    usage: String,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Usage grammar.
    #[arg(allow_hyphen_values = true)]
    usage: String,
    #[command(flatten)]
    common: CommonArgs,
    /// Arguments to match.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct MatchFileArgs {
    /// Usage grammar.
    #[arg(allow_hyphen_values = true)]
    usage: String,
    /// File with one command line per line; blank lines and `#` comments are skipped.
    #[arg(long)]
    input: PathBuf,
    /// Number of parallel jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Match(args) => run_match(args),
        Command::MatchFile(args) => run_match_file(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn compile(usage: &str, common: &CommonArgs) -> Result<(SpecialChars, ParserDef), String> {
    let specials = config::load_or_default(common.config.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;
    let def = Compiler::new()
        .specials(specials)
        .compile(usage)
        .map_err(|err| render::render_usage(&err, usage, &specials))?;
    Ok((specials, def))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let (_, def) = compile(&args.usage, &args.common)?;
    let report = DefinitionReport::new(&args.usage, &def);
    println!("{}", format_definition(&report, args.common.format)?);
    Ok(())
}

fn run_match(args: MatchArgs) -> Result<(), String> {
    let (_, def) = compile(&args.usage, &args.common)?;
    let matches = def
        .matches(&args.args)
        .map_err(|err| render::render_arguments(&err, &args.args))?;
    println!("{}", format_matches(&matches.to_json(), args.common.format)?);
    Ok(())
}

fn run_match_file(args: MatchFileArgs) -> Result<(), String> {
    use rayon::prelude::*;

    let (specials, def) = compile(&args.usage, &args.common)?;
    let content = fs::read_to_string(&args.input)
        .map_err(|e| format!("Failed to read {}: {e}", args.input.display()))?;
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect();
    debug!(file = %args.input.display(), lines = lines.len(), "Matching batch file");

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let outcomes: Vec<LineOutcome> = pool.install(|| {
        lines
            .par_iter()
            .map(|&(line, input)| {
                let result = tokenize_line(input, &specials)
                    .and_then(|tokens| def.matches(&tokens).map(|m| m.to_json()));
                match result {
                    Ok(matches) => LineOutcome {
                        line,
                        input: input.to_string(),
                        matches: Some(matches),
                        error: None,
                    },
                    Err(err) => LineOutcome {
                        line,
                        input: input.to_string(),
                        matches: None,
                        error: Some(ErrorReport::from(&err)),
                    },
                }
            })
            .collect()
    });

    println!("{}", format_batch(&outcomes, args.common.format)?);

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failed > 0 {
        return Err(format!("{failed} of {} lines failed to match", outcomes.len()));
    }
    Ok(())
}
