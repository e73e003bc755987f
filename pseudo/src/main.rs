//! pseudo CLI

use clap::{Parser, Subcommand};
use pseudo::config::Config;
use pseudo::error::{report_error, Error};
use pseudo::interp::{evaluate, Interpreter, ValueStore};
use pseudo::repl::Repl;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pseudo", version, about = "Interpreter for teaching pseudocode")]
struct Cli {
    /// Config file (default: ./pseudo.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every statement and store write (same as RUST_LOG=pseudo=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Plain error reports without ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a .pseudo script
    Run {
        /// Script to run
        file: PathBuf,
        /// Print every declared name as JSON after the run
        #[arg(long)]
        dump_state: bool,
        /// Store any value regardless of the declared type
        #[arg(long)]
        permissive: bool,
    },
    /// Start the interactive REPL
    Repl {
        /// Store any value regardless of the declared type
        #[arg(long)]
        permissive: bool,
    },
    /// Tokenize an expression and dump tokens (debug)
    Tokens {
        /// Expression to tokenize
        expr: String,
    },
    /// Evaluate one expression against an empty store
    Eval {
        /// Expression to evaluate
        expr: String,
    },
}

type CliResult = Result<bool, Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Config::load(cli.config.as_deref())
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|mut config| {
            if cli.no_color {
                config.color = false;
            }
            match cli.command {
                Command::Run {
                    file,
                    dump_state,
                    permissive,
                } => {
                    config.dump_state |= dump_state;
                    config.strict_types &= !permissive;
                    run_file(&file, &config)
                }
                Command::Repl { permissive } => {
                    config.strict_types &= !permissive;
                    start_repl(&config)
                }
                Command::Tokens { expr } => tokenize_expr(&expr, &config),
                Command::Eval { expr } => eval_expr(&expr, &config),
            }
        });

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Install a subscriber when `RUST_LOG` is set or `--verbose` is given.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("pseudo=debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn run_file(path: &Path, config: &Config) -> CliResult {
    config.check_script_path(path)?;
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let filename = path.display().to_string();

    let store = ValueStore::with_policy(config.type_policy());
    let stdin = std::io::stdin();
    let mut interpreter = Interpreter::with_store(store, stdin.lock(), std::io::stdout());

    let summary = interpreter.run(&source, |failure| {
        if report_error(&filename, &source, &failure.error, config.color).is_err() {
            eprintln!("{filename}:{}: {}", failure.line, failure.error);
        }
    });
    tracing::info!(
        lines = summary.lines,
        executed = summary.executed,
        failed = summary.failed,
        "finished {filename}"
    );

    if config.dump_state {
        println!("{}", serde_json::to_string_pretty(&interpreter.store().snapshot())?);
    }

    Ok(summary.is_success())
}

fn start_repl(config: &Config) -> CliResult {
    Repl::new(config)?.run()?;
    Ok(true)
}

fn tokenize_expr(expr: &str, config: &Config) -> CliResult {
    match pseudo::lexer::tokenize(expr) {
        Ok(tokens) => {
            for (tok, span) in &tokens {
                println!("{:?} @ {}..{}", tok, span.start, span.end);
            }
            Ok(true)
        }
        Err(e) => {
            report_error("<expr>", expr, &e, config.color)?;
            Ok(false)
        }
    }
}

fn eval_expr(expr: &str, config: &Config) -> CliResult {
    match evaluate(expr, &ValueStore::with_policy(config.type_policy())) {
        Ok(value) => {
            println!("{value}");
            Ok(true)
        }
        Err(e) => {
            report_error("<expr>", expr, &e, config.color)?;
            Ok(false)
        }
    }
}
