//! jsstub CLI - Generate signature-only stubs of JavaScript source trees.

use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use jsstub::builder::{stub_file, StubRun};
use jsstub::errors::{exit_code, StubError};
use jsstub::extract::{extract, split_lines};
use jsstub::output::{format_extraction, format_report, OutputFormat, ReportOptions};
use jsstub::printer::PrintOptions;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsstub")]
#[command(about = "Generate signature-only stubs of JavaScript source trees")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stub every JavaScript file under a directory
    Stub {
        /// Source directory or file
        #[arg(default_value = ".")]
        src: PathBuf,

        /// Directory to write stubs to, mirroring the source layout
        out: Option<PathBuf>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Report every file, not only failures
        #[arg(long)]
        per_file: bool,

        /// Maximum directory depth
        #[arg(long, default_value_t = jsstub::walker::DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        /// Skip files matching a glob, relative to the source directory
        #[arg(long)]
        exclude: Vec<String>,

        /// File extensions to stub
        #[arg(long, value_delimiter = ',', default_value = "js")]
        ext: Vec<String>,

        /// Re-wrap define() modules in a function closure
        #[arg(long)]
        wrap_closure: bool,
    },

    /// Print the stub of a single file
    File {
        /// Source file
        path: PathBuf,

        /// Re-wrap define() modules in a function closure
        #[arg(long)]
        wrap_closure: bool,
    },

    /// Dump the extracted declarations of a file as JSON
    Inspect {
        /// Source file
        path: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_output = json_flag(&cli.command);

    let result = match cli.command {
        Commands::Stub {
            src,
            out,
            json,
            per_file,
            max_depth,
            include_hidden,
            exclude,
            ext,
            wrap_closure,
        } => {
            let mut run = StubRun::new(src)
                .extensions(&ext)
                .max_depth(max_depth)
                .include_hidden(include_hidden)
                .wrap_closure(wrap_closure);
            if let Some(out) = out {
                run = run.output_dir(out);
            }
            for pattern in exclude {
                run = run.exclude(pattern);
            }
            run_stub(run, json, per_file)
        }
        Commands::File { path, wrap_closure } => run_file(path, wrap_closure),
        Commands::Inspect { path } => run_inspect(path),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "jsstub", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second init (e.g. under a test harness) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Stub { json, .. } => *json,
        Commands::Inspect { .. } => true,
        Commands::File { .. } | Commands::Completions { .. } => false,
    }
}

// --- Stub command ---

fn run_stub(run: StubRun, json: bool, per_file: bool) -> Result<(), StubError> {
    let report = run.run()?;

    let options = ReportOptions {
        format: if json { OutputFormat::Json } else { OutputFormat::Text },
        per_file,
    };
    let output = format_report(&report, &options)?;
    println!("{}", output.trim_end());

    Ok(())
}

// --- File command ---

fn run_file(path: PathBuf, wrap_closure: bool) -> Result<(), StubError> {
    if !path.exists() {
        return Err(StubError::PathNotFound(path));
    }

    let stub = stub_file(&path, &PrintOptions::new().wrap_closure(wrap_closure))?;
    print!("{}", stub.text);

    Ok(())
}

// --- Inspect command ---

fn run_inspect(path: PathBuf) -> Result<(), StubError> {
    if !path.exists() {
        return Err(StubError::PathNotFound(path));
    }

    let text = fs::read_to_string(&path)?;
    let result = extract(&split_lines(&text)).map_err(|source| StubError::Extract {
        path: path.clone(),
        source,
    })?;

    println!("{}", format_extraction(&path, &result)?);

    Ok(())
}
