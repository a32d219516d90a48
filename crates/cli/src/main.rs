mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::check::cmd_check;
use commands::clean::cmd_clean;
use commands::compile::{cmd_compile, CompileArgs};
use commands::validate::cmd_validate;
use config::{Config, Overrides};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Quiz script compiler.
#[derive(Parser)]
#[command(name = "connect-maker", version, about = "Quiz script compiler")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Settings file (default: ./connect-maker.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a quiz script into a game document
    Compile {
        /// Path to the quiz script
        #[arg(default_value = "in.txt")]
        file: PathBuf,
        /// Where to write the document (`-` for stdout)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Content cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Bound, in pixels, of the square images are fitted inside
        #[arg(long)]
        image_size: Option<u32>,
        /// Emit `export default <json>` instead of bare JSON
        #[arg(long)]
        module: bool,
        /// Indent the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Check a quiz script's structure without resolving media
    Check {
        /// Path to the quiz script
        #[arg(default_value = "in.txt")]
        file: PathBuf,
    },

    /// Validate a compiled document against the document JSON Schema
    Validate {
        /// Path to the document (JSON or `--module` output)
        document: PathBuf,
    },

    /// Remove the content cache
    Clean {
        /// Content cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let (output, quiet) = (cli.output, cli.quiet);
    init_logging(quiet);
    let config_path = cli.config;

    match cli.command {
        Commands::Compile {
            file,
            out,
            cache_dir,
            image_size,
            module,
            pretty,
        } => {
            let config = load_config(
                config_path.as_deref(),
                Overrides {
                    cache_dir,
                    output: out,
                    image_size,
                },
                output,
                quiet,
            );
            let args = CompileArgs {
                file,
                module,
                pretty,
            };
            cmd_compile(&args, &config, output, quiet);
        }
        Commands::Check { file } => {
            cmd_check(&file, output, quiet);
        }
        Commands::Validate { document } => {
            cmd_validate(&document, output, quiet);
        }
        Commands::Clean { cache_dir } => {
            let config = load_config(
                config_path.as_deref(),
                Overrides {
                    cache_dir,
                    ..Overrides::default()
                },
                output,
                quiet,
            );
            cmd_clean(&config, output, quiet);
        }
    }
}

fn load_config(
    path: Option<&Path>,
    overrides: Overrides,
    output: OutputFormat,
    quiet: bool,
) -> Config {
    match Config::load(path, config::process_env, overrides) {
        Ok(config) => config,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Log to stderr; stdout is reserved for document output.
fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
