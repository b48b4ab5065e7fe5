//! `wirestate`: compiles a WireState entry file to the format named by
//! `--generator`, writing the result to stdout (spec §6).
//!
//! Exit codes are part of the contract, not an afterthought: 0 on
//! success, 10 when the compile pipeline returns a diagnostic, 20 when
//! the required `<input-file>` positional is missing. `clap` handles
//! `--help`/`--version` itself (exit 0) since those never reach `run`.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use diag::Diagnostic;

const EXIT_COMPILE_ERROR: u8 = 10;
const EXIT_MISSING_ARGUMENT: u8 = 20;

/// Compiles a WireState statechart file.
#[derive(Parser, Debug)]
#[command(name = "wirestate", version, about)]
struct Cli {
  /// The entry `.ws` file to compile.
  input_file: Option<PathBuf>,

  /// Directory to search for `@include`d files. Repeatable; falls back to
  /// `WIRESTATE_SRC_DIR`, a `:`-separated list, when no flag is given.
  #[arg(long = "srcDir", env = "WIRESTATE_SRC_DIR", value_delimiter = ':')]
  src_dir: Vec<PathBuf>,

  /// Directory used for incremental build state.
  #[arg(long = "cacheDir", default_value = ".wirestate")]
  cache_dir: PathBuf,

  /// Output format: one of the registered `wirestate_codegen` backends.
  #[arg(long = "generator", default_value = "json")]
  generator: String,

  /// Omit guard/action callback names from generated output.
  #[arg(long = "disableCallbacks")]
  disable_callbacks: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let Some(input_file) = cli.input_file else {
    eprintln!("error: the required argument <input-file> was not provided");
    return ExitCode::from(EXIT_MISSING_ARGUMENT);
  };

  if let Err(err) = tokio::fs::create_dir_all(&cli.cache_dir).await {
    tracing::warn!(cache_dir = %cli.cache_dir.display(), %err, "could not create cache directory");
  }

  match run(input_file, cli.src_dir, &cli.generator, cli.disable_callbacks).await {
    Ok(output) => {
      println!("{output}");
      ExitCode::SUCCESS
    }
    Err(diagnostic) => {
      eprintln!("{}", render(&diagnostic).await);
      ExitCode::from(EXIT_COMPILE_ERROR)
    }
  }
}

/// Renders a compile diagnostic as a colored source snippet when its
/// location's file can be re-read, falling back to the plain `Display`
/// form otherwise (e.g. `NotFound`, or a file that vanished mid-compile).
/// Color follows stdout's TTY-ness, matching the rest of this CLI's output.
async fn render(diagnostic: &Diagnostic) -> String {
  let color = std::io::stdout().is_terminal();
  let Some(location) = diagnostic.location() else {
    return diagnostic.to_string();
  };
  match tokio::fs::read_to_string(&location.file).await {
    Ok(src) => diagnostic.report(&src, color),
    Err(_) => diagnostic.to_string(),
  }
}

async fn run(
  input_file: PathBuf,
  src_dirs: Vec<PathBuf>,
  generator: &str,
  disable_callbacks: bool,
) -> Result<String, Arc<Diagnostic>> {
  let search_dirs = if src_dirs.is_empty() {
    vec![std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))]
  } else {
    src_dirs
  };

  let program = analyze::analyze_root(input_file, search_dirs).await?;
  let options = codegen::GenerateOptions { disable_callbacks };
  codegen::generate(generator, &program, &options).map_err(Arc::new)
}
