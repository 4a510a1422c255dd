//! sailc-drv - Compiler driver.
//!
//! Orchestrates the pipeline (`emit(validate(parse(lex(source))))`),
//! renders diagnostics with source-line carets, writes the generated
//! program, and (unless `--compile-only`) executes it with `python3`,
//! forwarding the exit code.
//!
//! Exit codes: 0 on success; 1 on lexer/parser/validator/import
//! failures, I/O errors, and internal errors.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use clap::Parser as ClapParser;
use sailc_lex::Lexer;
use sailc_util::{CompileResult, SourceMap};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Command-line configuration for `sailc`.
#[derive(ClapParser, Debug)]
#[command(name = "sailc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bootstrap compiler for the Sailfin language", long_about = None)]
pub struct Config {
    /// Sailfin source file to compile
    pub input: PathBuf,

    /// Output path for the generated program (default: the input path
    /// with a .py extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the artifact without executing it
    #[arg(long)]
    pub compile_only: bool,

    /// Enable diagnostic dumps
    #[arg(short, long, env = "SAILC_VERBOSE")]
    pub verbose: bool,

    /// Accepted for compatibility with older drivers; ignored
    #[arg(long, hide = true)]
    pub force_bootstrap: bool,
}

impl Config {
    /// The effective artifact path.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("py"))
    }
}

/// Initialise logging. `--verbose` lowers the filter to debug.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "sailc=debug,debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// One compilation session.
///
/// Owns the source map used for diagnostic rendering. Sessions are not
/// reentrant; concurrent callers create their own.
pub struct Session {
    pub source_map: SourceMap,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self {
            source_map: SourceMap::new(),
        }
    }

    /// Run the full pipeline over one source string.
    pub fn compile_source(&mut self, source: &str, path: &Path) -> CompileResult<String> {
        let file_id = self
            .source_map
            .add_file(path.display().to_string(), source.to_string());

        debug!(file = %path.display(), bytes = source.len(), "lexing");
        let tokens = Lexer::tokenize_file(source, file_id)?;

        debug!(tokens = tokens.len(), "parsing");
        let program = sailc_par::parse(tokens)?;

        debug!(statements = program.statements.len(), "validating");
        sailc_sem::validate(&program)?;

        debug!("generating code");
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        sailc_gen::emit(&program, Some(path), base_dir)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive a full compiler invocation. Returns the process exit code.
pub fn run(config: &Config) -> i32 {
    match try_run(config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            1
        }
    }
}

fn try_run(config: &Config) -> anyhow::Result<i32> {
    let source = std::fs::read_to_string(&config.input)
        .with_context(|| format!("cannot read {}", config.input.display()))?;

    let mut session = Session::new();
    let python = match session.compile_source(&source, &config.input) {
        Ok(python) => python,
        Err(err) => {
            let diagnostic = err.to_diagnostic(&session.source_map);
            eprintln!("{}", diagnostic.render());
            return Ok(1);
        }
    };

    let output_path = config.output_path();
    std::fs::write(&output_path, &python)
        .with_context(|| format!("cannot write {}", output_path.display()))?;
    info!(artifact = %output_path.display(), "compiled");

    if config.compile_only {
        return Ok(0);
    }

    Ok(execute(&output_path))
}

/// Run the generated program with `python3`, forwarding its exit code.
fn execute(artifact: &Path) -> i32 {
    match Command::new("python3").arg(artifact).status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(err) => {
            eprintln!("error: cannot execute python3: {}", err);
            1
        }
    }
}
