//! coolc-drv - Compiler driver.
//!
//! Orchestrates the pipeline over the input files:
//!
//! ```text
//! source (.cl)
//!     │
//!     ▼
//! [coolc-lex]  ──▶ tokens        (--emit-tokens stops here)
//!     │
//!     ▼
//! [coolc-par]  ──▶ AST           (--emit-ast stops here)
//!     │
//!     ▼
//! [coolc-sem]  ──▶ typed AST + type environment
//!     │
//!     ▼
//! [coolc-gen]  ──▶ MIPS assembly ──▶ <basename>.s
//! ```
//!
//! Each input file is a complete program and compiles independently;
//! the first error of any phase aborts that compilation with exit
//! code 1 and one diagnostic line on stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// What the driver writes out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmitType {
    /// The lexer's token dump, to stdout.
    Tokens,
    /// The parser's AST dump, to stdout.
    Ast,
    /// SPIM assembly, to `<basename>.s` (or stdout with `--stdout`).
    #[default]
    Asm,
}

/// Parsed command line.
#[derive(Debug, Default)]
pub struct Config {
    pub input_files: Vec<PathBuf>,
    pub emit: EmitType,
    /// Write assembly to stdout instead of `<basename>.s`.
    pub to_stdout: bool,
}

impl Config {
    /// Parses command-line arguments (without the program name).
    pub fn from_args(args: impl Iterator<Item = String>) -> Result<Self> {
        let mut config = Config::default();
        for arg in args {
            match arg.as_str() {
                "--emit-tokens" => config.emit = EmitType::Tokens,
                "--emit-ast" => config.emit = EmitType::Ast,
                "--stdout" => config.to_stdout = true,
                _ if arg.starts_with("--") => bail!("unknown option {arg}"),
                _ => config.input_files.push(PathBuf::from(arg)),
            }
        }
        if config.input_files.is_empty() {
            bail!("Usage: coolc [--emit-tokens | --emit-ast] [--stdout] <source-files>...");
        }
        Ok(config)
    }
}

/// One compiler run over a set of input files.
pub struct Session {
    pub config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Compiles every input file, stopping at the first failure.
    pub fn compile(&self) -> Result<()> {
        for path in &self.config.input_files {
            self.compile_file(path)?;
        }
        Ok(())
    }

    fn compile_file(&self, path: &Path) -> Result<()> {
        let filename = path.to_string_lossy().into_owned();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {filename}"))?;

        let tokens = coolc_lex::tokenize(&source);
        if self.config.emit == EmitType::Tokens {
            print!("{}", coolc_lex::dump_tokens(&filename, &tokens));
            return Ok(());
        }

        let mut program = coolc_par::parse(&tokens, &filename)?;
        if self.config.emit == EmitType::Ast {
            print!("{}", coolc_par::dump_program(&program));
            return Ok(());
        }

        let env = coolc_sem::analyze(&mut program)?;
        let assembly = coolc_gen::generate(&program, &env)?;

        if self.config.to_stdout {
            print!("{assembly}");
        } else {
            let output = path.with_extension("s");
            std::fs::write(&output, assembly)
                .with_context(|| format!("cannot write {}", output.display()))?;
        }
        Ok(())
    }
}

/// Runs the full pipeline on an in-memory source, returning the
/// assembly. The driver's own tests and embedders use this.
pub fn compile_source(source: &str, filename: &str) -> Result<String> {
    let tokens = coolc_lex::tokenize(source);
    let mut program = coolc_par::parse(&tokens, filename)?;
    let env = coolc_sem::analyze(&mut program)?;
    Ok(coolc_gen::generate(&program, &env)?)
}
