use crate::error::{CliError, CliResult};
use crate::exit;
use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use mgen::translation_pipeline::{self, PipelineResult};
use colored::Colorize;
use mgen_shared::DiagnosticEngine;
use mgen_types::{Config, OptimizationLevel, Target, ALL_TARGETS};
use std::fs;
use std::path::{Path, PathBuf};

/// Command line interface for the MGen translator
#[derive(ClapParser)]
#[command(
    version,
    about = "MGen source-to-source translator",
    long_about = r#"MGen translates a statically-typed source subset into idiomatic code in
one of several target languages (C, C++, Rust, Go, Haskell, OCaml, LLVM IR)."#,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the MGen CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Translate a source file into target code
    Convert {
        /// Input source file
        input: String,

        /// Target language
        #[arg(short, long, value_enum, default_value_t = TargetArg::C)]
        target: TargetArg,

        /// Output directory (default: alongside the input)
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Threshold for the optional optimizer passes
        #[arg(long, value_enum, default_value_t = OptArg::None)]
        optimization: OptArg,

        /// Run the formal verifiers (reserved)
        #[arg(long)]
        enable_formal_verification: bool,

        /// Run the advanced analyzers (reserved)
        #[arg(long)]
        enable_advanced_analysis: bool,

        /// Run the source-level optimizer
        #[arg(long)]
        enable_compile_time_optimization: bool,
    },

    /// Validate and analyze a source file without generating code
    Check {
        /// Input source file
        input: String,

        /// Target language the checkers should assume
        #[arg(short, long, value_enum, default_value_t = TargetArg::C)]
        target: TargetArg,
    },

    /// List the supported target languages
    Targets,
}

/// Target choice as it appears on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetArg {
    C,
    Cpp,
    Rust,
    Go,
    Haskell,
    Ocaml,
    Llvm,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::C => Target::C,
            TargetArg::Cpp => Target::Cpp,
            TargetArg::Rust => Target::Rust,
            TargetArg::Go => Target::Go,
            TargetArg::Haskell => Target::Haskell,
            TargetArg::Ocaml => Target::OCaml,
            TargetArg::Llvm => Target::LlvmIr,
        }
    }
}

/// Optimization level as it appears on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OptArg {
    None,
    Basic,
    Moderate,
    Aggressive,
}

impl From<OptArg> for OptimizationLevel {
    fn from(arg: OptArg) -> Self {
        match arg {
            OptArg::None => OptimizationLevel::None,
            OptArg::Basic => OptimizationLevel::Basic,
            OptArg::Moderate => OptimizationLevel::Moderate,
            OptArg::Aggressive => OptimizationLevel::Aggressive,
        }
    }
}

/// Translate a source file and write the generated files
///
/// ### Arguments
/// * `input` - The input source file
/// * `config` - Pipeline configuration from the flags
/// * `output_dir` - Where to write the outputs (default: input's parent)
pub fn convert_file(input: &str, config: Config, output_dir: Option<String>) -> CliResult<()> {
    let source = read_source_file(input)?;
    let result = translation_pipeline::translate(&source, input, &config);

    report(&result, &source, input);

    if let Some(failure) = result.failure() {
        return Err(CliError::Generic {
            message: format!("{} (in file '{}')", failure, input),
            exit_code: exit::Code::Dataerr,
        });
    }

    let out_dir = resolve_output_dir(input, output_dir);
    fs::create_dir_all(&out_dir).map_err(|e| CliError::Io {
        source: e,
        path: out_dir.display().to_string(),
        exit_code: exit::Code::CantCreat,
    })?;

    for (path, contents) in &result.output_files {
        let full = out_dir.join(path);
        fs::write(&full, contents).map_err(|e| CliError::Io {
            source: e,
            path: full.display().to_string(),
            exit_code: exit::Code::CantCreat,
        })?;
    }

    println!(
        "Wrote {} file(s) to {}",
        result.output_files.len(),
        out_dir.display()
    );
    Ok(())
}

/// Validate and analyze a source file, reporting diagnostics only
///
/// ### Arguments
/// * `input` - The input source file
/// * `target` - The target the target-specific checkers assume
pub fn check_file(input: &str, target: Target) -> CliResult<()> {
    let source = read_source_file(input)?;
    let config = Config::for_target(target);
    let result = translation_pipeline::check(&source, input, &config);

    report(&result, &source, input);

    if result.success {
        println!("{} passed validation and analysis", input);
        Ok(())
    } else {
        Err(CliError::Generic {
            message: format!("Check failed for file '{}'", input),
            exit_code: exit::Code::Dataerr,
        })
    }
}

/// List the supported targets with their properties
pub fn list_targets() {
    println!("{:<10} {:<6} {}", "target", "ext", "runtime library");
    for target in ALL_TARGETS {
        println!(
            "{:<10} {:<6} {}",
            target.name(),
            target.file_extension(),
            if target.uses_runtime_library() {
                "yes"
            } else {
                "no"
            }
        );
    }
}

/// Renders a result's diagnostics to standard error
fn report(result: &PipelineResult, source: &str, input: &str) {
    if result.diagnostics.is_empty() {
        return;
    }
    let mut engine = DiagnosticEngine::new();
    engine.set_file_name(input.to_string());
    for diagnostic in &result.diagnostics {
        engine.emit(diagnostic.clone());
    }
    engine.report_all(source);
    if !result.success {
        eprintln!("{}", "translation aborted".red());
    }
}

fn resolve_output_dir(input: &str, output_dir: Option<String>) -> PathBuf {
    match output_dir {
        Some(dir) => PathBuf::from(dir),
        None => Path::new(input)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Read source code from a file
///
/// ### Arguments
/// * `path` - The path to the source file
///
/// ### Returns
/// The file contents as a string, or a CliError on failure
fn read_source_file(path: &str) -> CliResult<String> {
    fs::read_to_string(path).map_err(|e| CliError::from_io_error(e, path))
}
