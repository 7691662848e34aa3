use mgen_backend::generated::GeneratedOutput;
use mgen_error::MgenError;
use mgen_ir::ast::Module;
use mgen_shared::{CompilationContext, Diagnostic, DiagnosticEngine, Severity};
use mgen_types::{Config, Phase};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag, checked at phase boundaries only
///
/// A translation never suspends inside a phase; callers that want to
/// abort a batch set the flag and the pipeline stops before starting the
/// next phase.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests cancellation at the next phase boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What happened to one pipeline phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The phase ran to completion
    Completed { detail: String },
    /// The phase did not run
    Skipped { reason: String },
    /// The phase ran and produced error diagnostics
    Failed { errors: usize },
}

/// The result of one translation request
///
/// `success` is true only when no error-severity diagnostic was emitted
/// during any phase. Output files are keyed by their relative path;
/// ordered maps keep two translations of the same input byte-identical.
#[derive(Debug)]
pub struct PipelineResult {
    /// Whether every phase completed without error diagnostics
    pub success: bool,
    /// Generated files: relative path -> contents
    pub output_files: BTreeMap<String, String>,
    /// Every diagnostic collected across all phases
    pub diagnostics: Vec<Diagnostic>,
    /// Per-phase outcomes in phase order
    pub phase_results: BTreeMap<Phase, PhaseOutcome>,
}

impl PipelineResult {
    /// The error-severity diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Condenses a failed run into the caller-facing error taxonomy
    ///
    /// ### Returns
    /// * `None` when the run succeeded
    /// * `Some(MgenError)` carrying every error diagnostic otherwise
    pub fn failure(&self) -> Option<MgenError> {
        if self.success {
            return None;
        }
        let errors = self.errors().cloned().map(Into::into).collect();
        Some(MgenError::Multiple { errors })
    }
}

/// Translates one source file through the seven-phase pipeline
///
/// ### Arguments
/// * `source` - The source text
/// * `filename` - The input file name; its stem names the outputs
/// * `config` - Target and optimizer configuration
///
/// ### Returns
/// The pipeline result with generated files, diagnostics, and per-phase
/// outcomes
pub fn translate(source: &str, filename: &str, config: &Config) -> PipelineResult {
    translate_with_cancel(source, filename, config, &CancelToken::new())
}

/// [`translate`] with an external cancellation token
pub fn translate_with_cancel(
    source: &str,
    filename: &str,
    config: &Config,
    cancel: &CancelToken,
) -> PipelineResult {
    let pipeline = TranslationPipeline::new(source, filename, config.clone(), cancel.clone());

    let generated = pipeline
        .validate()
        .and_then(|pipeline, module| pipeline.analyze(module))
        .and_then(|pipeline, module| pipeline.optimize_source(module))
        .and_then(|pipeline, module| pipeline.map_types(module))
        .and_then(|pipeline, module| pipeline.generate(module))
        .and_then(|pipeline, output| pipeline.optimize_target(output))
        .and_then(|pipeline, output| pipeline.build(output));

    match generated {
        PipelineStage::Success { pipeline, data } => pipeline.finish(Some(data)),
        PipelineStage::Failed { pipeline } => pipeline.finish(None),
    }
}

/// Runs only Validation and Analysis, for diagnostic-only requests
pub fn check(source: &str, filename: &str, config: &Config) -> PipelineResult {
    let pipeline = TranslationPipeline::new(source, filename, config.clone(), CancelToken::new());
    match pipeline
        .validate()
        .and_then(|pipeline, module| pipeline.analyze(module))
    {
        PipelineStage::Success { pipeline, .. } => pipeline.finish(None),
        PipelineStage::Failed { pipeline } => pipeline.finish(None),
    }
}

/// A composable translation pipeline
///
/// Each phase consumes the pipeline and returns a stage carrying either
/// the phase's output or the pipeline with its diagnostics. Error
/// collection never stops inside a phase; a phase only refuses to start
/// when an earlier one failed in a way that makes its input meaningless.
pub struct TranslationPipeline {
    /// The source text being translated
    source: String,
    /// The compilation context threaded through every phase
    context: CompilationContext,
    /// The diagnostic engine collecting everything the phases report
    diagnostics: DiagnosticEngine,
    /// Pipeline configuration
    config: Config,
    /// Output file stem, from the input file name
    stem: String,
    /// Cooperative cancellation flag
    cancel: CancelToken,
    /// Per-phase outcomes recorded so far
    phase_results: BTreeMap<Phase, PhaseOutcome>,
}

/// Represents a stage in the translation pipeline
pub enum PipelineStage<T> {
    /// The stage completed and produced data for the next stage
    Success {
        pipeline: TranslationPipeline,
        data: T,
    },
    /// The stage failed and downstream phases cannot proceed
    Failed { pipeline: TranslationPipeline },
}

impl<T> PipelineStage<T> {
    /// Chains pipeline stages together, continuing only on success
    pub fn and_then<U, F>(self, f: F) -> PipelineStage<U>
    where
        F: FnOnce(TranslationPipeline, T) -> PipelineStage<U>,
    {
        match self {
            PipelineStage::Success { pipeline, data } => f(pipeline, data),
            PipelineStage::Failed { pipeline } => PipelineStage::Failed { pipeline },
        }
    }
}

impl TranslationPipeline {
    fn new(source: &str, filename: &str, config: Config, cancel: CancelToken) -> Self {
        let mut diagnostics = DiagnosticEngine::new();
        diagnostics.set_file_name(filename.to_string());

        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("out")
            .to_string();

        TranslationPipeline {
            source: source.to_string(),
            context: CompilationContext::new(),
            diagnostics,
            config,
            stem,
            cancel,
            phase_results: BTreeMap::new(),
        }
    }

    fn record(&mut self, phase: Phase, outcome: PhaseOutcome) {
        self.phase_results.insert(phase, outcome);
    }

    fn cancelled(&mut self, phase: Phase) -> bool {
        if self.cancel.is_cancelled() {
            self.record(
                phase,
                PhaseOutcome::Skipped {
                    reason: "cancelled".to_string(),
                },
            );
            true
        } else {
            false
        }
    }

    /// Phase 1: Validation — parse the source and reject everything
    /// outside the subset, reporting every violation in one pass
    fn validate(mut self) -> PipelineStage<Module> {
        if self.cancelled(Phase::Validation) {
            return PipelineStage::Failed { pipeline: self };
        }
        match mgen_frontend::parse_and_validate(&self.source) {
            Ok(module) => {
                #[cfg(feature = "print-ast")]
                mgen_ir::ast_printer::print_module(&module);
                self.record(
                    Phase::Validation,
                    PhaseOutcome::Completed {
                        detail: format!("{} declaration(s)", module.declarations.len()),
                    },
                );
                PipelineStage::Success {
                    pipeline: self,
                    data: module,
                }
            }
            Err(errors) => {
                self.record(Phase::Validation, PhaseOutcome::Failed { errors: errors.len() });
                self.diagnostics.emit_all(errors);
                PipelineStage::Failed { pipeline: self }
            }
        }
    }

    /// Phase 2: Analysis — type inference, mutability classification, and
    /// the constraint and memory-safety checkers
    fn analyze(mut self, mut module: Module) -> PipelineStage<Module> {
        if self.cancelled(Phase::Analysis) {
            return PipelineStage::Failed { pipeline: self };
        }

        let inference = mgen_frontend::semantic_analysis::execute(&mut module, &mut self.context);
        let inference_errors = match &inference {
            Ok(()) => 0,
            Err(errors) => errors.len(),
        };

        // Checkers run even when inference reported problems, so one run
        // surfaces as much as possible
        let findings =
            mgen_frontend::checkers::run_all(&module, &self.context, &self.config);
        let checker_errors = findings
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        for finding in findings {
            self.diagnostics.emit(finding);
        }
        if let Err(errors) = inference {
            self.diagnostics.emit_all(errors);
        }

        let mut detail = String::from("types and mutability resolved");
        if self.config.enable_advanced_analysis {
            detail.push_str("; advanced analyzers reserved");
        }
        if self.config.enable_formal_verification {
            detail.push_str("; formal verification reserved");
        }

        if inference_errors + checker_errors > 0 {
            self.record(
                Phase::Analysis,
                PhaseOutcome::Failed {
                    errors: inference_errors + checker_errors,
                },
            );
            PipelineStage::Failed { pipeline: self }
        } else {
            self.record(Phase::Analysis, PhaseOutcome::Completed { detail });
            PipelineStage::Success {
                pipeline: self,
                data: module,
            }
        }
    }

    /// Phase 3: Source-level optimization — optional constant folding
    fn optimize_source(mut self, mut module: Module) -> PipelineStage<Module> {
        if self.cancelled(Phase::SourceOptimization) {
            return PipelineStage::Failed { pipeline: self };
        }
        if self.config.run_source_optimizer() {
            let folded = mgen_frontend::optimizer::fold_module(&mut module);
            self.record(
                Phase::SourceOptimization,
                PhaseOutcome::Completed {
                    detail: format!("{} constant(s) folded", folded),
                },
            );
        } else {
            self.record(
                Phase::SourceOptimization,
                PhaseOutcome::Skipped {
                    reason: "disabled".to_string(),
                },
            );
        }
        PipelineStage::Success {
            pipeline: self,
            data: module,
        }
    }

    /// Phase 4: Mapping — resolve every semantic type against the
    /// target's type system
    fn map_types(mut self, module: Module) -> PipelineStage<Module> {
        if self.cancelled(Phase::Mapping) {
            return PipelineStage::Failed { pipeline: self };
        }
        match mgen_backend::mapping::check_module(&module, self.config.target) {
            Ok(()) => {
                self.record(
                    Phase::Mapping,
                    PhaseOutcome::Completed {
                        detail: format!("types mapped for {}", self.config.target.name()),
                    },
                );
                PipelineStage::Success {
                    pipeline: self,
                    data: module,
                }
            }
            Err(errors) => {
                self.record(Phase::Mapping, PhaseOutcome::Failed { errors: errors.len() });
                self.diagnostics.emit_all(errors);
                PipelineStage::Failed { pipeline: self }
            }
        }
    }

    /// Phase 6: Generation — the target converter walks the typed AST
    fn generate(mut self, module: Module) -> PipelineStage<GeneratedOutput> {
        if self.cancelled(Phase::Generation) {
            return PipelineStage::Failed { pipeline: self };
        }
        match mgen_backend::generate(&module, &mut self.context, self.config.target, &self.stem) {
            Ok(output) => {
                self.record(
                    Phase::Generation,
                    PhaseOutcome::Completed {
                        detail: format!("{} file(s)", output.files.len()),
                    },
                );
                PipelineStage::Success {
                    pipeline: self,
                    data: output,
                }
            }
            Err(errors) => {
                self.record(
                    Phase::Generation,
                    PhaseOutcome::Failed { errors: errors.len() },
                );
                self.diagnostics.emit_all(errors);
                PipelineStage::Failed { pipeline: self }
            }
        }
    }

    /// Phase 5 (sequenced after generation because it rewrites generated
    /// text): optional textual cleanup
    fn optimize_target(mut self, mut output: GeneratedOutput) -> PipelineStage<GeneratedOutput> {
        if self.cancelled(Phase::TargetOptimization) {
            return PipelineStage::Failed { pipeline: self };
        }
        if self.config.run_target_optimizer() {
            for (_, contents) in &mut output.files {
                *contents = mgen_backend::postprocess::tidy(contents);
            }
            self.record(
                Phase::TargetOptimization,
                PhaseOutcome::Completed {
                    detail: "generated text tidied".to_string(),
                },
            );
        } else {
            self.record(
                Phase::TargetOptimization,
                PhaseOutcome::Skipped {
                    reason: "disabled".to_string(),
                },
            );
        }
        PipelineStage::Success {
            pipeline: self,
            data: output,
        }
    }

    /// Phase 7: Build — runtime side files and the build descriptor; the
    /// external compiler is never invoked
    fn build(mut self, mut output: GeneratedOutput) -> PipelineStage<GeneratedOutput> {
        if self.cancelled(Phase::Build) {
            return PipelineStage::Failed { pipeline: self };
        }
        let side_files = mgen_backend::builder::side_files(self.config.target, &self.stem);
        let count = side_files.len();
        for (path, contents) in side_files {
            output.push(path, contents);
        }
        self.record(
            Phase::Build,
            PhaseOutcome::Completed {
                detail: format!("{} side file(s)", count),
            },
        );
        PipelineStage::Success {
            pipeline: self,
            data: output,
        }
    }

    /// Assembles the final result
    fn finish(self, output: Option<GeneratedOutput>) -> PipelineResult {
        let success = !self.diagnostics.has_errors();
        let output_files = match (success, output) {
            (true, Some(output)) => output.files.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        PipelineResult {
            success,
            output_files,
            diagnostics: self.diagnostics.into_diagnostics(),
            phase_results: self.phase_results,
        }
    }
}
