//! Pipeline orchestration: phase outcomes, halting, determinism,
//! optimizer gating, and cancellation

use crate::test_utils::translate_for;
use mgen::translation_pipeline::{
    check, translate, translate_with_cancel, CancelToken, PhaseOutcome,
};
use mgen_types::{Config, OptimizationLevel, Phase, Target, ALL_PHASES};

const PROGRAM: &str = r#"
def double(n: int) -> int:
    return n * 2
"#;

#[test]
fn test_all_phases_are_recorded() {
    let result = translate_for(PROGRAM, Target::C);
    assert!(result.success);
    for phase in ALL_PHASES {
        assert!(
            result.phase_results.contains_key(phase),
            "missing outcome for {:?}",
            phase
        );
    }
}

#[test]
fn test_optimizers_are_skipped_by_default() {
    let result = translate_for(PROGRAM, Target::C);
    assert!(matches!(
        result.phase_results[&Phase::SourceOptimization],
        PhaseOutcome::Skipped { .. }
    ));
    assert!(matches!(
        result.phase_results[&Phase::TargetOptimization],
        PhaseOutcome::Skipped { .. }
    ));
}

#[test]
fn test_source_optimizer_folds_constants() {
    let source = r#"
def answer() -> int:
    return 6 * 7
"#;
    let config = Config {
        target: Target::C,
        optimization: OptimizationLevel::Basic,
        enable_formal_verification: false,
        enable_advanced_analysis: false,
        enable_compile_time_optimization: true,
    };
    let result = translate(source, "test_input.py", &config);
    assert!(result.success, "{:?}", result.diagnostics);
    match &result.phase_results[&Phase::SourceOptimization] {
        PhaseOutcome::Completed { detail } => assert!(detail.contains("1 constant")),
        other => panic!("expected a completed optimizer phase, got {:?}", other),
    }
    let output = &result.output_files["test_input.c"];
    assert!(output.contains("return 42;"), "{}", output);
}

#[test]
fn test_failure_condenses_into_the_error_taxonomy() {
    let source = "def f() -> int:\n    return missing\n";
    let result = translate_for(source, Target::C);
    let failure = result.failure().expect("failed runs expose an error");
    assert!(failure.to_string().contains("error"));

    let ok = translate_for(PROGRAM, Target::C);
    assert!(ok.failure().is_none());
}

#[test]
fn test_generation_never_runs_after_analysis_errors() {
    let source = "def f() -> int:\n    return missing\n";
    let result = translate_for(source, Target::C);
    assert!(!result.success);
    assert!(matches!(
        result.phase_results[&Phase::Analysis],
        PhaseOutcome::Failed { .. }
    ));
    assert!(!result.phase_results.contains_key(&Phase::Generation));
    assert!(result.output_files.is_empty());
}

#[test]
fn test_translations_are_byte_identical() {
    let sources = [PROGRAM];
    for target in [Target::C, Target::Cpp, Target::Rust, Target::Go] {
        for source in sources {
            let first = translate_for(source, target);
            let second = translate_for(source, target);
            assert_eq!(
                first.output_files, second.output_files,
                "two translations of the same input must match for {}",
                target.name()
            );
        }
    }
}

#[test]
fn test_check_runs_without_generating() {
    let result = check(PROGRAM, "test_input.py", &Config::for_target(Target::C));
    assert!(result.success);
    assert!(result.output_files.is_empty());
    assert!(result.phase_results.contains_key(&Phase::Analysis));
    assert!(!result.phase_results.contains_key(&Phase::Generation));
}

#[test]
fn test_cancellation_is_checked_at_phase_boundaries() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let result =
        translate_with_cancel(PROGRAM, "test_input.py", &Config::for_target(Target::C), &cancel);
    assert!(result.output_files.is_empty());
    assert!(matches!(
        result.phase_results[&Phase::Validation],
        PhaseOutcome::Skipped { .. }
    ));
}

#[test]
fn test_build_phase_emits_descriptor_per_target() {
    let c = translate_for(PROGRAM, Target::C);
    assert!(c.output_files.contains_key("Makefile"));

    let go = translate_for(PROGRAM, Target::Go);
    assert!(go.output_files.contains_key("go.mod"));

    let rust = translate_for(PROGRAM, Target::Rust);
    assert!(!rust.output_files.contains_key("Makefile"));
    assert!(rust.output_files.contains_key("test_input.rs"));
}

#[test]
fn test_reserved_verification_switches_are_recorded() {
    let config = Config {
        target: Target::C,
        optimization: OptimizationLevel::None,
        enable_formal_verification: true,
        enable_advanced_analysis: true,
        enable_compile_time_optimization: false,
    };
    let result = translate(PROGRAM, "test_input.py", &config);
    assert!(result.success);
    match &result.phase_results[&Phase::Analysis] {
        PhaseOutcome::Completed { detail } => {
            assert!(detail.contains("formal verification reserved"));
            assert!(detail.contains("advanced analyzers reserved"));
        }
        other => panic!("expected completed analysis, got {:?}", other),
    }
}
