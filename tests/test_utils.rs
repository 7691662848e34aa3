use mgen::translation_pipeline::{translate, PipelineResult};
use mgen_error::ErrorCode;
use mgen_shared::Severity;
use mgen_types::{Config, Target};

/// Translates a program for the given target with default configuration
///
/// ### Arguments
/// * `source` - The source code of the program to translate
/// * `target` - The target language to emit
pub fn translate_for(source: &str, target: Target) -> PipelineResult {
    translate(source, "test_input.py", &Config::for_target(target))
}

/// The contents of the primary generated file
pub fn primary_output(result: &PipelineResult, target: Target) -> &str {
    let path = format!("test_input.{}", target.file_extension());
    result
        .output_files
        .get(&path)
        .map(String::as_str)
        .unwrap_or_else(|| panic!("no primary output at '{}'", path))
}

/// Translates and asserts the generated source contains every snippet
///
/// ### Arguments
/// * `source` - The source code of the program to translate
/// * `target` - The target language to emit
/// * `snippets` - Text fragments the generated file must contain
pub fn assert_generates(source: &str, target: Target, snippets: &[&str]) {
    let result = translate_for(source, target);
    assert!(
        result.success,
        "translation for {} failed: {:?}",
        target.name(),
        result.diagnostics
    );
    let output = primary_output(&result, target);
    for snippet in snippets {
        assert!(
            output.contains(snippet),
            "generated {} output missing '{}':\n{}",
            target.name(),
            snippet,
            output
        );
    }
}

/// Translates and asserts the run failed with exactly one diagnostic of
/// the given code, carrying a non-empty suggestion
///
/// ### Arguments
/// * `source` - The source code of the program to translate
/// * `code` - The expected error code
pub fn assert_rejected_once(source: &str, code: ErrorCode) {
    let result = translate_for(source, Target::C);
    assert!(!result.success, "expected rejection, got success");
    assert!(
        result.output_files.is_empty(),
        "rejected input must produce no output"
    );
    let matching: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert_eq!(
        matching.len(),
        1,
        "expected exactly one error diagnostic, got {:?}",
        matching
    );
    assert_eq!(matching[0].error_code, code);
    assert!(
        matching[0].suggestion.as_deref().is_some_and(|s| !s.is_empty()),
        "rejection diagnostics must carry a suggestion"
    );
}

/// Check if any diagnostic carries the given rendered code
pub fn has_diagnostic_code(result: &PipelineResult, code: &str) -> bool {
    result
        .diagnostics
        .iter()
        .any(|d| d.error_code.code() == code)
}
