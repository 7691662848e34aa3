use mgen_error::{ErrorCode, LineInfo};

#[test]
fn test_checker_rules_keep_their_published_identifiers() {
    assert_eq!(ErrorCode::BinaryTypeConsistency.code(), "TS001");
    assert_eq!(ErrorCode::LossyConversion.code(), "TS002");
    assert_eq!(ErrorCode::DivisionByZero.code(), "TS003");
    assert_eq!(ErrorCode::UnreachableCode.code(), "SA001");
    assert_eq!(ErrorCode::ReadOnlyParameter.code(), "SA005");
    assert_eq!(ErrorCode::ExcessiveComplexity.code(), "CC004");
    assert_eq!(ErrorCode::UnguardedIndex.code(), "MS001");
}

#[test]
fn test_code_families() {
    assert!(ErrorCode::UnsupportedFeature.is_validation_error());
    assert!(ErrorCode::TypeInconsistency.is_analysis_error());
    assert!(ErrorCode::UnguardedIndex.is_checker_rule());
    assert!(!ErrorCode::UnsupportedMethod.is_checker_rule());
}

#[test]
fn test_display_brackets_the_code() {
    assert_eq!(ErrorCode::UnsupportedFeature.to_string(), "[V1001]");
    assert_eq!(ErrorCode::ExcessiveComplexity.to_string(), "[CC004]");
}

#[test]
fn test_line_info_maps_offsets() {
    let source = "first\nsecond\nthird";
    let info = LineInfo::new(source);
    assert_eq!(info.line_count(), 3);
    assert_eq!(info.line_col(0), (1, 1));
    assert_eq!(info.line_col(6), (2, 1));
    assert_eq!(info.line_col(8), (2, 3));
    assert_eq!(info.line_text(2), Some("second"));
    assert_eq!(info.line_text(4), None);
}

#[test]
fn test_line_info_handles_trailing_content() {
    let source = "only";
    let info = LineInfo::new(source);
    assert_eq!(info.line_col(3), (1, 4));
    assert_eq!(info.line_text(1), Some("only"));
}
