use mgen_backend::naming::NamingPolicy;
use mgen_backend::postprocess::tidy;
use mgen_backend::writer::FormatWriter;
use mgen_types::Target;
use rstest::rstest;

#[test]
fn test_writer_tracks_indentation() {
    let mut writer = FormatWriter::new();
    writer.line("fn outer() {");
    writer.indent();
    writer.line("inner();");
    writer.dedent();
    writer.line("}");
    assert_eq!(writer.finish(), "fn outer() {\n    inner();\n}\n");
}

#[test]
fn test_writer_custom_unit() {
    let mut writer = FormatWriter::with_unit("\t");
    writer.indent();
    writer.line("x");
    assert_eq!(writer.finish(), "\tx\n");
}

#[test]
fn test_finish_terminates_the_file() {
    let mut writer = FormatWriter::new();
    writer.raw("no newline");
    assert!(writer.finish().ends_with('\n'));
}

#[rstest]
#[case(Target::C, "struct", "struct_")]
#[case(Target::Rust, "match", "match_")]
#[case(Target::Go, "func", "func_")]
#[case(Target::OCaml, "begin", "begin_")]
#[case(Target::C, "total", "total")]
fn test_reserved_words_are_escaped(
    #[case] target: Target,
    #[case] name: &str,
    #[case] escaped: &str,
) {
    assert_eq!(NamingPolicy::for_target(target).escape(name), escaped);
}

#[test]
fn test_tidy_collapses_blank_runs() {
    let messy = "a\n\n\n\nb   \n\nc\n";
    assert_eq!(tidy(messy), "a\n\nb\n\nc\n");
}
