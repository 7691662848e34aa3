use mgen_types::{ContainerKind, Mutability, SemanticType, Target};
use rstest::rstest;

#[rstest]
#[case(SemanticType::Int, "int")]
#[case(SemanticType::Str, "str")]
#[case(SemanticType::List(Box::new(SemanticType::Int)), "list[int]")]
#[case(
    SemanticType::Dict(Box::new(SemanticType::Str), Box::new(SemanticType::Int)),
    "dict[str, int]"
)]
#[case(SemanticType::Set(Box::new(SemanticType::Float)), "set[float]")]
fn test_display_uses_source_syntax(#[case] ty: SemanticType, #[case] rendered: &str) {
    assert_eq!(ty.to_string(), rendered);
}

#[test]
fn test_join_is_identity_on_unknown() {
    let list_int = SemanticType::List(Box::new(SemanticType::Int));
    let list_unknown = SemanticType::List(Box::new(SemanticType::Unknown));
    assert_eq!(list_unknown.join(&list_int), Some(list_int.clone()));
    assert_eq!(list_int.join(&list_unknown), Some(list_int));
}

#[test]
fn test_join_promotes_int_to_float() {
    assert_eq!(
        SemanticType::Int.join(&SemanticType::Float),
        Some(SemanticType::Float)
    );
}

#[test]
fn test_join_rejects_incompatible_types() {
    assert_eq!(SemanticType::Int.join(&SemanticType::Str), None);
}

#[rstest]
#[case(SemanticType::List(Box::new(SemanticType::Int)), Some(ContainerKind::Vec))]
#[case(
    SemanticType::Dict(Box::new(SemanticType::Str), Box::new(SemanticType::Int)),
    Some(ContainerKind::Map)
)]
#[case(SemanticType::Str, Some(ContainerKind::Str))]
#[case(SemanticType::Int, None)]
fn test_container_kinds(#[case] ty: SemanticType, #[case] kind: Option<ContainerKind>) {
    assert_eq!(ty.container_kind(), kind);
}

#[test]
fn test_unknown_is_found_at_any_depth() {
    let nested = SemanticType::Dict(
        Box::new(SemanticType::Str),
        Box::new(SemanticType::List(Box::new(SemanticType::Unknown))),
    );
    assert!(nested.contains_unknown());
    assert!(!nested.is_fully_resolved());
}

#[test]
fn test_dict_iteration_yields_keys() {
    let dict = SemanticType::Dict(Box::new(SemanticType::Str), Box::new(SemanticType::Int));
    assert_eq!(dict.iteration_element(), Some(SemanticType::Str));
    assert_eq!(dict.subscript_element(), Some(SemanticType::Int));
}

#[rstest]
#[case(ContainerKind::Vec, "append", true)]
#[case(ContainerKind::Vec, "pop", true)]
#[case(ContainerKind::Set, "add", true)]
#[case(ContainerKind::Str, "upper", false)]
#[case(ContainerKind::Map, "keys", false)]
fn test_mutating_methods(
    #[case] kind: ContainerKind,
    #[case] method: &str,
    #[case] mutating: bool,
) {
    assert!(kind.recognizes(method));
    assert_eq!(kind.is_mutating_method(method), mutating);
}

#[test]
fn test_immutable_implies_read_only() {
    assert!(Mutability::Immutable.is_read_only());
    assert!(Mutability::ReadOnly.is_read_only());
    assert!(!Mutability::Mutable.is_read_only());
}

#[rstest]
#[case(Target::C, "c", true)]
#[case(Target::LlvmIr, "ll", true)]
#[case(Target::Rust, "rs", false)]
#[case(Target::Haskell, "hs", false)]
fn test_target_properties(
    #[case] target: Target,
    #[case] extension: &str,
    #[case] runtime: bool,
) {
    assert_eq!(target.file_extension(), extension);
    assert_eq!(target.uses_runtime_library(), runtime);
}

#[test]
fn test_target_names_round_trip() {
    assert_eq!(Target::from_str("ocaml"), Some(Target::OCaml));
    assert_eq!(Target::OCaml.name(), "ocaml");
    assert_eq!(Target::from_str("cobol"), None);
}
