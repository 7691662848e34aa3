//! Typing rules for the built-in functions of the source subset

use mgen_types::SemanticType;

/// Check if `name` is one of the supported built-in functions
pub fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "len"
            | "abs"
            | "min"
            | "max"
            | "sum"
            | "print"
            | "range"
            | "str"
            | "int"
            | "float"
            | "bool"
            | "list"
            | "dict"
            | "set"
    )
}

/// The result type of a built-in call, or a message describing why the
/// call is ill-typed
///
/// `Unknown` argument types pass through without complaint; their cause
/// has already been reported.
pub fn builtin_result(name: &str, args: &[SemanticType]) -> Result<SemanticType, String> {
    use SemanticType::{Bool, Dict, Float, Int, List, Set, Str, Unknown, Void};

    match name {
        "len" => {
            expect_arity(name, args, 1)?;
            if args[0].is_container() || matches!(args[0], Unknown) {
                Ok(Int)
            } else {
                Err(format!("len() requires a container, got '{}'", args[0]))
            }
        }
        "abs" => {
            expect_arity(name, args, 1)?;
            match &args[0] {
                Int => Ok(Int),
                Float => Ok(Float),
                Unknown => Ok(Unknown),
                other => Err(format!("abs() requires a number, got '{}'", other)),
            }
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(format!("{}() requires at least one argument", name));
            }
            if args.len() == 1 {
                return match &args[0] {
                    List(elem) | Set(elem) => Ok((**elem).clone()),
                    Unknown => Ok(Unknown),
                    other => Err(format!("{}() of a single argument requires a container, got '{}'", name, other)),
                };
            }
            let mut joined = args[0].clone();
            for arg in &args[1..] {
                joined = joined
                    .join(arg)
                    .ok_or_else(|| format!("{}() arguments have incompatible types", name))?;
            }
            if joined.is_numeric() || matches!(joined, Unknown | Str) {
                Ok(joined)
            } else {
                Err(format!("{}() arguments must be comparable", name))
            }
        }
        "sum" => {
            expect_arity(name, args, 1)?;
            match &args[0] {
                List(elem) | Set(elem) if elem.is_numeric() => Ok((**elem).clone()),
                List(elem) | Set(elem) if matches!(**elem, Unknown) => Ok(Unknown),
                Unknown => Ok(Unknown),
                other => Err(format!("sum() requires a container of numbers, got '{}'", other)),
            }
        }
        "print" => Ok(Void),
        "range" => {
            if args.is_empty() || args.len() > 3 {
                return Err("range() takes 1 to 3 arguments".to_string());
            }
            for arg in args {
                if !matches!(arg, Int | Unknown) {
                    return Err(format!("range() arguments must be integers, got '{}'", arg));
                }
            }
            Ok(List(Box::new(Int)))
        }
        "str" => {
            expect_arity(name, args, 1)?;
            Ok(Str)
        }
        "int" => {
            expect_arity(name, args, 1)?;
            match &args[0] {
                Int | Float | Bool | Str | Unknown => Ok(Int),
                other => Err(format!("int() cannot convert '{}'", other)),
            }
        }
        "float" => {
            expect_arity(name, args, 1)?;
            match &args[0] {
                Int | Float | Str | Unknown => Ok(Float),
                other => Err(format!("float() cannot convert '{}'", other)),
            }
        }
        "bool" => {
            expect_arity(name, args, 1)?;
            Ok(Bool)
        }
        // Empty-container constructors; element types come from the
        // annotation or from flow-sensitive refinement
        "list" => {
            expect_arity(name, args, 0)?;
            Ok(List(Box::new(Unknown)))
        }
        "set" => {
            expect_arity(name, args, 0)?;
            Ok(Set(Box::new(Unknown)))
        }
        "dict" => {
            expect_arity(name, args, 0)?;
            Ok(Dict(Box::new(Unknown), Box::new(Unknown)))
        }
        _ => Err(format!("unknown builtin '{}'", name)),
    }
}

fn expect_arity(name: &str, args: &[SemanticType], expected: usize) -> Result<(), String> {
    if args.len() != expected {
        Err(format!(
            "{}() takes {} argument{}, got {}",
            name,
            expected,
            if expected == 1 { "" } else { "s" },
            args.len()
        ))
    } else {
        Ok(())
    }
}

/// The result type of a recognized container method call
///
/// Dispatches on the receiver's container kind and the method name;
/// returns `None` when the method is not part of the recognized set for
/// that kind.
pub fn container_method_result(
    receiver: &SemanticType,
    method: &str,
    args: &[SemanticType],
) -> Option<SemanticType> {
    use SemanticType::{Bool, Int, List, Set, Str, Tuple, Unknown, Void};

    match receiver {
        List(elem) => match method {
            "append" | "clear" | "extend" | "insert" | "remove" => Some(Void),
            "pop" => Some((**elem).clone()),
            _ => None,
        },
        SemanticType::Dict(key, value) => match method {
            "get" | "pop" | "setdefault" => Some((**value).clone()),
            "keys" => Some(List(key.clone())),
            "values" => Some(List(value.clone())),
            "items" => Some(List(Box::new(Tuple(vec![
                (**key).clone(),
                (**value).clone(),
            ])))),
            "clear" => Some(Void),
            _ => None,
        },
        Set(elem) => match method {
            "add" | "remove" | "discard" | "clear" => Some(Void),
            "union" | "intersection" | "difference" => {
                let joined = match args.first() {
                    Some(Set(other)) => elem.join(other.as_ref())?,
                    Some(Unknown) | None => (**elem).clone(),
                    Some(_) => return Some(Unknown),
                };
                Some(Set(Box::new(joined)))
            }
            _ => None,
        },
        Str => match method {
            "upper" | "lower" | "strip" | "replace" | "join" => Some(Str),
            "split" => Some(List(Box::new(Str))),
            "find" => Some(Int),
            "startswith" | "endswith" => Some(Bool),
            _ => None,
        },
        _ => None,
    }
}
