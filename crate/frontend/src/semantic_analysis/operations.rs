//! Result-type rules for the operators of the source subset
//!
//! Pure join-rule tables consulted by the inference engine and by the
//! constraint checker (which owns the reporting for binary operand
//! mismatches).

use mgen_ir::ast::{BinaryOperator, CompareOperator, UnaryOperator};
use mgen_types::SemanticType;

/// The result type of a binary operation, or `Err` when the operand types
/// are incompatible
///
/// An `Unknown` operand yields `Unknown` without an error: the failure
/// that produced the `Unknown` has already been reported.
pub fn binary_result_type(
    operator: BinaryOperator,
    left: &SemanticType,
    right: &SemanticType,
) -> Result<SemanticType, ()> {
    use SemanticType::{Float, Int, Str, Unknown};

    if matches!(left, Unknown) || matches!(right, Unknown) {
        return Ok(Unknown);
    }

    match operator {
        BinaryOperator::Add => match (left, right) {
            (Int, Int) => Ok(Int),
            (Int, Float) | (Float, Int) | (Float, Float) => Ok(Float),
            (Str, Str) => Ok(Str),
            _ => Err(()),
        },
        BinaryOperator::Subtract | BinaryOperator::Multiply => numeric_join(left, right),
        // True division always yields a float
        BinaryOperator::Divide => match (left, right) {
            (Int | Float, Int | Float) => Ok(Float),
            _ => Err(()),
        },
        // Floor division preserves integers
        BinaryOperator::FloorDivide | BinaryOperator::Modulo | BinaryOperator::Power => {
            numeric_join(left, right)
        }
        BinaryOperator::BitAnd
        | BinaryOperator::BitOr
        | BinaryOperator::BitXor
        | BinaryOperator::ShiftLeft
        | BinaryOperator::ShiftRight => match (left, right) {
            (Int, Int) => Ok(Int),
            _ => Err(()),
        },
    }
}

fn numeric_join(left: &SemanticType, right: &SemanticType) -> Result<SemanticType, ()> {
    use SemanticType::{Float, Int};
    match (left, right) {
        (Int, Int) => Ok(Int),
        (Int, Float) | (Float, Int) | (Float, Float) => Ok(Float),
        _ => Err(()),
    }
}

/// Check if the operands of a comparison are compatible
///
/// Comparisons always yield `Bool`; this only decides whether the operand
/// pairing makes sense. Membership tests are checked separately.
pub fn comparison_operands_compatible(
    operator: CompareOperator,
    left: &SemanticType,
    right: &SemanticType,
) -> bool {
    use SemanticType::{Float, Int, Unknown};

    if matches!(left, Unknown) || matches!(right, Unknown) {
        return true;
    }
    if matches!(operator, CompareOperator::In | CompareOperator::NotIn) {
        return membership_compatible(left, right);
    }

    if left == right {
        return true;
    }
    matches!((left, right), (Int, Float) | (Float, Int))
}

/// Check if `left in right` is well-typed
///
/// Membership on a dict tests its keys; on a string it tests substrings.
pub fn membership_compatible(left: &SemanticType, right: &SemanticType) -> bool {
    match right {
        SemanticType::List(elem) | SemanticType::Set(elem) => {
            elem.join(left).is_some()
        }
        SemanticType::Dict(key, _) => key.join(left).is_some(),
        SemanticType::Str => matches!(left, SemanticType::Str | SemanticType::Unknown),
        SemanticType::Unknown => true,
        _ => false,
    }
}

/// The result type of a unary operation, or `Err` when the operand type
/// does not support it
pub fn unary_result_type(
    operator: UnaryOperator,
    operand: &SemanticType,
) -> Result<SemanticType, ()> {
    use SemanticType::{Bool, Float, Int, Unknown};

    if matches!(operand, Unknown) {
        return Ok(Unknown);
    }

    match operator {
        UnaryOperator::Negate => match operand {
            Int => Ok(Int),
            Float => Ok(Float),
            _ => Err(()),
        },
        UnaryOperator::Not => match operand {
            Bool => Ok(Bool),
            _ => Err(()),
        },
        UnaryOperator::Invert => match operand {
            Int => Ok(Int),
            _ => Err(()),
        },
    }
}
