//! Evaluation of parsed condition expressions against a request context.
//!
//! Evaluation is total: every operator application yields a boolean, and
//! anything out of domain (an unresolved path, a type mismatch in an
//! ordering comparison, a non-array right side for `in`) evaluates to
//! false rather than erroring. Unresolved paths are modeled as `None` —
//! the distinguished "undefined" value.

use crate::expr::{Comparison, Expression, Operator};
use serde_json::Value;
use unigate_core::context::EvaluationContext;

/// Evaluates an expression against the context.
pub fn evaluate(expr: &Expression, context: &EvaluationContext) -> bool {
    match expr {
        Expression::Comparison(comparison) => eval_comparison(comparison, context),
        Expression::AllOf(comparisons) => comparisons
            .iter()
            .all(|comparison| eval_comparison(comparison, context)),
        Expression::AnyOf(comparisons) => comparisons
            .iter()
            .any(|comparison| eval_comparison(comparison, context)),
    }
}

fn eval_comparison(comparison: &Comparison, context: &EvaluationContext) -> bool {
    let lhs = context.resolve(&comparison.field);
    let rhs = resolve_operand(&comparison.value, context);

    match comparison.op {
        Operator::Eq => operands_equal(lhs, rhs),
        Operator::Neq => !operands_equal(lhs, rhs),
        Operator::In => match rhs {
            Some(Value::Array(items)) => {
                lhs.is_some_and(|left| items.iter().any(|item| deep_equal(left, item)))
            }
            _ => false,
        },
        Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
            compare_ordered(comparison.op, lhs, rhs)
        }
    }
}

/// A right-hand side beginning with `$` is a field reference resolved
/// against the context; anything else is a literal.
fn resolve_operand<'a>(value: &'a Value, context: &'a EvaluationContext) -> Option<&'a Value> {
    match value {
        Value::String(text) => match text.strip_prefix('$') {
            Some(path) => context.resolve(path),
            None => Some(value),
        },
        _ => Some(value),
    }
}

fn operands_equal(lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    match (lhs, rhs) {
        // undefined equals only undefined
        (None, None) => true,
        (Some(left), Some(right)) => deep_equal(left, right),
        _ => false,
    }
}

/// Deep value equality with numeric normalization: `1` and `1.0` compare
/// equal, arrays and objects compare element-wise.
fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| deep_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering comparisons apply to two numbers (as f64) or two strings
/// (lexicographic). Any other pairing, including an undefined operand,
/// is false.
fn compare_ordered(op: Operator, lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    let (Some(left), Some(right)) = (lhs, rhs) else {
        return false;
    };

    if let (Some(x), Some(y)) = (left.as_f64(), right.as_f64()) {
        return match op {
            Operator::Gt => x > y,
            Operator::Lt => x < y,
            Operator::Gte => x >= y,
            Operator::Lte => x <= y,
            _ => false,
        };
    }

    if let (Value::String(x), Value::String(y)) = (left, right) {
        return match op {
            Operator::Gt => x > y,
            Operator::Lt => x < y,
            Operator::Gte => x >= y,
            Operator::Lte => x <= y,
            _ => false,
        };
    }

    false
}
