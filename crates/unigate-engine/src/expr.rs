// Copyright 2025 Unigate Contributors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The condition-expression grammar and its strict parser.
//!
//! ```text
//! Expression := Comparison
//!             | { "allOf": [Comparison, ...] }
//!             | { "anyOf": [Comparison, ...] }
//! Comparison := { "field": FieldPath, "op": Operator, "value": Literal | FieldRef }
//! FieldRef   := "$" FieldPath   (right-hand side resolved against the context)
//! Operator   := "eq" | "neq" | "in" | "gt" | "lt" | "gte" | "lte"
//! ```
//!
//! Policies store conditions as untyped JSON blobs, so everything here is
//! parsed defensively: an unknown operator, a stray key, or the wrong shape
//! produces a [`ConditionParseError`] up front rather than a surprise
//! mid-evaluation. Nested boolean composition (`not`, an `allOf` inside an
//! `anyOf`) is intentionally out of grammar and rejected the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A condition expression failed to parse.
///
/// The decision combinator treats the owning policy as not applicable
/// (fail-closed) and reports the failure; nothing here ever panics on
/// untrusted input.
#[derive(Error, Debug)]
pub enum ConditionParseError {
    /// The stored condition text is not valid JSON at all.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The expression (or a sub-comparison) is not a JSON object.
    #[error("condition must be a JSON object, got {0}")]
    NotAnObject(String),

    /// The `op` field names no known operator.
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    /// A comparison object has missing, mistyped, or unexpected keys.
    #[error("malformed comparison: {0}")]
    BadComparison(String),

    /// An `allOf`/`anyOf` value is not an array, or the combinator key is
    /// mixed with other keys.
    #[error("malformed `{key}` list: {message}")]
    BadList {
        /// The combinator key (`allOf` or `anyOf`).
        key: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Comparison operator between a context field and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Deep value equality.
    Eq,
    /// Negated deep value equality.
    Neq,
    /// Membership of the left side in the right-side sequence.
    In,
    /// Strictly greater than.
    Gt,
    /// Strictly less than.
    Lt,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
}

impl Operator {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "in" => Some(Self::In),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }
}

/// A single `field op value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Dotted path into the evaluation context (e.g. `"user.id"`).
    pub field: String,
    /// The comparison operator.
    pub op: Operator,
    /// Literal right-hand side, or a `$`-prefixed field reference resolved
    /// against the context at evaluation time.
    pub value: Value,
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// A bare comparison.
    Comparison(Comparison),
    /// True iff every sub-comparison is true; an empty list is true.
    AllOf(Vec<Comparison>),
    /// True iff at least one sub-comparison is true; an empty list is false.
    AnyOf(Vec<Comparison>),
}

impl Expression {
    /// Parses a condition expression from its stored JSON form.
    pub fn parse(value: &Value) -> Result<Self, ConditionParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ConditionParseError::NotAnObject(type_name(value).to_string()))?;

        if object.contains_key("allOf") {
            return Ok(Self::AllOf(parse_comparison_list(object, "allOf")?));
        }
        if object.contains_key("anyOf") {
            return Ok(Self::AnyOf(parse_comparison_list(object, "anyOf")?));
        }
        Ok(Self::Comparison(parse_comparison(value)?))
    }

    /// Parses a condition expression from JSON-encoded text, as read from a
    /// text-typed storage column.
    pub fn parse_str(raw: &str) -> Result<Self, ConditionParseError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::parse(&value)
    }

    /// Parses whatever shape the store handed back: a JSON string column
    /// yields `Value::String` holding encoded JSON, a JSONB column yields
    /// the document itself. Both are accepted.
    pub fn from_stored(stored: &Value) -> Result<Self, ConditionParseError> {
        match stored {
            Value::String(raw) => Self::parse_str(raw),
            other => Self::parse(other),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_comparison_list(
    object: &serde_json::Map<String, Value>,
    key: &'static str,
) -> Result<Vec<Comparison>, ConditionParseError> {
    if object.len() != 1 {
        return Err(ConditionParseError::BadList {
            key,
            message: format!("`{key}` cannot be combined with other keys"),
        });
    }
    let items = object[key]
        .as_array()
        .ok_or_else(|| ConditionParseError::BadList {
            key,
            message: format!("`{key}` must be an array, got {}", type_name(&object[key])),
        })?;
    items.iter().map(parse_comparison).collect()
}

fn parse_comparison(value: &Value) -> Result<Comparison, ConditionParseError> {
    let object = value
        .as_object()
        .ok_or_else(|| ConditionParseError::NotAnObject(type_name(value).to_string()))?;

    for key in object.keys() {
        if key != "field" && key != "op" && key != "value" {
            return Err(ConditionParseError::BadComparison(format!(
                "unexpected key `{key}`"
            )));
        }
    }

    let field = object
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| ConditionParseError::BadComparison("missing or non-string `field`".into()))?;
    let op_raw = object
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| ConditionParseError::BadComparison("missing or non-string `op`".into()))?;
    let op = Operator::parse(op_raw)
        .ok_or_else(|| ConditionParseError::UnknownOperator(op_raw.to_string()))?;
    let value = object
        .get("value")
        .ok_or_else(|| ConditionParseError::BadComparison("missing `value`".into()))?
        .clone();

    Ok(Comparison {
        field: field.to_string(),
        op,
        value,
    })
}
