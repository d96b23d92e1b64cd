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

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Condition-expression evaluation and access decisions for Unigate.
//!
//! Conditions are stored on policy records as untyped JSON. This crate
//! parses them into a typed [`expr::Expression`] tree up front (unknown
//! shapes are rejected as malformed, never interpreted loosely), evaluates
//! the tree against an `EvaluationContext`, and combines every matching
//! policy into one allow/deny [`Decision`] with deny-overrides semantics.
//!
//! [`Decision`]: unigate_core::policy::Decision

pub mod engine;
pub mod eval;
pub mod expr;

pub use engine::PolicyEngine;
pub use expr::{Comparison, ConditionParseError, Expression, Operator};
