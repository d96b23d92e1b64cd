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

//! Core policy types, traits, and errors shared across the Unigate
//! access-control engine.
//!
//! Unigate is the authorization core of a university information-management
//! platform. This crate defines the [`policy::Policy`] record, the
//! [`context::EvaluationContext`] a request is judged against, and the
//! [`policy::PolicyStore`] / [`policy::PolicyEvaluator`] seams that the
//! storage and evaluation crates plug into. The web layer that renders 403
//! pages, and the admin surface that edits policies, live outside this
//! workspace and only ever see [`policy::Decision`] values.

pub mod context;
pub mod errors;
pub mod policy;
pub mod types;

pub use errors::PolicyError;
