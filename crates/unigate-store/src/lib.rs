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

//! Policy store implementations for Unigate.
//!
//! Two backends for the core `PolicyStore` trait: an in-memory store for
//! tests and single-process deployments, and a Postgres store over sqlx for
//! the shared university database. The [`seed`] module carries the fixed
//! default policy set and the idempotent bootstrap routine that installs it.

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::InMemoryPolicyStore;
pub use postgres::PostgresPolicyStore;
pub use seed::{seed_default_policies, seed_policies, SeedSummary, DEFAULT_POLICIES};
