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

//! The decision combinator: matching policies in, one allow/deny out.

use crate::eval::evaluate;
use crate::expr::Expression;
use std::sync::Arc;
use unigate_core::context::EvaluationContext;
use unigate_core::policy::{Decision, Policy, PolicyEvaluator, PolicyStore};
use unigate_core::PolicyError;

/// Evaluates access requests against the policies in a [`PolicyStore`].
///
/// Stateless per call: the engine holds nothing but the store handle, so
/// concurrent decisions need no coordination. Combining follows
/// deny-overrides with a fail-closed default:
///
/// 1. No policy matches the `(subject, action, resource)` triple → deny.
/// 2. A policy "applies" iff its condition is absent or evaluates true;
///    a malformed condition means the policy does not apply (and is logged).
/// 3. Any applying deny policy defeats every allow policy.
/// 4. Otherwise one applying allow policy suffices.
/// 5. Policies matched but none applied → deny.
///
/// Only store unavailability surfaces as an error; callers must treat that
/// as a deny as well.
#[derive(Debug, Clone)]
pub struct PolicyEngine<S> {
    store: Arc<S>,
}

impl<S: PolicyStore> PolicyEngine<S> {
    /// Creates an engine over the given policy store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Decides whether `subject_role` may perform `action` on `resource`
    /// under `context`. See the type docs for the combining algorithm.
    pub async fn decide(
        &self,
        subject_role: &str,
        action: &str,
        resource: &str,
        context: &EvaluationContext,
    ) -> Result<Decision, PolicyError> {
        let matching = self
            .store
            .find_matching(subject_role, action, resource)
            .await?;

        if matching.is_empty() {
            tracing::debug!(
                subject = subject_role,
                action,
                resource,
                "no policy matches; denying"
            );
            return Ok(Decision::deny(format!(
                "no policy matches {subject_role}/{action}/{resource}"
            )));
        }

        let mut granting: Option<&Policy> = None;
        for policy in &matching {
            if !policy_applies(policy, context) {
                continue;
            }
            if !policy.allow {
                // Deny-overrides: no number of allow policies can win now.
                tracing::debug!(policy_id = policy.id, "explicit deny applied");
                return Ok(Decision::deny(format!("denied by policy {}", policy.id)));
            }
            granting.get_or_insert(policy);
        }

        match granting {
            Some(policy) => Ok(Decision::allow(format!("allowed by policy {}", policy.id))),
            None => Ok(Decision::deny(format!(
                "policies match {subject_role}/{action}/{resource} but no condition applied"
            ))),
        }
    }
}

/// Whether a policy's condition gate is open for this request.
///
/// A malformed condition fails closed: the policy is treated as not
/// applicable and the record is reported for repair, never silently granted.
fn policy_applies(policy: &Policy, context: &EvaluationContext) -> bool {
    let Some(stored) = &policy.conditions else {
        return true;
    };
    match Expression::from_stored(stored) {
        Ok(expression) => evaluate(&expression, context),
        Err(error) => {
            tracing::warn!(
                policy_id = policy.id,
                error = %error,
                "malformed policy condition; treating policy as not applicable"
            );
            false
        }
    }
}

#[async_trait::async_trait]
impl<S: PolicyStore> PolicyEvaluator for PolicyEngine<S> {
    async fn decide(
        &self,
        subject_role: &str,
        action: &str,
        resource: &str,
        context: &EvaluationContext,
    ) -> Result<Decision, PolicyError> {
        PolicyEngine::decide(self, subject_role, action, resource, context).await
    }
}
