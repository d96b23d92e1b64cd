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

//! Defines the core Policy structures, decisions, and the store/evaluator
//! traits for Unigate.
//!
//! A [`Policy`] binds a `(subject role, action, resource)` triple to an
//! optional JSON condition expression and an allow/deny effect. The
//! evaluation crate interprets conditions; the storage crate persists the
//! records. Both plug in through the [`PolicyStore`] and [`PolicyEvaluator`]
//! traits defined here.

use crate::context::EvaluationContext;
use crate::errors::PolicyError;
use crate::types::{PolicyId, ANY_SUBJECT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_allow() -> bool {
    true
}

/// A persisted access-control rule.
///
/// Multiple policies may share the same `(subject, action, resource)`
/// triple; every match participates in the combining algorithm, so a
/// conditional allow and a blanket deny for the same triple coexist
/// meaningfully.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Policy {
    /// Unique identifier, assigned by the store on creation. Immutable.
    pub id: PolicyId,
    /// Role name this policy applies to (e.g. "teacher", "student"), or
    /// [`ANY_SUBJECT`] for every role.
    pub subject: String,
    /// Operation name the policy governs (e.g. "mark_attendance").
    pub action: String,
    /// Object/domain the action targets (e.g. "attendance").
    pub resource: String,
    /// Optional condition expression. `None` means the policy matches
    /// unconditionally for its triple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    /// Whether a match grants (`true`) or denies (`false`) access.
    #[serde(default = "default_allow")]
    pub allow: bool,
    /// Human-readable rationale. Has no effect on evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Policy {
    /// Whether this policy's triple matches the requested one.
    ///
    /// Subject matches on equality or the [`ANY_SUBJECT`] wildcard; action
    /// and resource match by exact, case-sensitive string equality. No
    /// partial or prefix matching.
    pub fn matches(&self, subject_role: &str, action: &str, resource: &str) -> bool {
        (self.subject == subject_role || self.subject == ANY_SUBJECT)
            && self.action == action
            && self.resource == resource
    }
}

/// A policy that has not been persisted yet: [`Policy`] minus the id.
///
/// This is what the seeding routine (and, outside this core, the admin
/// surface) hands to [`PolicyStore::insert_if_absent`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyDraft {
    /// Role name, or [`ANY_SUBJECT`].
    pub subject: String,
    /// Operation name.
    pub action: String,
    /// Target object/domain.
    pub resource: String,
    /// Optional condition expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    /// Grant or deny on match. Defaults to grant.
    #[serde(default = "default_allow")]
    pub allow: bool,
    /// Human-readable rationale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PolicyDraft {
    /// An unconditional allow draft for the given triple.
    pub fn allow(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            action: action.into(),
            resource: resource.into(),
            conditions: None,
            allow: true,
            description: None,
        }
    }

    /// An unconditional deny draft for the given triple.
    pub fn deny(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            allow: false,
            ..Self::allow(subject, action, resource)
        }
    }

    /// Attaches a condition expression.
    pub fn with_conditions(mut self, conditions: Value) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Attaches a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether `existing` carries the same natural key as this draft.
    ///
    /// The natural key is `(subject, action, resource, conditions)`; it is
    /// what makes repeated seeding idempotent. Effect and description are
    /// deliberately not part of identity.
    pub fn same_natural_key(&self, existing: &Policy) -> bool {
        self.subject == existing.subject
            && self.action == existing.action
            && self.resource == existing.resource
            && self.conditions == existing.conditions
    }

    /// Promotes the draft into a persisted [`Policy`] with the given id.
    pub fn into_policy(self, id: PolicyId) -> Policy {
        Policy {
            id,
            subject: self.subject,
            action: self.action,
            resource: self.resource,
            conditions: self.conditions,
            allow: self.allow,
            description: self.description,
        }
    }
}

/// The outcome of an access check.
///
/// Callers are expected to refuse the request (e.g. render an HTTP 403)
/// whenever `allowed` is false. The engine performs no side effect of its
/// own; `reason` exists for audit logging and operator diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// Whether the request is permitted.
    pub allowed: bool,
    /// Diagnostic detail: which policy decided, or why nothing applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Decision {
    /// An allow decision with a diagnostic reason.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: Some(reason.into()),
        }
    }

    /// A deny decision with a diagnostic reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Trait for managing the storage and retrieval of policies.
///
/// Implementations handle persistence of [`Policy`] records — in memory,
/// in Postgres, or wherever else — and are read-only as far as evaluation
/// is concerned. All sequences are returned in stable insertion order
/// (ascending id), so combining decisions is deterministic.
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Retrieves all policies in stable insertion order.
    ///
    /// # Returns
    /// * `Ok(Vec<Policy>)` containing every stored policy.
    /// * `Err(PolicyError::StoreUnavailable)` if the store cannot be read.
    async fn load_policies(&self) -> Result<Vec<Policy>, PolicyError>;

    /// Retrieves every policy whose triple matches the request, per
    /// [`Policy::matches`], in stable insertion order.
    async fn find_matching(
        &self,
        subject_role: &str,
        action: &str,
        resource: &str,
    ) -> Result<Vec<Policy>, PolicyError>;

    /// Retrieves a specific policy by id.
    async fn get_policy(&self, id: PolicyId) -> Result<Option<Policy>, PolicyError>;

    /// Inserts a policy unless one with the same natural key
    /// (`subject`, `action`, `resource`, `conditions`) already exists.
    ///
    /// # Returns
    /// * `Ok(Some(id))` if the draft was inserted.
    /// * `Ok(None)` if an identically-keyed policy was already present.
    /// * `Err(PolicyError::StoreUnavailable)` if the store cannot be written.
    async fn insert_if_absent(&self, draft: &PolicyDraft) -> Result<Option<PolicyId>, PolicyError>;

    /// Deletes a policy by id.
    ///
    /// # Returns
    /// * `Ok(true)` if the policy was found and deleted.
    /// * `Ok(false)` if no policy with the given id exists.
    async fn delete_policy(&self, id: PolicyId) -> Result<bool, PolicyError>;
}

/// Trait for components that can decide access requests.
///
/// Policy Enforcement Points (the route/middleware layer of the university
/// platform) hold an implementation of this trait and call [`decide`]
/// per incoming request.
///
/// [`decide`]: PolicyEvaluator::decide
#[async_trait::async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Decides whether `subject_role` may perform `action` on `resource`
    /// under the given context.
    ///
    /// # Returns
    /// * `Ok(Decision)` — always a definite allow or deny; condition
    ///   evaluation failures degrade to the affected policy not applying.
    /// * `Err(PolicyError::StoreUnavailable)` — the policy set could not be
    ///   read. Callers must treat this as a deny.
    async fn decide(
        &self,
        subject_role: &str,
        action: &str,
        resource: &str,
        context: &EvaluationContext,
    ) -> Result<Decision, PolicyError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_serialization_deserialization_basic() {
        let policy = Policy {
            id: 1,
            subject: "teacher".to_string(),
            action: "upload_result".to_string(),
            resource: "result".to_string(),
            conditions: None,
            allow: true,
            description: Some("Any teacher may upload result sheets".to_string()),
        };

        let serialized = serde_json::to_string_pretty(&policy).expect("Failed to serialize Policy");
        let deserialized: Policy =
            serde_json::from_str(&serialized).expect("Failed to deserialize Policy");

        assert_eq!(policy, deserialized);
    }

    #[test]
    fn test_policy_serialization_deserialization_with_conditions() {
        let conditions_json = json!({
            "field": "user.id",
            "op": "eq",
            "value": "$context.body.takenBy"
        });

        let policy = Policy {
            id: 2,
            subject: "teacher".to_string(),
            action: "mark_attendance".to_string(),
            resource: "attendance".to_string(),
            conditions: Some(conditions_json.clone()),
            allow: true,
            description: None,
        };

        let serialized = serde_json::to_string_pretty(&policy).expect("Failed to serialize Policy");
        let deserialized: Policy =
            serde_json::from_str(&serialized).expect("Failed to deserialize Policy");

        assert_eq!(policy, deserialized);
        assert_eq!(deserialized.conditions, Some(conditions_json));
    }

    #[test]
    fn test_policy_allow_defaults_to_true() {
        // `allow` and `conditions` absent in the stored JSON record
        let raw = r#"{
            "id": 3,
            "subject": "teacher",
            "action": "view_attendance",
            "resource": "attendance"
        }"#;

        let deserialized: Policy =
            serde_json::from_str(raw).expect("Failed to deserialize Policy without allow");
        assert!(deserialized.allow);
        assert!(deserialized.conditions.is_none());
        assert!(deserialized.description.is_none());

        // None-valued optionals are omitted when writing back
        let reserialized = serde_json::to_string(&deserialized).unwrap();
        assert!(!reserialized.contains("conditions"));
        assert!(!reserialized.contains("description"));
    }

    #[test]
    fn test_policy_triple_matching() {
        let policy = Policy {
            id: 4,
            subject: "teacher".to_string(),
            action: "mark_attendance".to_string(),
            resource: "attendance".to_string(),
            conditions: None,
            allow: true,
            description: None,
        };

        assert!(policy.matches("teacher", "mark_attendance", "attendance"));
        assert!(!policy.matches("student", "mark_attendance", "attendance"));
        assert!(!policy.matches("teacher", "view_attendance", "attendance"));
        assert!(!policy.matches("teacher", "mark_attendance", "result"));
        // Case-sensitive, no prefix matching
        assert!(!policy.matches("Teacher", "mark_attendance", "attendance"));
        assert!(!policy.matches("teacher", "mark_attendance", "attendance_sheet"));
    }

    #[test]
    fn test_wildcard_subject_matches_any_role() {
        let policy = Policy {
            id: 5,
            subject: ANY_SUBJECT.to_string(),
            action: "view_notice".to_string(),
            resource: "notice".to_string(),
            conditions: None,
            allow: true,
            description: None,
        };

        assert!(policy.matches("teacher", "view_notice", "notice"));
        assert!(policy.matches("student", "view_notice", "notice"));
        // Wildcard only applies to the subject position
        assert!(!policy.matches("student", "create_notice", "notice"));
    }

    #[test]
    fn test_draft_natural_key_ignores_effect_and_description() {
        let draft = PolicyDraft::allow("teacher", "mark_attendance", "attendance")
            .with_conditions(json!({"field": "user.id", "op": "eq", "value": "$context.body.takenBy"}));

        let mut stored = draft.clone().into_policy(9);
        stored.allow = false;
        stored.description = Some("flipped by an administrator".to_string());
        assert!(draft.same_natural_key(&stored));

        let mut other_conditions = stored.clone();
        other_conditions.conditions = Some(json!({"field": "user.id", "op": "neq", "value": 0}));
        assert!(!draft.same_natural_key(&other_conditions));

        let unconditional = PolicyDraft::allow("teacher", "mark_attendance", "attendance");
        assert!(!unconditional.same_natural_key(&stored));
    }

    #[test]
    fn test_decision_serialization() {
        let decision = Decision::deny("no policy matches student/create_notice/notice");
        let serialized = serde_json::to_string(&decision).unwrap();
        let deserialized: Decision = serde_json::from_str(&serialized).unwrap();
        assert_eq!(decision, deserialized);
        assert!(!deserialized.allowed);

        let bare: Decision = serde_json::from_str(r#"{"allowed": true}"#).unwrap();
        assert!(bare.allowed);
        assert!(bare.reason.is_none());
    }
}
