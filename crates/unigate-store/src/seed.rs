//! The fixed default policy set and the idempotent bootstrap routine.

use once_cell::sync::Lazy;
use serde_json::json;
use unigate_core::policy::{PolicyDraft, PolicyStore};
use unigate_core::types::ANY_SUBJECT;

/// The default policies installed at system bootstrap.
///
/// Identity is the natural key `(subject, action, resource, conditions)`,
/// so re-running the seed against a store that already holds these entries
/// inserts nothing.
pub static DEFAULT_POLICIES: Lazy<Vec<PolicyDraft>> = Lazy::new(|| {
    vec![
        PolicyDraft::allow("teacher", "mark_attendance", "attendance")
            .with_conditions(json!({
                "field": "user.id", "op": "eq", "value": "$context.body.takenBy"
            }))
            .with_description("Teachers may only file attendance sheets they took themselves"),
        PolicyDraft::deny("student", "mark_attendance", "attendance")
            .with_description("Students can never file attendance"),
        PolicyDraft::allow("teacher", "upload_result", "result")
            .with_description("Any teacher may upload result sheets"),
        PolicyDraft::allow("teacher", "view_attendance", "attendance")
            .with_conditions(json!({
                "field": "user.department", "op": "eq", "value": "$context.params.department"
            }))
            .with_description("Teachers see attendance for their own department"),
        PolicyDraft::allow("student", "view_result", "result")
            .with_conditions(json!({
                "field": "user.id", "op": "eq", "value": "$context.params.studentId"
            }))
            .with_description("Students may only view their own results"),
        PolicyDraft::allow("hod", "view_attendance", "attendance")
            .with_conditions(json!({
                "field": "user.department", "op": "in",
                "value": ["CSE", "EEE", "BBA", "LAW"]
            }))
            .with_description("Heads of recognized departments see departmental attendance"),
        PolicyDraft::allow("accounts", "approve_payment", "finance")
            .with_conditions(json!({"allOf": [
                {"field": "user.department", "op": "eq", "value": "accounts"},
                {"field": "context.body.amount", "op": "lte", "value": 500000}
            ]}))
            .with_description("Accounts officers approve payments up to the departmental cap"),
        PolicyDraft::allow("admin", "create_notice", "notice")
            .with_description("Administrators publish notices"),
        PolicyDraft::allow(ANY_SUBJECT, "view_notice", "notice")
            .with_description("Notices are visible to every signed-in role"),
    ]
});

/// Outcome of a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Entries newly inserted by this run.
    pub inserted: usize,
    /// Entries skipped because their natural key already existed.
    pub existing: usize,
    /// Entries whose insertion failed; failures are logged and do not stop
    /// the remaining entries.
    pub failed: usize,
}

/// Inserts each draft independently, continuing past failures.
///
/// A failed insertion is logged via `tracing::error!` and counted; it never
/// aborts the rest of the list, so one bad entry cannot block bootstrap.
pub async fn seed_policies<S>(store: &S, drafts: &[PolicyDraft]) -> SeedSummary
where
    S: PolicyStore + ?Sized,
{
    let mut summary = SeedSummary::default();
    for draft in drafts {
        match store.insert_if_absent(draft).await {
            Ok(Some(id)) => {
                tracing::debug!(
                    policy_id = id,
                    subject = %draft.subject,
                    action = %draft.action,
                    resource = %draft.resource,
                    "seeded policy"
                );
                summary.inserted += 1;
            }
            Ok(None) => summary.existing += 1,
            Err(error) => {
                tracing::error!(
                    subject = %draft.subject,
                    action = %draft.action,
                    resource = %draft.resource,
                    error = %error,
                    "failed to seed policy; continuing with the rest"
                );
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Seeds [`DEFAULT_POLICIES`] into the store.
pub async fn seed_default_policies<S>(store: &S) -> SeedSummary
where
    S: PolicyStore + ?Sized,
{
    seed_policies(store, &DEFAULT_POLICIES).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPolicyStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use unigate_core::errors::PolicyError;
    use unigate_core::policy::Policy;
    use unigate_core::types::PolicyId;

    #[tokio::test]
    async fn test_seeding_twice_is_idempotent() {
        let store = InMemoryPolicyStore::new();

        let first = seed_default_policies(&store).await;
        assert_eq!(first.inserted, DEFAULT_POLICIES.len());
        assert_eq!(first.existing, 0);
        assert_eq!(first.failed, 0);

        let second = seed_default_policies(&store).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.existing, DEFAULT_POLICIES.len());
        assert_eq!(second.failed, 0);

        // exactly one record per seeded natural key
        assert_eq!(
            store.load_policies().await.unwrap().len(),
            DEFAULT_POLICIES.len()
        );
    }

    #[tokio::test]
    async fn test_seeded_policies_keep_insertion_order() {
        let store = InMemoryPolicyStore::new();
        seed_default_policies(&store).await;

        let stored = store.load_policies().await.unwrap();
        for (draft, policy) in DEFAULT_POLICIES.iter().zip(&stored) {
            assert!(draft.same_natural_key(policy));
            assert_eq!(draft.allow, policy.allow);
        }
    }

    /// A store whose writes fail every other call, for exercising the
    /// first-failure-continues contract.
    #[derive(Default)]
    struct FlakyStore {
        delegate: InMemoryPolicyStore,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl PolicyStore for FlakyStore {
        async fn load_policies(&self) -> Result<Vec<Policy>, PolicyError> {
            self.delegate.load_policies().await
        }

        async fn find_matching(
            &self,
            subject_role: &str,
            action: &str,
            resource: &str,
        ) -> Result<Vec<Policy>, PolicyError> {
            self.delegate
                .find_matching(subject_role, action, resource)
                .await
        }

        async fn get_policy(&self, id: PolicyId) -> Result<Option<Policy>, PolicyError> {
            self.delegate.get_policy(id).await
        }

        async fn insert_if_absent(
            &self,
            draft: &PolicyDraft,
        ) -> Result<Option<PolicyId>, PolicyError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
                return Err(PolicyError::StoreUnavailable(
                    "injected write failure".to_string(),
                ));
            }
            self.delegate.insert_if_absent(draft).await
        }

        async fn delete_policy(&self, id: PolicyId) -> Result<bool, PolicyError> {
            self.delegate.delete_policy(id).await
        }
    }

    #[tokio::test]
    async fn test_single_failures_do_not_abort_the_run() {
        let store = FlakyStore::default();
        let summary = seed_default_policies(&store).await;

        // every entry was attempted despite the interleaved failures
        assert_eq!(
            store.attempts.load(Ordering::SeqCst),
            DEFAULT_POLICIES.len()
        );
        assert_eq!(summary.failed, DEFAULT_POLICIES.len() / 2);
        assert_eq!(summary.inserted + summary.failed, DEFAULT_POLICIES.len());

        // a retry picks up exactly the entries that failed
        let retry = seed_default_policies(&store).await;
        assert_eq!(retry.inserted + retry.existing + retry.failed, DEFAULT_POLICIES.len());
        assert!(retry.inserted > 0);
    }
}
