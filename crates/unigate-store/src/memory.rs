//! An in-memory implementation of the `PolicyStore` trait.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use unigate_core::errors::PolicyError;
use unigate_core::policy::{Policy, PolicyDraft, PolicyStore};
use unigate_core::types::PolicyId;

#[derive(Debug, Default)]
struct Inner {
    policies: Vec<Policy>,
    next_id: PolicyId,
}

/// An in-memory `PolicyStore`.
///
/// Policies live in a thread-safe `Vec` in insertion order, which is also
/// the stable order every read returns. Ids are assigned monotonically and
/// never reused, so a deleted policy's id stays dead.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicyStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryPolicyStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, operation: &str) -> Result<std::sync::MutexGuard<'_, Inner>, PolicyError> {
        self.inner.lock().map_err(|e| {
            PolicyError::InternalError(format!("Failed to acquire lock for {}: {}", operation, e))
        })
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn load_policies(&self) -> Result<Vec<Policy>, PolicyError> {
        let inner = self.lock("load_policies")?;
        Ok(inner.policies.clone())
    }

    async fn find_matching(
        &self,
        subject_role: &str,
        action: &str,
        resource: &str,
    ) -> Result<Vec<Policy>, PolicyError> {
        let inner = self.lock("find_matching")?;
        Ok(inner
            .policies
            .iter()
            .filter(|policy| policy.matches(subject_role, action, resource))
            .cloned()
            .collect())
    }

    async fn get_policy(&self, id: PolicyId) -> Result<Option<Policy>, PolicyError> {
        let inner = self.lock("get_policy")?;
        Ok(inner.policies.iter().find(|policy| policy.id == id).cloned())
    }

    async fn insert_if_absent(&self, draft: &PolicyDraft) -> Result<Option<PolicyId>, PolicyError> {
        let mut inner = self.lock("insert_if_absent")?;
        if inner
            .policies
            .iter()
            .any(|existing| draft.same_natural_key(existing))
        {
            return Ok(None);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.policies.push(draft.clone().into_policy(id));
        Ok(Some(id))
    }

    async fn delete_policy(&self, id: PolicyId) -> Result<bool, PolicyError> {
        let mut inner = self.lock("delete_policy")?;
        let before = inner.policies.len();
        inner.policies.retain(|policy| policy.id != id);
        Ok(inner.policies.len() < before)
    }
}
