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

//! Postgres-based implementation of the `PolicyStore` trait using SQLx and PgPool.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use unigate_core::errors::PolicyError;
use unigate_core::policy::{Policy, PolicyDraft, PolicyStore};
use unigate_core::types::{PolicyId, ANY_SUBJECT};

/// Postgres-backed `PolicyStore`.
///
/// Every sqlx failure is surfaced as [`PolicyError::StoreUnavailable`]; the
/// engine propagates that to its caller, which must deny. Idempotent
/// insertion is delegated to the database (`INSERT ... WHERE NOT EXISTS`
/// over the natural key), so concurrent bootstraps of several app instances
/// need no coordination beyond standard transactional semantics.
#[derive(Clone, Debug)]
pub struct PostgresPolicyStore {
    /// Connection pool to Postgres.
    pool: PgPool,
}

impl PostgresPolicyStore {
    /// Creates a new PostgresPolicyStore with the given PgPool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `policies` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), PolicyError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS policies (
                id          BIGSERIAL PRIMARY KEY,
                subject     TEXT NOT NULL,
                action      TEXT NOT NULL,
                resource    TEXT NOT NULL,
                conditions  JSONB,
                allow       BOOLEAN NOT NULL DEFAULT TRUE,
                description TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PolicyError::StoreUnavailable(format!("DB ensure_schema error: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for PostgresPolicyStore {
    async fn load_policies(&self) -> Result<Vec<Policy>, PolicyError> {
        sqlx::query_as::<_, Policy>(
            r#"
            SELECT id, subject, action, resource, conditions, allow, description
            FROM policies
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PolicyError::StoreUnavailable(format!("DB load_policies error: {}", e)))
    }

    async fn find_matching(
        &self,
        subject_role: &str,
        action: &str,
        resource: &str,
    ) -> Result<Vec<Policy>, PolicyError> {
        sqlx::query_as::<_, Policy>(
            r#"
            SELECT id, subject, action, resource, conditions, allow, description
            FROM policies
            WHERE (subject = $1 OR subject = $2) AND action = $3 AND resource = $4
            ORDER BY id
            "#,
        )
        .bind(subject_role)
        .bind(ANY_SUBJECT)
        .bind(action)
        .bind(resource)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PolicyError::StoreUnavailable(format!("DB find_matching error: {}", e)))
    }

    async fn get_policy(&self, id: PolicyId) -> Result<Option<Policy>, PolicyError> {
        sqlx::query_as::<_, Policy>(
            r#"
            SELECT id, subject, action, resource, conditions, allow, description
            FROM policies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PolicyError::StoreUnavailable(format!("DB get_policy error: {}", e)))
    }

    async fn insert_if_absent(&self, draft: &PolicyDraft) -> Result<Option<PolicyId>, PolicyError> {
        // IS NOT DISTINCT FROM makes NULL conditions compare equal to NULL,
        // so unconditional policies participate in the natural key too.
        let row = sqlx::query(
            r#"
            INSERT INTO policies (subject, action, resource, conditions, allow, description)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM policies
                WHERE subject = $1
                  AND action = $2
                  AND resource = $3
                  AND conditions IS NOT DISTINCT FROM $4
            )
            RETURNING id
            "#,
        )
        .bind(&draft.subject)
        .bind(&draft.action)
        .bind(&draft.resource)
        .bind(&draft.conditions)
        .bind(draft.allow)
        .bind(&draft.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PolicyError::StoreUnavailable(format!("DB insert_if_absent error: {}", e)))?;

        match row {
            Some(row) => {
                let id: PolicyId = row.try_get("id").map_err(|e| {
                    PolicyError::StoreUnavailable(format!("DB row get error: {}", e))
                })?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    async fn delete_policy(&self, id: PolicyId) -> Result<bool, PolicyError> {
        let result = sqlx::query("DELETE FROM policies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PolicyError::StoreUnavailable(format!("DB delete_policy error: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }
}
