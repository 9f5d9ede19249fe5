//! Identifier counters
//!
//! One row per scope (`job_card`, `employee:M`, ...) holds the last number
//! handed out. Reserving locks that row, so concurrent callers in the same
//! scope are serialized by the database and never see the same value.

use async_trait::async_trait;
use sc_models::{parse_suffix, IdScope};
use sqlx::{PgPool, Postgres, Transaction};

use crate::repository::{decode, RepositoryError, RepositoryResult};

#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Reserve the next number in `scope`
    ///
    /// Returns `None`, leaving the counter untouched, once the category cap
    /// would be exceeded.
    async fn reserve(&self, scope: &IdScope) -> RepositoryResult<Option<u64>>;
}

/// Highest suffix among existing identifiers of the scope
pub fn highest_existing<'a>(scope: &IdScope, ids: impl IntoIterator<Item = &'a str>) -> u64 {
    ids.into_iter()
        .filter(|id| scope.owns(id))
        .map(parse_suffix)
        .max()
        .unwrap_or(0)
}

pub struct PgSequenceStore {
    pool: PgPool,
}

impl PgSequenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn locked_value(
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
    ) -> RepositoryResult<Option<i64>> {
        let value = sqlx::query_scalar::<_, i64>(
            "SELECT last_value FROM id_counters WHERE scope = $1 FOR UPDATE",
        )
        .bind(key)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(value)
    }

    /// First use of a scope starts from whatever the entity table already holds
    async fn seed(tx: &mut Transaction<'_, Postgres>, scope: &IdScope) -> RepositoryResult<u64> {
        let (table, column) = scope.id_category().storage();
        let sql = format!("SELECT {column} FROM {table} WHERE {column} LIKE $1");
        let ids = sqlx::query_scalar::<_, String>(&sql)
            .bind(scope.like_pattern())
            .fetch_all(&mut **tx)
            .await?;
        Ok(highest_existing(scope, ids.iter().map(String::as_str)))
    }
}

#[async_trait]
impl SequenceStore for PgSequenceStore {
    async fn reserve(&self, scope: &IdScope) -> RepositoryResult<Option<u64>> {
        let key = scope.key();
        let mut tx = self.pool.begin().await?;

        let mut current = Self::locked_value(&mut tx, &key).await?;
        if current.is_none() {
            let seed = decode(i64::try_from(Self::seed(&mut tx, scope).await?))?;
            sqlx::query(
                "INSERT INTO id_counters (scope, last_value) VALUES ($1, $2) ON CONFLICT (scope) DO NOTHING",
            )
            .bind(&key)
            .bind(seed)
            .execute(&mut *tx)
            .await?;
            current = Self::locked_value(&mut tx, &key).await?;
        }

        let last = current
            .ok_or_else(|| RepositoryError::Conflict(format!("counter {key} could not be created")))?;
        let next = decode(u64::try_from(last))?.saturating_add(1);

        if let Some(cap) = scope.id_category().cap() {
            if next > cap {
                tx.rollback().await?;
                tracing::warn!(scope = %key, cap, "identifier space exhausted");
                return Ok(None);
            }
        }

        sqlx::query("UPDATE id_counters SET last_value = $2 WHERE scope = $1")
            .bind(&key)
            .bind(decode(i64::try_from(next))?)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(scope = %key, value = next, "identifier reserved");
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support;
    use sc_models::{IdCategory, Role};

    #[test]
    fn test_highest_existing_ignores_other_scopes() {
        let mechanics = IdScope::employee(Role::Mechanic).unwrap();
        let ids = ["M-004", "M-010", "TL-020", "M-bad", "SA-099"];
        assert_eq!(highest_existing(&mechanics, ids), 10);

        let orders = IdScope::category(IdCategory::Order).unwrap();
        assert_eq!(highest_existing(&orders, Vec::<&str>::new()), 0);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_pg_reserve_under_contention() {
        let Some(db) = test_support::database().await else {
            return;
        };
        let store = Arc::new(PgSequenceStore::new(db.pool().clone()));
        let scope = IdScope::category(IdCategory::Order).unwrap();
        let first = store.reserve(&scope).await.unwrap().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let scope = scope.clone();
                tokio::spawn(async move { store.reserve(&scope).await })
            })
            .collect();

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap().unwrap());
        }
        values.sort_unstable();
        assert_eq!(values, (first + 1..=first + 8).collect::<Vec<_>>());
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_pg_first_use_seeds_from_existing_rows() {
        let Some(db) = test_support::database().await else {
            return;
        };
        let scope = IdScope::employee(Role::TeamLeader).unwrap();

        sqlx::query(
            "INSERT INTO employees (employee_id, name, email, role) \
             VALUES ('TL-900', 'Seeded Leader', 'tl900@example.com', 'Team Leader') \
             ON CONFLICT (employee_id) DO NOTHING",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query("DELETE FROM id_counters WHERE scope = $1")
            .bind(scope.key())
            .execute(db.pool())
            .await
            .unwrap();

        let existing = sqlx::query_scalar::<_, String>(
            "SELECT employee_id FROM employees WHERE employee_id LIKE $1",
        )
        .bind(scope.like_pattern())
        .fetch_all(db.pool())
        .await
        .unwrap();
        let highest = highest_existing(&scope, existing.iter().map(String::as_str));
        assert!(highest >= 900);

        let store = PgSequenceStore::new(db.pool().clone());
        assert_eq!(store.reserve(&scope).await.unwrap(), Some(highest + 1));
        assert_eq!(store.reserve(&scope).await.unwrap(), Some(highest + 2));
    }
}
