//! Sequential identifier allocation

use std::sync::Arc;

use sc_core::ScResult;
use sc_db::SequenceStore;
use sc_models::{IdCategory, IdScope, Identifier, IdentifierError, Role};

/// Hands out the next identifier of a category
///
/// The store reserves numbers atomically per scope; this type only picks
/// the scope and renders the reserved number.
#[derive(Clone)]
pub struct IdentifierAllocator {
    sequences: Arc<dyn SequenceStore>,
}

impl IdentifierAllocator {
    pub fn new(sequences: Arc<dyn SequenceStore>) -> Self {
        Self { sequences }
    }

    /// Next identifier for a category with a fixed prefix
    pub async fn allocate(&self, category: IdCategory) -> ScResult<Identifier> {
        let scope = IdScope::category(category)?;
        self.allocate_in(&scope).await
    }

    /// Next employee identifier; the prefix follows the role
    pub async fn allocate_employee(&self, role: Role) -> ScResult<Identifier> {
        let scope = IdScope::employee(role)?;
        self.allocate_in(&scope).await
    }

    async fn allocate_in(&self, scope: &IdScope) -> ScResult<Identifier> {
        let category = scope.id_category();
        let value = self
            .sequences
            .reserve(scope)
            .await?
            .ok_or(IdentifierError::Exhausted { category })?;

        let identifier = scope.render(value)?;
        tracing::debug!(scope = %scope.key(), id = %identifier, "identifier allocated");
        Ok(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_core::ScError;
    use sc_db::MemoryStore;

    fn allocator() -> (Arc<MemoryStore>, IdentifierAllocator) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), IdentifierAllocator::new(store))
    }

    #[tokio::test]
    async fn test_seeds_for_empty_tables() {
        let (_, ids) = allocator();
        assert_eq!(ids.allocate(IdCategory::Customer).await.unwrap().as_str(), "C-0001");
        assert_eq!(ids.allocate(IdCategory::JobCard).await.unwrap().as_str(), "JC-0001");
        assert_eq!(ids.allocate(IdCategory::Order).await.unwrap().as_str(), "PO-0001");
        assert_eq!(ids.allocate(IdCategory::Supplier).await.unwrap().as_str(), "SUP-0001");
        assert_eq!(ids.allocate(IdCategory::Invoice).await.unwrap().as_str(), "INV-0001");
        assert_eq!(ids.allocate_employee(Role::Mechanic).await.unwrap().as_str(), "M-001");
        assert_eq!(ids.allocate(IdCategory::Customer).await.unwrap().as_str(), "C-0002");
    }

    #[tokio::test]
    async fn test_continues_after_existing_ids() {
        let (store, ids) = allocator();
        store.import_ids(["SUP-0009", "P-9999"]).await;
        assert_eq!(ids.allocate(IdCategory::Supplier).await.unwrap().as_str(), "SUP-0010");
        assert_eq!(ids.allocate(IdCategory::Part).await.unwrap().as_str(), "P-10000");
    }

    #[tokio::test]
    async fn test_driver_cannot_be_numbered() {
        let (_, ids) = allocator();
        let err = ids.allocate_employee(Role::Driver).await.unwrap_err();
        match err {
            ScError::Validation(errors) => assert!(errors.has_error("role")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_job_card_space_is_capped() {
        let (store, ids) = allocator();
        for _ in 0..9999 {
            store
                .reserve(&IdScope::category(IdCategory::JobCard).unwrap())
                .await
                .unwrap();
        }
        let err = ids.allocate(IdCategory::JobCard).await.unwrap_err();
        assert!(matches!(err, ScError::AllocationExhausted { category: "JobCard" }));
    }

    #[tokio::test]
    async fn test_concurrent_allocation_is_unique() {
        let (_, ids) = allocator();
        let tasks = (0..64).map(|_| {
            let ids = ids.clone();
            tokio::spawn(async move { ids.allocate(IdCategory::Order).await })
        });

        let mut allocated: Vec<String> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().into_string())
            .collect();
        allocated.sort();
        allocated.dedup();
        assert_eq!(allocated.len(), 64);
        assert!(allocated.contains(&"PO-0064".to_string()));
    }
}
