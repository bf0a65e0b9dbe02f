use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Customer, CustomerId, Pagination};
use tokio::sync::RwLock;

use super::CustomerStore;
use crate::error::StoreError;
use crate::model::{CustomerUpdate, NewCustomer};

#[derive(Debug, Default)]
struct Registry {
    customers: BTreeMap<CustomerId, Customer>,
    last_id: i64,
}

impl Registry {
    fn email_taken(&self, email: &str, except: Option<CustomerId>) -> bool {
        self.customers
            .values()
            .any(|c| c.email == email && Some(c.id) != except)
    }
}

/// In-memory customer store for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerStore {
    registry: Arc<RwLock<Registry>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn list(&self, page: Pagination) -> Result<Vec<Customer>, StoreError> {
        let registry = self.registry.read().await;
        Ok(page.apply(registry.customers.values()).cloned().collect())
    }

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.registry.read().await.customers.get(&id).cloned())
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let mut registry = self.registry.write().await;
        if registry.email_taken(&customer.email, None) {
            return Err(StoreError::EmailTaken(customer.email));
        }

        registry.last_id += 1;
        let customer = Customer {
            id: CustomerId::new(registry.last_id),
            name: customer.name,
            email: customer.email,
        };
        registry.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, StoreError> {
        let mut registry = self.registry.write().await;
        if let Some(ref email) = update.email
            && registry.email_taken(email, Some(id))
        {
            return Err(StoreError::EmailTaken(email.clone()));
        }

        let Some(customer) = registry.customers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            customer.name = name;
        }
        if let Some(email) = update.email {
            customer.email = email;
        }
        Ok(Some(customer.clone()))
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError> {
        Ok(self.registry.write().await.customers.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_ids_and_rejects_duplicate_email() {
        let store = InMemoryCustomerStore::new();

        let ada = store
            .create(NewCustomer::new("Ada", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(ada.id, CustomerId::new(1));

        let result = store
            .create(NewCustomer::new("Other Ada", "ada@example.com"))
            .await;
        assert!(matches!(result, Err(StoreError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let store = InMemoryCustomerStore::new();
        let ada = store
            .create(NewCustomer::new("Ada", "ada@example.com"))
            .await
            .unwrap();

        let updated = store
            .update(
                ada.id,
                CustomerUpdate {
                    name: Some("Ada King".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Ada King");
        assert_eq!(updated.email, "ada@example.com");
        assert!(
            store
                .update(CustomerId::new(9), CustomerUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_to_own_email_is_allowed() {
        let store = InMemoryCustomerStore::new();
        let ada = store
            .create(NewCustomer::new("Ada", "ada@example.com"))
            .await
            .unwrap();
        store
            .create(NewCustomer::new("Bob", "bob@example.com"))
            .await
            .unwrap();

        let same = CustomerUpdate {
            name: None,
            email: Some("ada@example.com".to_string()),
        };
        assert!(store.update(ada.id, same).await.is_ok());

        let taken = CustomerUpdate {
            name: None,
            email: Some("bob@example.com".to_string()),
        };
        assert!(matches!(
            store.update(ada.id, taken).await,
            Err(StoreError::EmailTaken(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let store = InMemoryCustomerStore::new();
        for i in 0..3 {
            store
                .create(NewCustomer::new("C", format!("c{i}@example.com")))
                .await
                .unwrap();
        }

        assert!(store.delete(CustomerId::new(2)).await.unwrap());
        assert!(!store.delete(CustomerId::new(2)).await.unwrap());

        let ids: Vec<i64> = store
            .list(Pagination::default())
            .await
            .unwrap()
            .iter()
            .map(|c| c.id.value())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
