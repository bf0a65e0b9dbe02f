//! Customer lookup over HTTP and an in-memory directory for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{Customer, CustomerId};
use reqwest::StatusCode;
use tokio::sync::RwLock;

use super::CustomerLookup;
use super::remote::RemoteService;
use crate::error::ClientError;

/// Customer lookup against `GET /customers/{id}` of the customer service.
#[derive(Clone)]
pub struct HttpCustomerClient {
    remote: RemoteService,
}

impl HttpCustomerClient {
    /// Creates a client for the given remote service.
    pub fn new(remote: RemoteService) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl CustomerLookup for HttpCustomerClient {
    #[tracing::instrument(skip(self))]
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, ClientError> {
        let base_url = self.remote.base_url().await?;
        let url = format!("{base_url}/customers/{id}");

        let response = self
            .remote
            .http()
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "error fetching customer");
                self.remote.call_error(e)
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                self.remote.record("not_found");
                tracing::debug!(%id, "customer not found");
                Ok(None)
            }
            status if status.is_success() => {
                let customer = response
                    .json::<Customer>()
                    .await
                    .map_err(|e| self.remote.call_error(e))?;
                self.remote.record("ok");
                Ok(Some(customer))
            }
            status => Err(self.remote.call_error(format!("{url} answered {status}"))),
        }
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    customers: HashMap<CustomerId, Customer>,
    failure: Option<String>,
    unavailable: bool,
}

/// In-memory customer directory for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    state: Arc<RwLock<DirectoryState>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryCustomerDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a customer.
    pub async fn insert(&self, customer: Customer) {
        self.state
            .write()
            .await
            .customers
            .insert(customer.id, customer);
    }

    /// Makes lookups fail as a 5xx from the remote service would.
    pub async fn set_failure(&self, message: Option<&str>) {
        self.state.write().await.failure = message.map(str::to_string);
    }

    /// Makes lookups fail as if discovery found no instance.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns how many lookups reached the directory.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CustomerLookup for InMemoryCustomerDirectory {
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, ClientError> {
        let state = self.state.read().await;

        if state.unavailable {
            return Err(ClientError::ServiceUnavailable(
                super::CUSTOMER_SERVICE.to_string(),
            ));
        }

        self.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(ref message) = state.failure {
            return Err(ClientError::ServiceCall {
                service: super::CUSTOMER_SERVICE.to_string(),
                message: message.clone(),
            });
        }

        Ok(state.customers.get(&id).cloned())
    }
}
