//! Order persistence port.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{ClientId, CraftsmanId, MerchantId, OrderId};
use thiserror::Error;
use tokio::sync::RwLock;

use super::{Order, OrderStatus};

/// Errors returned by an order repository.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The storage backend failed.
    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Builder for order listing filters.
///
/// Unset fields match every order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Filter by merchant.
    pub merchant_id: Option<MerchantId>,

    /// Filter by client.
    pub client_id: Option<ClientId>,

    /// Filter by status.
    pub status: Option<OrderStatus>,

    /// Filter by assigned craftsman.
    pub craftsman_id: Option<CraftsmanId>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderFilter {
    /// Creates a filter matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter for one merchant's orders.
    pub fn for_merchant(merchant_id: MerchantId) -> Self {
        Self {
            merchant_id: Some(merchant_id),
            ..Default::default()
        }
    }

    pub fn client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn craftsman(mut self, craftsman_id: CraftsmanId) -> Self {
        self.craftsman_id = Some(craftsman_id);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the order satisfies every set criterion.
    pub fn matches(&self, order: &Order) -> bool {
        self.merchant_id.is_none_or(|id| order.merchant_id == id)
            && self.client_id.is_none_or(|id| order.client_id == id)
            && self.status.is_none_or(|status| order.status == status)
            && self
                .craftsman_id
                .is_none_or(|id| order.craftsmen_ids.contains(&id))
    }
}

/// Storage for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Lists orders matching the filter, ordered by number.
    async fn get_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Inserts a new order and returns it with its id assigned.
    async fn create_order(&self, order: Order) -> Result<Order, RepositoryError>;

    /// Replaces a stored order.
    async fn update_order_by_id(
        &self,
        id: OrderId,
        order: Order,
    ) -> Result<Order, RepositoryError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: HashMap<OrderId, Order>,
    delay: Option<Duration>,
}

/// In-memory order repository for tests and local wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<InMemoryOrderState>>,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with a backend error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delays every call by `delay`.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().await.delay = delay;
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn enter(&self) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.state.read().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend("storage offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        self.enter().await?;
        let state = self.state.read().await;

        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.number);

        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.enter().await?;
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn create_order(&self, mut order: Order) -> Result<Order, RepositoryError> {
        self.enter().await?;
        let mut state = self.state.write().await;

        let same_merchant = state
            .orders
            .values()
            .filter(|stored| stored.merchant_id == order.merchant_id);
        for stored in same_merchant {
            if stored.number == order.number {
                return Err(RepositoryError::Conflict(format!(
                    "order number {} already exists",
                    order.number
                )));
            }
            if stored.reference == order.reference {
                return Err(RepositoryError::Conflict(format!(
                    "order reference {} already exists",
                    order.reference
                )));
            }
        }

        let id = OrderId::new();
        order.id = Some(id);
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn update_order_by_id(
        &self,
        id: OrderId,
        mut order: Order,
    ) -> Result<Order, RepositoryError> {
        self.enter().await?;
        let mut state = self.state.write().await;

        let stored = state
            .orders
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        order.id = Some(id);
        *stored = order.clone();
        Ok(order)
    }
}
