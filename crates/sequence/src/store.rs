use async_trait::async_trait;

use crate::{CounterScope, Result, SequenceError};

/// Core trait for sequence counter stores.
///
/// A counter only ever increases. Implementations must perform the increment
/// and the read of the resulting value as one atomic operation against the
/// backing store, so that no two callers observe the same value for a scope.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SequenceCounter: Send + Sync {
    /// Atomically increments the counter for `scope` and returns the
    /// post-increment value.
    ///
    /// Fails with `CounterNotFound` if the counter has not been provisioned.
    async fn increment(&self, scope: &CounterScope) -> Result<u64>;

    /// Returns the current value of a counter without changing it.
    ///
    /// Returns None if the counter has not been provisioned. The value is
    /// informational only and must never be used to derive the next value.
    async fn current(&self, scope: &CounterScope) -> Result<Option<u64>>;

    /// Creates the counter for `scope` starting at `initial` if it does not
    /// exist yet.
    ///
    /// Returns true if the counter was created. An existing counter is left
    /// untouched.
    async fn provision(&self, scope: &CounterScope, initial: u64) -> Result<bool>;
}

/// Extension trait providing the typed allocations used by the services.
#[async_trait]
pub trait SequenceCounterExt: SequenceCounter {
    /// Allocates the next global order number.
    async fn next_order_number(&self) -> Result<u64> {
        self.increment(&CounterScope::Orders).await
    }

    /// Allocates the next product code within a category.
    ///
    /// Product codes are limited to `u8`; a counter beyond that range fails
    /// with `Exhausted` instead of wrapping.
    async fn next_product_code(&self, category: &str) -> Result<u8> {
        let scope = CounterScope::product_category(category);
        let value = self.increment(&scope).await?;
        u8::try_from(value).map_err(|_| SequenceError::Exhausted {
            scope,
            value,
            max: u64::from(u8::MAX),
        })
    }
}

// Blanket implementation for all SequenceCounter implementations
impl<T: SequenceCounter + ?Sized> SequenceCounterExt for T {}
