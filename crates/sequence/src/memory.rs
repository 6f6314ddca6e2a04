use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{CounterScope, Result, SequenceCounter, SequenceError};

/// In-memory sequence counter for single-process deployments and tests.
///
/// Every increment happens inside one lock acquisition, so concurrent callers
/// always observe distinct values. The orders counter is provisioned at 0 on
/// construction; category counters must be provisioned explicitly.
#[derive(Clone)]
pub struct InMemorySequenceCounter {
    counters: Arc<Mutex<HashMap<String, u64>>>,
    increments: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl Default for InMemorySequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySequenceCounter {
    /// Creates a store with the orders counter at 0.
    pub fn new() -> Self {
        Self::with_order_number(0)
    }

    /// Creates a store whose orders counter starts at `value`.
    pub fn with_order_number(value: u64) -> Self {
        let mut counters = HashMap::new();
        counters.insert(CounterScope::Orders.key(), value);
        Self {
            counters: Arc::new(Mutex::new(counters)),
            increments: Arc::new(AtomicUsize::new(0)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a store with no counters at all.
    pub fn empty() -> Self {
        Self {
            counters: Arc::new(Mutex::new(HashMap::new())),
            increments: Arc::new(AtomicUsize::new(0)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns how many increment calls reached this store.
    pub fn increment_count(&self) -> usize {
        self.increments.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SequenceError::Unavailable(
                "in-memory counter store disabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SequenceCounter for InMemorySequenceCounter {
    async fn increment(&self, scope: &CounterScope) -> Result<u64> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut counters = self.counters.lock().await;
        let value = counters
            .get_mut(&scope.key())
            .ok_or_else(|| SequenceError::CounterNotFound(scope.clone()))?;
        *value += 1;

        metrics::counter!("sequence_increments_total").increment(1);
        Ok(*value)
    }

    async fn current(&self, scope: &CounterScope) -> Result<Option<u64>> {
        self.check_available()?;
        let counters = self.counters.lock().await;
        Ok(counters.get(&scope.key()).copied())
    }

    async fn provision(&self, scope: &CounterScope, initial: u64) -> Result<bool> {
        self.check_available()?;
        let mut counters = self.counters.lock().await;
        let key = scope.key();
        if counters.contains_key(&key) {
            return Ok(false);
        }
        counters.insert(key, initial);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequenceCounterExt;

    #[tokio::test]
    async fn order_numbers_start_after_seed() {
        let store = InMemorySequenceCounter::with_order_number(41);

        assert_eq!(store.next_order_number().await.unwrap(), 42);
        assert_eq!(store.next_order_number().await.unwrap(), 43);
        assert_eq!(
            store.current(&CounterScope::Orders).await.unwrap(),
            Some(43)
        );
    }

    #[tokio::test]
    async fn product_code_requires_provisioned_counter() {
        let store = InMemorySequenceCounter::new();

        let result = store.next_product_code("BRC").await;
        assert!(matches!(result, Err(SequenceError::CounterNotFound(_))));

        store
            .provision(&CounterScope::product_category("BRC"), 0)
            .await
            .unwrap();
        assert_eq!(store.next_product_code("brc").await.unwrap(), 1);
        assert_eq!(store.next_product_code("BRC").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn category_counters_are_independent() {
        let store = InMemorySequenceCounter::new();
        store
            .provision(&CounterScope::product_category("BRC"), 0)
            .await
            .unwrap();
        store
            .provision(&CounterScope::product_category("RNG"), 10)
            .await
            .unwrap();

        assert_eq!(store.next_product_code("BRC").await.unwrap(), 1);
        assert_eq!(store.next_product_code("RNG").await.unwrap(), 11);
        assert_eq!(store.next_order_number().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn provision_never_resets_existing_counter() {
        let store = InMemorySequenceCounter::with_order_number(7);

        let created = store.provision(&CounterScope::Orders, 0).await.unwrap();
        assert!(!created);
        assert_eq!(store.next_order_number().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn product_code_exhaustion() {
        let store = InMemorySequenceCounter::new();
        let scope = CounterScope::product_category("BRC");
        store.provision(&scope, u64::from(u8::MAX)).await.unwrap();

        let result = store.next_product_code("BRC").await;
        assert!(matches!(
            result,
            Err(SequenceError::Exhausted { value: 256, .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_increments_are_unique_and_contiguous() {
        let store = InMemorySequenceCounter::with_order_number(100);

        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.next_order_number().await.unwrap()
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap());
        }
        values.sort_unstable();

        let expected: Vec<u64> = (101..=164).collect();
        assert_eq!(values, expected);
        assert_eq!(store.increment_count(), 64);
    }

    #[tokio::test]
    async fn unavailable_store_fails() {
        let store = InMemorySequenceCounter::new();
        store.set_unavailable(true);

        let result = store.next_order_number().await;
        assert!(matches!(result, Err(SequenceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn empty_store_has_no_orders_counter() {
        let store = InMemorySequenceCounter::empty();

        let result = store.next_order_number().await;
        assert!(matches!(
            result,
            Err(SequenceError::CounterNotFound(CounterScope::Orders))
        ));
    }
}
