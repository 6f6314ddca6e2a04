//! Order service: the create and update pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{ItemId, OrderId};
use sequence::{SequenceCounter, SequenceCounterExt};
use tracing::{debug, info, warn};

use crate::auth::{self, Claims};
use crate::catalog::CatalogLookup;
use crate::config::ServiceConfig;
use crate::error::OrderServiceError;

use super::pricing::compute_subtotal;
use super::validation::{self, TypedDraft};
use super::{
    ItemDraft, ItemProgress, Order, OrderDraft, OrderFilter, OrderRef, OrderRepository,
    OrderValidator, Sanitizer, TextSanitizer, Timeline, ValidationErrors, Validator,
};

/// Runs `future` under `limit`, mapping expiry to a transient timeout error.
async fn bounded<T, E, F>(
    operation: &'static str,
    limit: Duration,
    future: F,
) -> Result<T, OrderServiceError>
where
    F: Future<Output = Result<T, E>>,
    OrderServiceError: From<E>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result.map_err(OrderServiceError::from),
        Err(_) => Err(OrderServiceError::Timeout { operation }),
    }
}

fn deny(operation: &'static str, claims: Option<&Claims>) -> OrderServiceError {
    warn!(
        operation,
        role = claims.map(|c| c.role.as_str()),
        "authorization denied"
    );
    metrics::counter!("order_authorization_denied_total").increment(1);
    OrderServiceError::Forbidden
}

fn authorize_read(
    operation: &'static str,
    claims: Option<&Claims>,
) -> Result<(), OrderServiceError> {
    if auth::can_read(claims) {
        Ok(())
    } else {
        Err(deny(operation, claims))
    }
}

fn authorize_write<'a>(
    operation: &'static str,
    claims: Option<&'a Claims>,
) -> Result<&'a Claims, OrderServiceError> {
    match claims {
        Some(c) if auth::can_write(claims) => Ok(c),
        _ => Err(deny(operation, claims)),
    }
}

/// Service for creating, updating and reading orders.
///
/// Every call checks the caller's claims before touching any collaborator.
/// Each collaborator call is bounded by the timeouts in [`ServiceConfig`].
pub struct OrderService<C, L, R> {
    counter: C,
    catalog: L,
    repository: R,
    sanitizer: Arc<dyn Sanitizer>,
    validator: Arc<dyn Validator>,
    config: ServiceConfig,
}

impl<C, L, R> OrderService<C, L, R>
where
    C: SequenceCounter,
    L: CatalogLookup,
    R: OrderRepository,
{
    /// Creates a service with the default sanitizer, validator and configuration.
    pub fn new(counter: C, catalog: L, repository: R) -> Self {
        Self {
            counter,
            catalog,
            repository,
            sanitizer: Arc::new(TextSanitizer::new()),
            validator: Arc::new(OrderValidator::new()),
            config: ServiceConfig::default(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Arc::new(sanitizer);
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn catalog(&self) -> &L {
        &self.catalog
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Lists orders matching `filter`.
    #[tracing::instrument(skip(self, claims))]
    pub async fn get_orders(
        &self,
        claims: Option<&Claims>,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, OrderServiceError> {
        authorize_read("get_orders", claims)?;
        bounded(
            "order repository",
            self.config.repository_timeout,
            self.repository.get_orders(filter),
        )
        .await
    }

    /// Loads an order by id.
    ///
    /// Returns `NotFound` if no order has that id.
    #[tracing::instrument(skip(self, claims))]
    pub async fn get_order_by_id(
        &self,
        claims: Option<&Claims>,
        id: OrderId,
    ) -> Result<Order, OrderServiceError> {
        authorize_read("get_order_by_id", claims)?;
        self.load(id).await
    }

    /// Creates an order from a draft.
    ///
    /// The order number is allocated before the items are resolved. If any
    /// later step fails the number stays consumed; this is logged and counted
    /// but never rolled back.
    #[tracing::instrument(skip(self, claims, draft), fields(items = draft.items.len()))]
    pub async fn create_order(
        &self,
        claims: Option<&Claims>,
        draft: OrderDraft,
    ) -> Result<Order, OrderServiceError> {
        let claims = authorize_write("create_order", claims)?;

        let reference = OrderRef::generate();
        let number = bounded(
            "sequence counter",
            self.config.counter_timeout,
            self.counter.next_order_number(),
        )
        .await?;

        match self.create_numbered(claims, draft, reference, number).await {
            Ok(order) => {
                info!(number, reference = %order.reference, "order created");
                metrics::counter!("orders_created_total").increment(1);
                Ok(order)
            }
            Err(e) => {
                warn!(number, error = %e, "order creation failed, order number burned");
                metrics::counter!("order_numbers_burned_total").increment(1);
                Err(e)
            }
        }
    }

    /// Updates a stored order from a draft.
    ///
    /// Items are merged by id: stored items the draft leaves out are kept,
    /// items the draft names only take their price, quantity and progress from
    /// it, and items without a known id are added as new.
    #[tracing::instrument(skip(self, claims, draft))]
    pub async fn update_order_by_id(
        &self,
        claims: Option<&Claims>,
        id: OrderId,
        draft: OrderDraft,
    ) -> Result<Order, OrderServiceError> {
        authorize_write("update_order_by_id", claims)?;

        let stored = self.load(id).await?;
        let mut draft = self.merge(&stored, draft).await?;

        self.sanitizer.sanitize(&mut draft)?;
        self.validator.validate(&draft)?;
        let typed = validation::into_typed(&draft)?;

        let order = assemble(typed, draft, |order| Order {
            id: stored.id,
            reference: stored.reference.clone(),
            number: stored.number,
            merchant_id: stored.merchant_id,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..order
        })?;

        let updated = bounded(
            "order repository",
            self.config.repository_timeout,
            self.repository.update_order_by_id(id, order),
        )
        .await?;

        info!(number = updated.number, "order updated");
        metrics::counter!("orders_updated_total").increment(1);
        Ok(updated)
    }

    async fn load(&self, id: OrderId) -> Result<Order, OrderServiceError> {
        bounded(
            "order repository",
            self.config.repository_timeout,
            self.repository.get_order_by_id(id),
        )
        .await?
        .ok_or(OrderServiceError::NotFound(id))
    }

    /// Attaches a fresh catalog snapshot to a new item.
    async fn resolve(&self, item: &mut ItemDraft) -> Result<(), OrderServiceError> {
        let entry = bounded(
            "catalog",
            self.config.catalog_timeout,
            self.catalog.resolve(item.product_id, item.variant_id),
        )
        .await?;
        debug!(product_id = %item.product_id, sku = %entry.sku, "resolved catalog entry");

        item.id = Some(ItemId::new());
        item.snapshot = Some(entry.snapshot());
        Ok(())
    }

    async fn create_numbered(
        &self,
        claims: &Claims,
        mut draft: OrderDraft,
        reference: OrderRef,
        number: u64,
    ) -> Result<Order, OrderServiceError> {
        let now = Utc::now();
        draft.timeline.issuance_date.get_or_insert(now);

        for item in &mut draft.items {
            self.resolve(item).await?;
            item.progress = Some(ItemProgress::NotStarted.as_str().to_string());
        }

        self.sanitizer.sanitize(&mut draft)?;
        if draft.merchant_id.is_none() {
            draft.merchant_id = claims.merchant_id();
        }
        self.validator.validate(&draft)?;
        let typed = validation::into_typed(&draft)?;

        let order = assemble(typed, draft, |order| Order {
            reference,
            number,
            created_at: now,
            updated_at: now,
            ..order
        })?;

        bounded(
            "order repository",
            self.config.repository_timeout,
            self.repository.create_order(order),
        )
        .await
    }

    /// Folds a draft into a stored order's items.
    async fn merge(
        &self,
        stored: &Order,
        draft: OrderDraft,
    ) -> Result<OrderDraft, OrderServiceError> {
        let mut items: Vec<ItemDraft> = stored.items.iter().map(ItemDraft::from).collect();

        for incoming in draft.items {
            let known = incoming
                .id
                .and_then(|id| items.iter().position(|item| item.id == Some(id)));
            match known {
                Some(index) => {
                    let existing = &mut items[index];
                    existing.custom_price = incoming.custom_price;
                    existing.quantity = incoming.quantity;
                    if incoming.progress.is_some() {
                        existing.progress = incoming.progress;
                    }
                }
                None => {
                    let mut item = incoming;
                    self.resolve(&mut item).await?;
                    items.push(item);
                }
            }
        }

        let mut timeline = draft.timeline;
        if timeline.issuance_date.is_none() {
            timeline.issuance_date = stored.timeline.issuance_date;
        }

        Ok(OrderDraft {
            merchant_id: Some(stored.merchant_id),
            items,
            timeline,
            ..draft
        })
    }
}

/// Builds an order from validated fields, letting `finish` fill in identity
/// and timestamps.
fn assemble(
    typed: TypedDraft,
    draft: OrderDraft,
    finish: impl FnOnce(Order) -> Order,
) -> Result<Order, ValidationErrors> {
    let subtotal = compute_subtotal(&typed.items, &typed.price_addons).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("Subtotal", e.to_string());
        errors
    })?;
    let timeline = Timeline {
        issuance_date: Some(typed.issuance_date),
        ..draft.timeline
    };
    let now = Utc::now();

    Ok(finish(Order {
        id: None,
        reference: OrderRef::default(),
        number: 0,
        merchant_id: typed.merchant_id,
        client_id: typed.client_id,
        craftsmen_ids: draft.craftsmen_ids,
        status: typed.status,
        items: typed.items,
        price_addons: typed.price_addons,
        received_amounts: draft.received_amounts,
        timeline,
        note: draft.note,
        subtotal,
        created_at: now,
        updated_at: now,
    }))
}
