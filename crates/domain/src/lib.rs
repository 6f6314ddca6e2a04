//! Domain layer for the order pipeline.
//!
//! This crate provides:
//! - Role-based authorization of callers
//! - Catalog lookup used to snapshot items onto orders
//! - The pricing engine computing order subtotals
//! - OrderService, the create/update pipeline built on a sequence counter,
//!   the catalog and an order repository

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod order;

pub use auth::{Claims, CraftsmanProfile, Role};
pub use catalog::{CatalogEntry, CatalogError, CatalogLookup, InMemoryCatalog};
pub use config::ServiceConfig;
pub use error::OrderServiceError;
pub use order::{
    AmountOverflow, InMemoryOrderRepository, Item, ItemDraft, ItemProgress, ItemSnapshot,
    MAX_AMOUNT, Money, Order, OrderDraft, OrderFilter, OrderRef, OrderRepository, OrderService,
    OrderStatus, OrderValidator, PriceAddon, PriceAddonDraft, PriceAddonKind, ReceivedAmount,
    RepositoryError, SanitizeError, Sanitizer, TextSanitizer, Timeline, ValidationErrors,
    Validator, compute_subtotal, price_breakdown,
};
