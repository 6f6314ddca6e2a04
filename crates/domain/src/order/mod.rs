//! Orders: the model, the pricing engine and the create/update service.

mod draft;
mod model;
pub mod pricing;
mod repository;
mod sanitize;
mod service;
mod state;
mod validation;
mod value_objects;

pub use draft::{ItemDraft, OrderDraft, PriceAddonDraft};
pub use model::{Item, ItemSnapshot, Order, PriceAddon, ReceivedAmount, Timeline};
pub use pricing::{
    AmountOverflow, PercentageAdjustment, PricingBreakdown, compute_subtotal, price_breakdown,
};
pub use repository::{InMemoryOrderRepository, OrderFilter, OrderRepository, RepositoryError};
pub use sanitize::{SanitizeError, Sanitizer, TextSanitizer};
pub use service::OrderService;
pub use state::{ItemProgress, OrderStatus, PriceAddonKind, UnknownVariant};
pub use validation::{MAX_AMOUNT, MAX_NOTE_CHARS, OrderValidator, ValidationErrors, Validator};
pub use value_objects::{Money, OrderRef, REF_ALPHABET, REF_LEN};
