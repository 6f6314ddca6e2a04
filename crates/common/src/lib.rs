//! Identifier types shared by the sequence and domain crates.

mod ids;

pub use ids::{ClientId, CraftsmanId, ItemId, MerchantId, OrderId, ProductId, UserId, VariantId};
