//! Unvalidated order input.
//!
//! Drafts are what callers hand to the service. Enumerated fields are plain
//! strings here and only become typed values once validation has accepted
//! them, so an unknown status is reported as a field error rather than a
//! deserialization failure.

use chrono::{DateTime, Utc};
use common::{ClientId, CraftsmanId, ItemId, MerchantId, ProductId, VariantId};
use serde::{Deserialize, Serialize};

use super::{
    Item, ItemProgress, ItemSnapshot, Money, Order, OrderStatus, PriceAddon, PriceAddonKind,
    ReceivedAmount, Timeline,
};

fn default_status() -> String {
    OrderStatus::default().as_str().to_string()
}

fn default_quantity() -> u16 {
    1
}

/// Input for one order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    /// Identity of an existing item; None for a new item.
    #[serde(default)]
    pub id: Option<ItemId>,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    #[serde(default)]
    pub custom_price: Option<Money>,
    #[serde(default = "default_quantity")]
    pub quantity: u16,
    #[serde(default)]
    pub progress: Option<String>,

    /// Filled in by the service from the catalog or the stored item; any
    /// caller-supplied value is overwritten.
    #[serde(skip)]
    pub snapshot: Option<ItemSnapshot>,
}

impl ItemDraft {
    /// Creates a draft for a new item of the given product variant.
    pub fn new(product_id: ProductId, variant_id: VariantId) -> Self {
        Self {
            id: None,
            product_id,
            variant_id,
            custom_price: None,
            quantity: default_quantity(),
            progress: None,
            snapshot: None,
        }
    }

    /// Sets the quantity.
    pub fn quantity(mut self, quantity: u16) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets a custom unit price.
    pub fn custom_price(mut self, price: Money) -> Self {
        self.custom_price = Some(price);
        self
    }

    /// Sets the progress.
    pub fn progress(mut self, progress: impl Into<String>) -> Self {
        self.progress = Some(progress.into());
        self
    }
}

impl From<&Item> for ItemDraft {
    fn from(item: &Item) -> Self {
        Self {
            id: Some(item.id),
            product_id: item.product_id,
            variant_id: item.variant_id,
            custom_price: item.custom_price,
            quantity: item.quantity,
            progress: Some(item.progress.as_str().to_string()),
            snapshot: Some(item.snapshot.clone()),
        }
    }
}

/// Input for one price addon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAddonDraft {
    pub kind: String,
    pub amount: f64,
    #[serde(default)]
    pub is_percentage: bool,
}

impl PriceAddonDraft {
    /// Creates a flat addon draft.
    pub fn flat(kind: impl Into<String>, amount: f64) -> Self {
        Self {
            kind: kind.into(),
            amount,
            is_percentage: false,
        }
    }

    /// Creates a percentage addon draft.
    pub fn percentage(kind: impl Into<String>, rate: f64) -> Self {
        Self {
            kind: kind.into(),
            amount: rate,
            is_percentage: true,
        }
    }
}

impl From<&PriceAddon> for PriceAddonDraft {
    fn from(addon: &PriceAddon) -> Self {
        Self {
            kind: addon.kind.as_str().to_string(),
            amount: addon.amount,
            is_percentage: addon.is_percentage,
        }
    }
}

/// Input for creating or updating an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Defaults to the caller's merchant when omitted.
    #[serde(default)]
    pub merchant_id: Option<MerchantId>,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub craftsmen_ids: Vec<CraftsmanId>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub items: Vec<ItemDraft>,
    #[serde(default)]
    pub price_addons: Vec<PriceAddonDraft>,
    #[serde(default)]
    pub received_amounts: Vec<ReceivedAmount>,
    #[serde(default)]
    pub timeline: Timeline,
    #[serde(default)]
    pub note: Option<String>,
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self {
            merchant_id: None,
            client_id: None,
            craftsmen_ids: Vec::new(),
            status: default_status(),
            items: Vec::new(),
            price_addons: Vec::new(),
            received_amounts: Vec::new(),
            timeline: Timeline::default(),
            note: None,
        }
    }
}

impl OrderDraft {
    /// Creates a draft for the given client.
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Default::default()
        }
    }

    /// Adds an item.
    pub fn item(mut self, item: ItemDraft) -> Self {
        self.items.push(item);
        self
    }

    /// Adds a price addon.
    pub fn addon(mut self, addon: PriceAddonDraft) -> Self {
        self.price_addons.push(addon);
        self
    }

    /// Sets the status.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets the issuance date.
    pub fn issued_at(mut self, date: DateTime<Utc>) -> Self {
        self.timeline.issuance_date = Some(date);
        self
    }
}

impl From<&Order> for OrderDraft {
    fn from(order: &Order) -> Self {
        Self {
            merchant_id: Some(order.merchant_id),
            client_id: Some(order.client_id),
            craftsmen_ids: order.craftsmen_ids.clone(),
            status: order.status.as_str().to_string(),
            items: order.items.iter().map(ItemDraft::from).collect(),
            price_addons: order.price_addons.iter().map(PriceAddonDraft::from).collect(),
            received_amounts: order.received_amounts.clone(),
            timeline: order.timeline.clone(),
            note: order.note.clone(),
        }
    }
}

/// Parses a progress string, treating an absent value as the default.
pub(crate) fn parse_progress(
    progress: Option<&str>,
) -> Result<ItemProgress, super::state::UnknownVariant> {
    progress.map_or(Ok(ItemProgress::default()), str::parse)
}

/// Parses an addon kind string.
pub(crate) fn parse_kind(kind: &str) -> Result<PriceAddonKind, super::state::UnknownVariant> {
    kind.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_applies_defaults() {
        let product_id = ProductId::new();
        let variant_id = VariantId::new();
        let json = serde_json::json!({
            "client_id": ClientId::new(),
            "items": [{ "product_id": product_id, "variant_id": variant_id }],
        });

        let draft: OrderDraft = serde_json::from_value(json).unwrap();
        assert_eq!(draft.status, "pending_confirmation");
        assert_eq!(draft.items[0].quantity, 1);
        assert!(draft.items[0].snapshot.is_none());
        assert!(draft.price_addons.is_empty());
    }

    #[test]
    fn test_snapshot_cannot_be_supplied_by_caller() {
        let json = serde_json::json!({
            "product_id": ProductId::new(),
            "variant_id": VariantId::new(),
            "snapshot": { "price": { "cents": 1 } },
        });

        let item: ItemDraft = serde_json::from_value(json).unwrap();
        assert!(item.snapshot.is_none());
    }

    #[test]
    fn test_unknown_status_survives_deserialization() {
        let json = serde_json::json!({ "status": "not_a_real_status" });
        let draft: OrderDraft = serde_json::from_value(json).unwrap();
        assert_eq!(draft.status, "not_a_real_status");
    }

    #[test]
    fn test_parse_progress_defaults() {
        assert_eq!(parse_progress(None).unwrap(), ItemProgress::NotStarted);
        assert_eq!(parse_progress(Some("done")).unwrap(), ItemProgress::Done);
        assert!(parse_progress(Some("finished")).is_err());
    }
}
