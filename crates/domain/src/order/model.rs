//! The order aggregate and the records it is made of.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{ClientId, CraftsmanId, ItemId, MerchantId, OrderId, ProductId, VariantId};
use serde::{Deserialize, Serialize};

use super::{ItemProgress, Money, OrderRef, OrderStatus, PriceAddonKind};

/// Catalog attributes copied onto an item when it is added to an order.
///
/// A snapshot is never re-read from the catalog, so later catalog edits do not
/// change placed orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub product_name: String,
    pub category: String,
    pub sku: String,
    pub variant_name: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub price: Money,
    #[serde(default)]
    pub time_to_craft: Duration,
}

/// One ordered unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub snapshot: ItemSnapshot,

    /// Overrides the snapshot price when positive.
    pub custom_price: Option<Money>,
    pub quantity: u16,
    pub progress: ItemProgress,
}

impl Item {
    /// Returns the unit price used for pricing.
    pub fn effective_price(&self) -> Money {
        match self.custom_price {
            Some(price) if price.is_positive() => price,
            _ => self.snapshot.price,
        }
    }

    /// Returns the effective price times the quantity, or `None` if the
    /// product overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.effective_price().checked_mul(u32::from(self.quantity))
    }
}

/// A flat or percentage adjustment to the order price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAddon {
    pub kind: PriceAddonKind,

    /// Currency units for flat addons, a 0–100 rate for percentage addons.
    pub amount: f64,
    #[serde(default)]
    pub is_percentage: bool,
}

impl PriceAddon {
    /// Creates a flat addon of `amount` currency units.
    pub fn flat(kind: PriceAddonKind, amount: f64) -> Self {
        Self {
            kind,
            amount,
            is_percentage: false,
        }
    }

    /// Creates a percentage addon of `rate` percent.
    pub fn percentage(kind: PriceAddonKind, rate: f64) -> Self {
        Self {
            kind,
            amount: rate,
            is_percentage: true,
        }
    }
}

/// A partial payment received for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedAmount {
    pub amount: Money,
    pub date: DateTime<Utc>,
}

/// Dates in an order's life.
///
/// Every date after the issuance date must not precede it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub issuance_date: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub done_on: Option<DateTime<Utc>>,
    pub shipped_on: Option<DateTime<Utc>>,
    pub resolved_on: Option<DateTime<Utc>>,
}

impl Timeline {
    /// Creates a timeline issued at `issuance_date`.
    pub fn issued_at(issuance_date: DateTime<Utc>) -> Self {
        Self {
            issuance_date: Some(issuance_date),
            ..Default::default()
        }
    }

    /// Returns the dates that must follow the issuance date, with their field names.
    pub fn later_dates(&self) -> [(&'static str, Option<DateTime<Utc>>); 5] {
        [
            ("ScheduledDate", self.scheduled_date),
            ("DueDate", self.due_date),
            ("DoneOn", self.done_on),
            ("ShippedOn", self.shipped_on),
            ("ResolvedOn", self.resolved_on),
        ]
    }
}

/// An order representing one customer commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Assigned by the repository on insert.
    pub id: Option<OrderId>,
    #[serde(rename = "ref")]
    pub reference: OrderRef,
    pub number: u64,

    pub merchant_id: MerchantId,
    pub client_id: ClientId,
    #[serde(default)]
    pub craftsmen_ids: Vec<CraftsmanId>,

    pub status: OrderStatus,
    pub items: Vec<Item>,
    #[serde(default)]
    pub price_addons: Vec<PriceAddon>,
    #[serde(default)]
    pub received_amounts: Vec<ReceivedAmount>,
    pub timeline: Timeline,
    pub note: Option<String>,

    /// Output of the pricing engine as of the last write.
    pub subtotal: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the reference split for display.
    pub fn ref_view(&self) -> String {
        self.reference.view()
    }

    /// Returns an item by id.
    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Returns the sum of all received payments.
    pub fn total_paid(&self) -> Money {
        self.received_amounts.iter().map(|r| r.amount).sum()
    }

    /// Returns what is still owed on the order.
    pub fn remaining_amount(&self) -> Money {
        self.subtotal - self.total_paid()
    }

    /// Returns true once the received payments cover the subtotal.
    pub fn is_fully_paid(&self) -> bool {
        !self.remaining_amount().is_positive()
    }

    /// Returns the estimated crafting time of all items.
    pub fn time_to_craft(&self) -> Duration {
        self.items
            .iter()
            .map(|item| item.snapshot.time_to_craft * u32::from(item.quantity))
            .sum()
    }
}
