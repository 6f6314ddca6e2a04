//! Enumerations carried by an order: its status, item progress and addon kinds.

use serde::{Deserialize, Serialize};

/// Error returned when a string names no member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub value: String,
    pub expected: &'static [&'static str],
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown value {:?}, expected one of {}",
            self.value,
            self.expected.join(" ")
        )
    }
}

impl std::error::Error for UnknownVariant {}

/// Generates `as_str`, `label`, `ALL` and `FromStr` for a unit-only enum.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            const NAMES: &'static [&'static str] = &[$($wire),+];

            /// Returns the wire name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Returns the human-readable label.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        value: s.to_string(),
                        expected: Self::NAMES,
                    }),
                }
            }
        }
    };
}

/// The lifecycle status of an order.
///
/// Cancellation is a status, orders are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    PendingConfirmation,
    Confirmed,
    InProgress,
    PendingShipment,
    Shipping,
    PendingPayment,
    Completed,
    Canceled,
    Expired,
}

string_enum!(OrderStatus {
    PendingConfirmation => ("pending_confirmation", "Pending Confirmation"),
    Confirmed => ("confirmed", "Confirmed"),
    InProgress => ("in_progress", "In Progress"),
    PendingShipment => ("pending_shipment", "Pending Shipment"),
    Shipping => ("shipping", "Shipping"),
    PendingPayment => ("pending_payment", "Pending Payment"),
    Completed => ("completed", "Completed"),
    Canceled => ("canceled", "Canceled"),
    Expired => ("expired", "Expired"),
});

impl OrderStatus {
    /// Returns true if no further work is expected on the order.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Canceled | OrderStatus::Expired
        )
    }
}

/// Crafting progress of a single order item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemProgress {
    #[default]
    NotStarted,
    Designing,
    PendingMaterial,
    Crafting,
    LaserCarving,
    OnHold,
    Done,
}

string_enum!(ItemProgress {
    NotStarted => ("not_started", "Not Started"),
    Designing => ("designing", "Designing"),
    PendingMaterial => ("pending_material", "Pending Material"),
    Crafting => ("crafting", "Crafting"),
    LaserCarving => ("laser_carving", "Laser Carving"),
    OnHold => ("on_hold", "On Hold"),
    Done => ("done", "Done"),
});

/// Kind of adjustment a price addon applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceAddonKind {
    Fees,
    Taxes,
    Shipping,
    Discount,
}

string_enum!(PriceAddonKind {
    Fees => ("fees", "Fees"),
    Taxes => ("taxes", "Taxes"),
    Shipping => ("shipping", "Shipping"),
    Discount => ("discount", "Discount"),
});

impl PriceAddonKind {
    /// Returns true if this kind lowers the price.
    pub fn is_reduction(&self) -> bool {
        matches!(self, PriceAddonKind::Discount)
    }
}
