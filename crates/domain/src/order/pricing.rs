//! Subtotal computation.
//!
//! The subtotal is a pure function of the items and the price addons and is
//! recomputed from scratch on every write.
//!
//! Order of application:
//! ```text
//! items total ──► + flat addons (discount subtracts)
//!             ──► ± fees% ► shipping% ► discount%   (rate × items total)
//!             ──► + taxes%                          (rate × running total)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Item, Money, PriceAddon, PriceAddonKind};

/// Percentage addons are applied in this order.
pub const PERCENTAGE_ORDER: [PriceAddonKind; 4] = [
    PriceAddonKind::Fees,
    PriceAddonKind::Shipping,
    PriceAddonKind::Discount,
    PriceAddonKind::Taxes,
];

/// One applied percentage addon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentageAdjustment {
    pub kind: PriceAddonKind,
    pub rate: f64,
    /// Signed change to the running total.
    pub amount: Money,
}

/// Every step of a subtotal computation, for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub items_total: Money,
    /// Net of all flat addons.
    pub flat_adjustment: Money,
    pub percentage_adjustments: Vec<PercentageAdjustment>,
    pub subtotal: Money,
}

/// A step of the subtotal computation left the range of [`Money`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount exceeds the largest representable value")]
pub struct AmountOverflow;

fn signed(kind: PriceAddonKind, amount: Money) -> Result<Money, AmountOverflow> {
    if kind.is_reduction() {
        Money::zero().checked_sub(amount).ok_or(AmountOverflow)
    } else {
        Ok(amount)
    }
}

fn checked_sum(amounts: impl IntoIterator<Item = Option<Money>>) -> Result<Money, AmountOverflow> {
    amounts.into_iter().try_fold(Money::zero(), |acc, amount| {
        amount.and_then(|amount| acc.checked_add(amount)).ok_or(AmountOverflow)
    })
}

/// Computes the subtotal together with the steps that produced it.
///
/// Fails with [`AmountOverflow`] if any intermediate amount does not fit.
pub fn price_breakdown(
    items: &[Item],
    addons: &[PriceAddon],
) -> Result<PricingBreakdown, AmountOverflow> {
    let items_total = checked_sum(items.iter().map(Item::line_total))?;

    let (flat, percentage): (Vec<&PriceAddon>, Vec<&PriceAddon>) =
        addons.iter().partition(|addon| !addon.is_percentage);

    let flat_adjustment = checked_sum(flat.iter().map(|addon| {
        Money::from_major(addon.amount).and_then(|amount| signed(addon.kind, amount).ok())
    }))?;

    let mut total = items_total
        .checked_add(flat_adjustment)
        .ok_or(AmountOverflow)?;
    let mut percentage_adjustments = Vec::new();

    for kind in PERCENTAGE_ORDER {
        for addon in percentage.iter().filter(|addon| addon.kind == kind) {
            // Taxes apply to everything before them, the rest to the items only.
            let base = if kind == PriceAddonKind::Taxes {
                total
            } else {
                items_total
            };
            let amount = signed(kind, base.percentage(addon.amount).ok_or(AmountOverflow)?)?;
            total = total.checked_add(amount).ok_or(AmountOverflow)?;
            percentage_adjustments.push(PercentageAdjustment {
                kind,
                rate: addon.amount,
                amount,
            });
        }
    }

    Ok(PricingBreakdown {
        items_total,
        flat_adjustment,
        percentage_adjustments,
        subtotal: total,
    })
}

/// Computes an order's subtotal from its items and price addons.
pub fn compute_subtotal(items: &[Item], addons: &[PriceAddon]) -> Result<Money, AmountOverflow> {
    price_breakdown(items, addons).map(|breakdown| breakdown.subtotal)
}
