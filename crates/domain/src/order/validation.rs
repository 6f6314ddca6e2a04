//! Field-level validation of order drafts.
//!
//! Errors are keyed by field path (`Items[0].Quantity`, `Timeline.DueDate`)
//! so callers can attach each message to the offending input.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ClientId, ItemId, MerchantId};

use super::draft::{parse_kind, parse_progress};
use super::{Item, Money, OrderDraft, OrderStatus, PriceAddon};

/// Longest accepted note, in characters.
pub const MAX_NOTE_CHARS: usize = 2000;

/// Largest accepted custom price, flat addon or received amount.
pub const MAX_AMOUNT: Money = Money::from_units(1_000_000_000);

/// Validation failures keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure. The first message for a path wins.
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(path.into()).or_insert_with(|| message.into());
    }

    /// Returns the message for a path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over `(path, message)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `Ok(())` if nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (path, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{path}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Checks a sanitized draft before it is persisted.
pub trait Validator: Send + Sync {
    fn validate(&self, draft: &OrderDraft) -> Result<(), ValidationErrors>;
}

/// Default validator applying the order field rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderValidator;

impl OrderValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for OrderValidator {
    fn validate(&self, draft: &OrderDraft) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if draft.merchant_id.is_none_or(|id| id.is_nil()) {
            errors.add("MerchantID", "is required");
        }
        if draft.client_id.is_none_or(|id| id.is_nil()) {
            errors.add("ClientID", "is required");
        }
        for (i, id) in draft.craftsmen_ids.iter().enumerate() {
            if id.is_nil() {
                errors.add(format!("CraftsmenIDs[{i}]"), "must reference a craftsman");
            }
        }

        if let Err(e) = draft.status.parse::<OrderStatus>() {
            errors.add("Status", e.to_string());
        }

        if draft.items.is_empty() {
            errors.add("Items", "must contain at least one item");
        }
        for (i, item) in draft.items.iter().enumerate() {
            if item.snapshot.is_none() {
                errors.add(format!("Items[{i}].Snapshot"), "is required");
            }
            if item.quantity == 0 {
                errors.add(format!("Items[{i}].Quantity"), "must be at least 1");
            }
            match item.custom_price {
                Some(price) if price.is_negative() => {
                    errors.add(format!("Items[{i}].CustomPrice"), "must not be negative");
                }
                Some(price) if price > MAX_AMOUNT => {
                    errors.add(
                        format!("Items[{i}].CustomPrice"),
                        format!("must be at most {MAX_AMOUNT}"),
                    );
                }
                _ => {}
            }
            if let Err(e) = parse_progress(item.progress.as_deref()) {
                errors.add(format!("Items[{i}].Progress"), e.to_string());
            }
        }

        for (i, addon) in draft.price_addons.iter().enumerate() {
            if let Err(e) = parse_kind(&addon.kind) {
                errors.add(format!("PriceAddons[{i}].Kind"), e.to_string());
            }
            let path = format!("PriceAddons[{i}].Amount");
            if !addon.amount.is_finite() || addon.amount < 0.0 {
                errors.add(path, "must be a non-negative number");
            } else if addon.is_percentage && addon.amount > 100.0 {
                errors.add(path, "must not exceed 100 percent");
            } else if !addon.is_percentage && addon.amount > MAX_AMOUNT.units() as f64 {
                errors.add(path, format!("must be at most {MAX_AMOUNT}"));
            }
        }

        for (i, received) in draft.received_amounts.iter().enumerate() {
            let path = format!("ReceivedAmounts[{i}].Amount");
            if !received.amount.is_positive() {
                errors.add(path, "must be greater than zero");
            } else if received.amount > MAX_AMOUNT {
                errors.add(path, format!("must be at most {MAX_AMOUNT}"));
            }
        }

        match draft.timeline.issuance_date {
            None => errors.add("Timeline.IssuanceDate", "is required"),
            Some(issued) => {
                for (name, date) in draft.timeline.later_dates() {
                    // Strict: a date equal to the issuance date is rejected.
                    if date.is_some_and(|d| d <= issued) {
                        errors.add(
                            format!("Timeline.{name}"),
                            "must be after the issuance date",
                        );
                    }
                }
            }
        }

        if let Some(note) = &draft.note {
            if note.chars().count() > MAX_NOTE_CHARS {
                errors.add(
                    "Note",
                    format!("must be at most {MAX_NOTE_CHARS} characters"),
                );
            }
        }

        errors.into_result()
    }
}

/// The typed fields of a draft, as stored on an order.
#[derive(Debug, Clone)]
pub(crate) struct TypedDraft {
    pub merchant_id: MerchantId,
    pub client_id: ClientId,
    pub status: OrderStatus,
    pub items: Vec<Item>,
    pub price_addons: Vec<PriceAddon>,
    pub issuance_date: DateTime<Utc>,
}

/// Converts a draft that passed validation into typed order fields.
///
/// Fails with field errors for anything a custom validator let through that
/// cannot be represented on an order.
pub(crate) fn into_typed(draft: &OrderDraft) -> Result<TypedDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let merchant_id = draft.merchant_id;
    if merchant_id.is_none() {
        errors.add("MerchantID", "is required");
    }
    let client_id = draft.client_id;
    if client_id.is_none() {
        errors.add("ClientID", "is required");
    }
    let status = draft
        .status
        .parse::<OrderStatus>()
        .map_err(|e| errors.add("Status", e.to_string()))
        .ok();
    let issuance_date = draft.timeline.issuance_date;
    if issuance_date.is_none() {
        errors.add("Timeline.IssuanceDate", "is required");
    }

    let mut items = Vec::with_capacity(draft.items.len());
    for (i, item) in draft.items.iter().enumerate() {
        let progress = parse_progress(item.progress.as_deref())
            .map_err(|e| errors.add(format!("Items[{i}].Progress"), e.to_string()))
            .ok();
        let Some(snapshot) = item.snapshot.clone() else {
            errors.add(format!("Items[{i}].Snapshot"), "is required");
            continue;
        };
        if let Some(progress) = progress {
            items.push(Item {
                id: item.id.unwrap_or_else(ItemId::new),
                product_id: item.product_id,
                variant_id: item.variant_id,
                snapshot,
                custom_price: item.custom_price,
                quantity: item.quantity,
                progress,
            });
        }
    }

    let mut price_addons = Vec::with_capacity(draft.price_addons.len());
    for (i, addon) in draft.price_addons.iter().enumerate() {
        match parse_kind(&addon.kind) {
            Ok(kind) => price_addons.push(PriceAddon {
                kind,
                amount: addon.amount,
                is_percentage: addon.is_percentage,
            }),
            Err(e) => errors.add(format!("PriceAddons[{i}].Kind"), e.to_string()),
        }
    }

    match (merchant_id, client_id, status, issuance_date) {
        (Some(merchant_id), Some(client_id), Some(status), Some(issuance_date))
            if errors.is_empty() =>
        {
            Ok(TypedDraft {
                merchant_id,
                client_id,
                status,
                items,
                price_addons,
                issuance_date,
            })
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use chrono::TimeDelta;
    use common::{CraftsmanId, ProductId, VariantId};

    use super::*;
    use crate::order::{ItemDraft, ItemSnapshot, Money, PriceAddonDraft, ReceivedAmount};

    fn snapshot() -> ItemSnapshot {
        ItemSnapshot {
            product_name: "Oak Bowl".to_string(),
            category: "BWL".to_string(),
            sku: "BWL-001".to_string(),
            variant_name: "Large".to_string(),
            options: BTreeMap::new(),
            price: Money::from_units(80),
            time_to_craft: Duration::ZERO,
        }
    }

    fn item() -> ItemDraft {
        let mut item = ItemDraft::new(ProductId::new(), VariantId::new());
        item.snapshot = Some(snapshot());
        item
    }

    fn valid_draft() -> OrderDraft {
        let mut draft = OrderDraft::for_client(ClientId::new())
            .item(item())
            .issued_at(Utc::now());
        draft.merchant_id = Some(MerchantId::new());
        draft
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(OrderValidator::new().validate(&valid_draft()).is_ok());
    }

    #[test]
    fn test_missing_ids_and_items() {
        let draft = OrderDraft::default();

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert!(errors.contains("MerchantID"));
        assert!(errors.contains("ClientID"));
        assert!(errors.contains("Items"));
        assert!(errors.contains("Timeline.IssuanceDate"));
        assert!(!errors.contains("Status"));
    }

    #[test]
    fn test_nil_ids_count_as_missing() {
        let mut draft = valid_draft();
        draft.client_id = Some(ClientId::from_uuid(uuid::Uuid::nil()));
        draft.craftsmen_ids = vec![
            CraftsmanId::new(),
            CraftsmanId::from_uuid(uuid::Uuid::nil()),
        ];

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert_eq!(errors.get("ClientID"), Some("is required"));
        assert!(errors.contains("CraftsmenIDs[1]"));
        assert!(!errors.contains("CraftsmenIDs[0]"));
    }

    #[test]
    fn test_unknown_enumerations() {
        let mut draft = valid_draft().status("not_a_real_status");
        draft.items[0].progress = Some("polishing".to_string());
        draft.price_addons.push(PriceAddonDraft::flat("tip", 5.0));

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.get("Status").unwrap().contains("not_a_real_status"));
        assert!(errors.contains("Items[0].Progress"));
        assert!(errors.contains("PriceAddons[0].Kind"));
    }

    #[test]
    fn test_item_rules() {
        let mut draft = valid_draft();
        let mut bad = item().quantity(0).custom_price(Money::from_cents(-1));
        bad.snapshot = None;
        draft.items.push(bad);

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert!(errors.contains("Items[1].Snapshot"));
        assert!(errors.contains("Items[1].Quantity"));
        assert!(errors.contains("Items[1].CustomPrice"));
        assert!(!errors.contains("Items[0].Snapshot"));
    }

    #[test]
    fn test_addon_amounts() {
        let draft = valid_draft()
            .addon(PriceAddonDraft::percentage("taxes", 120.0))
            .addon(PriceAddonDraft::flat("shipping", -3.0))
            .addon(PriceAddonDraft::flat("fees", f64::NAN))
            .addon(PriceAddonDraft::flat("discount", 150.0));

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert_eq!(
            errors.get("PriceAddons[0].Amount"),
            Some("must not exceed 100 percent")
        );
        assert!(errors.contains("PriceAddons[1].Amount"));
        assert!(errors.contains("PriceAddons[2].Amount"));
        assert!(!errors.contains("PriceAddons[3].Amount"));
    }

    #[test]
    fn test_received_amount_must_be_positive() {
        let mut draft = valid_draft();
        draft.received_amounts.push(ReceivedAmount {
            amount: Money::zero(),
            date: Utc::now(),
        });

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert!(errors.contains("ReceivedAmounts[0].Amount"));
    }

    #[test]
    fn test_timeline_dates_follow_issuance() {
        let issued = Utc::now();
        let mut draft = valid_draft().issued_at(issued);
        draft.timeline.due_date = Some(issued - TimeDelta::days(1));
        draft.timeline.done_on = Some(issued);
        draft.timeline.shipped_on = Some(issued + TimeDelta::days(3));

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains("Timeline.DueDate"));
        assert!(errors.contains("Timeline.DoneOn"));
        assert!(!errors.contains("Timeline.ShippedOn"));
    }

    #[test]
    fn test_amounts_are_bounded() {
        let mut draft = valid_draft()
            .addon(PriceAddonDraft::flat("fees", 1e20))
            .addon(PriceAddonDraft::flat("shipping", 1_000_000_000.0));
        draft.items[0].custom_price = Some(Money::from_cents(i64::MAX / 2 + 1));
        draft.received_amounts.push(ReceivedAmount {
            amount: Money::from_cents(MAX_AMOUNT.cents() + 1),
            date: Utc::now(),
        });

        let errors = OrderValidator::new().validate(&draft).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.get("Items[0].CustomPrice"),
            Some("must be at most 1000000000.00")
        );
        assert!(errors.contains("PriceAddons[0].Amount"));
        assert!(!errors.contains("PriceAddons[1].Amount"));
        assert!(errors.contains("ReceivedAmounts[0].Amount"));
    }

    #[test]
    fn test_custom_price_at_bound_is_accepted() {
        let mut draft = valid_draft();
        draft.items[0].custom_price = Some(MAX_AMOUNT);
        assert!(OrderValidator::new().validate(&draft).is_ok());
    }

    #[test]
    fn test_note_length() {
        let ok = valid_draft().note("a".repeat(MAX_NOTE_CHARS));
        assert!(OrderValidator::new().validate(&ok).is_ok());

        let long = valid_draft().note("é".repeat(MAX_NOTE_CHARS + 1));
        let errors = OrderValidator::new().validate(&long).unwrap_err();
        assert!(errors.contains("Note"));
    }

    #[test]
    fn test_display_lists_paths() {
        let mut errors = ValidationErrors::new();
        errors.add("Status", "bad");
        errors.add("ClientID", "is required");
        errors.add("ClientID", "ignored");

        assert_eq!(errors.to_string(), "ClientID: is required; Status: bad");
    }

    #[test]
    fn test_into_typed_parses_enumerations() {
        let mut draft = valid_draft()
            .status("in_progress")
            .addon(PriceAddonDraft::percentage("fees", 10.0));
        draft.items[0].progress = Some("designing".to_string());

        let typed = into_typed(&draft).unwrap();
        assert_eq!(typed.status, OrderStatus::InProgress);
        assert_eq!(typed.items.len(), 1);
        assert_eq!(typed.items[0].snapshot, snapshot());
        assert_eq!(typed.price_addons.len(), 1);
    }

    #[test]
    fn test_into_typed_rejects_what_it_cannot_represent() {
        let mut draft = valid_draft().status("lost");
        draft.items[0].snapshot = None;

        let errors = into_typed(&draft).unwrap_err();
        assert!(errors.contains("Status"));
        assert!(errors.contains("Items[0].Snapshot"));
    }
}
