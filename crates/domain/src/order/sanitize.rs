//! Normalization of order drafts before validation.

use std::collections::HashSet;

use thiserror::Error;

use super::OrderDraft;

/// Separator controls trimmed along with whitespace.
const SEPARATORS: [char; 4] = ['\x1c', '\x1d', '\x1e', '\x1f'];

/// Errors raised when a draft cannot be normalized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizeError {
    /// The field holds control characters that have no normalized form.
    #[error("Field {field} contains control characters")]
    ControlCharacters { field: String },
}

/// Normalizes a draft in place.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, draft: &mut OrderDraft) -> Result<(), SanitizeError>;
}

/// Default sanitizer: trims text, normalizes letter case and removes duplicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSanitizer;

impl TextSanitizer {
    pub fn new() -> Self {
        Self
    }
}

fn trim(value: &str, field: &str) -> Result<String, SanitizeError> {
    let trimmed = value.trim_matches(|c: char| c.is_whitespace() || SEPARATORS.contains(&c));
    if trimmed.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(SanitizeError::ControlCharacters {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn lower(value: &str, field: &str) -> Result<String, SanitizeError> {
    trim(value, field).map(|s| s.to_lowercase())
}

fn upper(value: &str, field: &str) -> Result<String, SanitizeError> {
    trim(value, field).map(|s| s.to_uppercase())
}

/// Upper-cases the first letter of every word.
fn title(value: &str, field: &str) -> Result<String, SanitizeError> {
    let trimmed = trim(value, field)?;
    let mut out = String::with_capacity(trimmed.len());
    let mut word_start = true;
    for c in trimmed.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = c.is_whitespace();
    }
    Ok(out)
}

impl Sanitizer for TextSanitizer {
    fn sanitize(&self, draft: &mut OrderDraft) -> Result<(), SanitizeError> {
        draft.status = lower(&draft.status, "Status")?;

        let mut seen = HashSet::new();
        draft.craftsmen_ids.retain(|id| seen.insert(*id));

        for (i, item) in draft.items.iter_mut().enumerate() {
            if let Some(progress) = &item.progress {
                let progress = lower(progress, &format!("Items[{i}].Progress"))?;
                item.progress = (!progress.is_empty()).then_some(progress);
            }

            if let Some(snapshot) = item.snapshot.as_mut() {
                let path = format!("Items[{i}].Snapshot");
                snapshot.product_name =
                    title(&snapshot.product_name, &format!("{path}.ProductName"))?;
                snapshot.variant_name =
                    title(&snapshot.variant_name, &format!("{path}.VariantName"))?;
                snapshot.category = upper(&snapshot.category, &format!("{path}.Category"))?;
                snapshot.sku = trim(&snapshot.sku, &format!("{path}.Sku"))?;
                snapshot.options = std::mem::take(&mut snapshot.options)
                    .into_iter()
                    .map(|(name, value)| -> Result<(String, String), SanitizeError> {
                        let field = format!("{path}.Options.{name}");
                        Ok((trim(&name, &field)?, trim(&value, &field)?))
                    })
                    .collect::<Result<_, _>>()?;
            }
        }

        for (i, addon) in draft.price_addons.iter_mut().enumerate() {
            addon.kind = lower(&addon.kind, &format!("PriceAddons[{i}].Kind"))?;
        }

        if let Some(note) = &draft.note {
            let note = trim(note, "Note")?;
            draft.note = (!note.is_empty()).then_some(note);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use common::{ClientId, CraftsmanId, ProductId, VariantId};

    use super::*;
    use crate::order::{ItemDraft, ItemSnapshot, Money, PriceAddonDraft};

    fn snapshot() -> ItemSnapshot {
        ItemSnapshot {
            product_name: "  leather wallet ".to_string(),
            category: " wlt\x1f".to_string(),
            sku: " WLT-001 ".to_string(),
            variant_name: "dark brown".to_string(),
            options: BTreeMap::from([(" color ".to_string(), " brown".to_string())]),
            price: Money::from_units(45),
            time_to_craft: Duration::ZERO,
        }
    }

    #[test]
    fn test_trims_and_normalizes_case() {
        let mut item =
            ItemDraft::new(ProductId::new(), VariantId::new()).progress(" Crafting\x1c");
        item.snapshot = Some(snapshot());
        let mut draft = OrderDraft::for_client(ClientId::new())
            .status("  Confirmed\n")
            .item(item)
            .addon(PriceAddonDraft::flat("\x1dSHIPPING ", 60.0))
            .note("  handle with care ");

        TextSanitizer::new().sanitize(&mut draft).unwrap();

        assert_eq!(draft.status, "confirmed");
        assert_eq!(draft.items[0].progress.as_deref(), Some("crafting"));
        assert_eq!(draft.price_addons[0].kind, "shipping");
        assert_eq!(draft.note.as_deref(), Some("handle with care"));

        let snapshot = draft.items[0].snapshot.as_ref().unwrap();
        assert_eq!(snapshot.product_name, "Leather Wallet");
        assert_eq!(snapshot.variant_name, "Dark Brown");
        assert_eq!(snapshot.category, "WLT");
        assert_eq!(snapshot.sku, "WLT-001");
        assert_eq!(snapshot.options.get("color").map(String::as_str), Some("brown"));
    }

    #[test]
    fn test_blank_note_and_progress_are_dropped() {
        let item = ItemDraft::new(ProductId::new(), VariantId::new()).progress("   ");
        let mut draft = OrderDraft::for_client(ClientId::new()).item(item).note(" \t ");

        TextSanitizer::new().sanitize(&mut draft).unwrap();

        assert_eq!(draft.note, None);
        assert_eq!(draft.items[0].progress, None);
    }

    #[test]
    fn test_deduplicates_craftsmen_keeping_order() {
        let a = CraftsmanId::new();
        let b = CraftsmanId::new();
        let mut draft = OrderDraft {
            craftsmen_ids: vec![a, b, a, b, a],
            ..Default::default()
        };

        TextSanitizer::new().sanitize(&mut draft).unwrap();

        assert_eq!(draft.craftsmen_ids, vec![a, b]);
    }

    #[test]
    fn test_rejects_nul_in_note() {
        let mut draft = OrderDraft::default().note("bad\0note");

        let err = TextSanitizer::new().sanitize(&mut draft).unwrap_err();
        assert_eq!(
            err,
            SanitizeError::ControlCharacters {
                field: "Note".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_control_character_in_addon_kind() {
        let mut draft = OrderDraft::default()
            .addon(PriceAddonDraft::flat("fees", 1.0))
            .addon(PriceAddonDraft::flat("ta\x07xes", 1.0));

        let err = TextSanitizer::new().sanitize(&mut draft).unwrap_err();
        assert_eq!(
            err,
            SanitizeError::ControlCharacters {
                field: "PriceAddons[1].Kind".to_string()
            }
        );
    }
}
