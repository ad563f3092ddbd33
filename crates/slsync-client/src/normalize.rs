//! Normalization of raw SelectLine payloads into the canonical mirror
//! shapes. Pure functions, no I/O.
//!
//! Field policy across both normalizers: a record is rejected only when
//! it is not an object or lacks the identifiers the mirror keys on.
//! Every other field coerces leniently — numbers-as-strings, 0/1 flags —
//! and degrades to its default when the value is unusable, so one drifted
//! field never drops a record.

use chrono::{DateTime, Utc};
use serde_json::Value;

use slsync_core::{RemoteArticle, RemoteGroup};

use crate::types::{RawArticle, RawGroup};

/// Converts a raw group record into a [`RemoteGroup`].
///
/// Returns `None` when the record is not an object or has no usable group
/// number — without the external id there is nothing to upsert against.
/// A missing name becomes the id, and `updated_at` is not part of the
/// remote group schema at all. Most deployments expose no group activity
/// flag; when one is present (`IsActive`, or `IsInactive` inverted) it is
/// honoured, otherwise the group counts as active.
#[must_use]
pub fn normalize_group(raw: &Value) -> Option<RemoteGroup> {
    let group: RawGroup = serde_json::from_value(raw.clone()).ok()?;
    let id = group.number.as_ref().and_then(value_to_id)?;

    let name = group
        .name
        .as_ref()
        .and_then(value_to_text)
        .unwrap_or_else(|| id.clone());

    let is_active = group
        .is_active
        .as_ref()
        .and_then(value_to_flag)
        .or_else(|| group.is_inactive.as_ref().and_then(value_to_flag).map(|v| !v))
        .unwrap_or(true);

    Some(RemoteGroup {
        id,
        name,
        description: group.description.as_ref().and_then(value_to_text),
        parent_id: group.parent.as_ref().and_then(value_to_id),
        sort_order: group.sort_order.as_ref().and_then(value_to_i32),
        is_active,
        updated_at: None,
    })
}

/// Converts a raw article record into a [`RemoteArticle`].
///
/// Returns `None` when the record has no article number or no group
/// reference; both are required to key the mirror row. Field policy:
///
/// - `title` falls back to the article number when the name is blank.
/// - `description` is the first non-blank of the two description fields.
/// - `active` is `!IsInactive && IsShopArticle`; an absent or unusable
///   shop flag means inactive.
/// - every leftover raw field is carried verbatim in `attributes`.
#[must_use]
pub fn normalize_article(raw: &Value) -> Option<RemoteArticle> {
    let article: RawArticle = serde_json::from_value(raw.clone()).ok()?;
    let external_id = article.number.as_ref().and_then(value_to_id)?;
    let group_external_id = article.article_group.as_ref().and_then(value_to_id)?;

    let title = article
        .name
        .as_ref()
        .and_then(value_to_text)
        .unwrap_or_else(|| external_id.clone());

    let description = [&article.description, &article.additional_description]
        .into_iter()
        .flatten()
        .find_map(value_to_text);

    let is_inactive = article
        .is_inactive
        .as_ref()
        .and_then(value_to_flag)
        .unwrap_or(false);
    let is_shop_article = article
        .is_shop_article
        .as_ref()
        .and_then(value_to_flag)
        .unwrap_or(false);
    let active = !is_inactive && is_shop_article;

    let sku = article
        .sku
        .as_ref()
        .and_then(value_to_id)
        .unwrap_or_else(|| external_id.clone());

    Some(RemoteArticle {
        external_id,
        group_external_id,
        sku,
        ean: article.european_article_number.as_ref().and_then(value_to_id),
        title,
        description,
        unit_of_measure: article.quantity_unit.as_ref().and_then(value_to_text),
        active,
        updated_at: article
            .modified_on
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        attributes: article.extra,
    })
}

/// Renders a SelectLine identifier that may arrive as a JSON number or a
/// string. Blank strings and other shapes yield `None`.
fn value_to_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts a non-blank free-text value; non-strings degrade to `None`.
fn value_to_text(v: &Value) -> Option<String> {
    let trimmed = v.as_str()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Coerces an integer that may arrive as a number or a numeric string.
fn value_to_i32(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Coerces a flag that may arrive as a bool, a 0/1 number, or a
/// "true"/"false"/"0"/"1" string.
fn value_to_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parses an RFC 3339 timestamp, tolerating the second-precision variant
/// SelectLine emits without an offset.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_group_maps_fields() {
        let raw = json!({
            "Number": "G100",
            "Name": "Boxes",
            "Description": "Corrugated boxes",
            "Parent": "G1",
            "SortOrder": 3
        });
        let group = normalize_group(&raw).expect("group should normalize");
        assert_eq!(group.id, "G100");
        assert_eq!(group.name, "Boxes");
        assert_eq!(group.description.as_deref(), Some("Corrugated boxes"));
        assert_eq!(group.parent_id.as_deref(), Some("G1"));
        assert_eq!(group.sort_order, Some(3));
        assert!(group.is_active);
        assert!(group.updated_at.is_none());
    }

    #[test]
    fn normalize_group_accepts_numeric_number() {
        let raw = json!({ "Number": 42, "Name": "Tape" });
        let group = normalize_group(&raw).unwrap();
        assert_eq!(group.id, "42");
    }

    #[test]
    fn normalize_group_without_number_is_rejected() {
        assert!(normalize_group(&json!({ "Name": "Orphan" })).is_none());
        assert!(normalize_group(&json!("not an object")).is_none());
    }

    #[test]
    fn normalize_group_defaults_name_to_id() {
        let raw = json!({ "Number": "G7", "Name": "  " });
        let group = normalize_group(&raw).unwrap();
        assert_eq!(group.name, "G7");
    }

    #[test]
    fn normalize_group_coerces_string_sort_order() {
        // Numeric fields drift to strings between installations; the
        // record must survive and the value must still coerce.
        let raw = json!({ "Number": "G1", "Name": "Boxes", "SortOrder": "3" });
        let group = normalize_group(&raw).expect("record must not be rejected");
        assert_eq!(group.sort_order, Some(3));

        let raw = json!({ "Number": "G1", "Name": "Boxes", "SortOrder": { "nested": true } });
        let group = normalize_group(&raw).expect("record must not be rejected");
        assert_eq!(group.sort_order, None);
    }

    #[test]
    fn normalize_group_degrades_wrong_typed_text_fields() {
        let raw = json!({ "Number": "G1", "Name": 7, "Description": ["x"] });
        let group = normalize_group(&raw).expect("record must not be rejected");
        assert_eq!(group.name, "G1");
        assert!(group.description.is_none());
    }

    #[test]
    fn normalize_group_honours_activity_flags_when_present() {
        let raw = json!({ "Number": "G1", "IsActive": false });
        assert!(!normalize_group(&raw).unwrap().is_active);

        let raw = json!({ "Number": "G1", "IsInactive": true });
        assert!(!normalize_group(&raw).unwrap().is_active);

        let raw = json!({ "Number": "G1", "IsInactive": 0 });
        assert!(normalize_group(&raw).unwrap().is_active);

        // No flag at all: active.
        let raw = json!({ "Number": "G1" });
        assert!(normalize_group(&raw).unwrap().is_active);

        // Unusable flag degrades to the default, not a rejection.
        let raw = json!({ "Number": "G1", "IsActive": "maybe" });
        assert!(normalize_group(&raw).unwrap().is_active);
    }

    #[test]
    fn normalize_article_active_requires_shop_flag() {
        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "IsInactive": false, "IsShopArticle": true
        });
        assert!(normalize_article(&raw).unwrap().active);

        // Shop flag absent: inactive regardless of IsInactive.
        let raw = json!({ "Number": "A1", "ArticleGroup": "G1", "IsInactive": false });
        assert!(!normalize_article(&raw).unwrap().active);

        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "IsInactive": true, "IsShopArticle": true
        });
        assert!(!normalize_article(&raw).unwrap().active);
    }

    #[test]
    fn normalize_article_coerces_numeric_flags() {
        // 0/1 flags instead of booleans must not reject the record.
        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "IsInactive": 0, "IsShopArticle": 1
        });
        let article = normalize_article(&raw).expect("record must not be rejected");
        assert!(article.active);

        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "IsInactive": "1", "IsShopArticle": true
        });
        let article = normalize_article(&raw).expect("record must not be rejected");
        assert!(!article.active);
    }

    #[test]
    fn normalize_article_degrades_wrong_typed_optional_fields() {
        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "Name": 12345,
            "QuantityUnit": { "unit": "Stk" },
            "ModifiedOn": 1_700_000_000
        });
        let article = normalize_article(&raw).expect("record must not be rejected");
        assert_eq!(article.title, "A1");
        assert!(article.unit_of_measure.is_none());
        assert!(article.updated_at.is_none());
    }

    #[test]
    fn normalize_article_title_falls_back_to_number() {
        let raw = json!({ "Number": "A77", "ArticleGroup": "G1", "Name": "" });
        let article = normalize_article(&raw).unwrap();
        assert_eq!(article.title, "A77");
    }

    #[test]
    fn normalize_article_description_coalesces_first_non_blank() {
        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "Description": "  ",
            "AdditionalDescription": "Secondary text"
        });
        let article = normalize_article(&raw).unwrap();
        assert_eq!(article.description.as_deref(), Some("Secondary text"));
    }

    #[test]
    fn normalize_article_packs_leftover_fields_into_attributes() {
        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1", "Name": "Bubble wrap",
            "IsShopArticle": true,
            "Price": 12.5,
            "Stock": { "Warehouse1": 40 },
            "Manufacturer": "ACME"
        });
        let article = normalize_article(&raw).unwrap();
        assert_eq!(article.attributes.get("Price"), Some(&json!(12.5)));
        assert_eq!(
            article.attributes.get("Stock"),
            Some(&json!({ "Warehouse1": 40 }))
        );
        assert_eq!(article.attributes.get("Manufacturer"), Some(&json!("ACME")));
        // Promoted fields must not be duplicated in the bag.
        assert!(!article.attributes.contains_key("Name"));
        assert!(!article.attributes.contains_key("Number"));
    }

    #[test]
    fn normalize_article_requires_group_reference() {
        assert!(normalize_article(&json!({ "Number": "A1" })).is_none());
    }

    #[test]
    fn normalize_article_sku_defaults_to_number() {
        let raw = json!({ "Number": "A9", "ArticleGroup": "G1" });
        assert_eq!(normalize_article(&raw).unwrap().sku, "A9");

        let raw = json!({ "Number": "A9", "ArticleGroup": "G1", "Sku": "SKU-9" });
        assert_eq!(normalize_article(&raw).unwrap().sku, "SKU-9");
    }

    #[test]
    fn normalize_article_parses_modified_on_variants() {
        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "ModifiedOn": "2026-05-04T10:30:00Z"
        });
        assert!(normalize_article(&raw).unwrap().updated_at.is_some());

        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "ModifiedOn": "2026-05-04T10:30:00"
        });
        assert!(normalize_article(&raw).unwrap().updated_at.is_some());

        let raw = json!({
            "Number": "A1", "ArticleGroup": "G1",
            "ModifiedOn": "yesterday-ish"
        });
        assert!(normalize_article(&raw).unwrap().updated_at.is_none());
    }
}
