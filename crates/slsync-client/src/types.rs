//! Raw serde shapes for SelectLine API payloads.
//!
//! Every known field is captured as an untyped [`Value`]: installations
//! disagree not just on which fields exist but on their types (numbers as
//! strings, flags as 0/1), so typing them here would reject whole records
//! over one drifted field. The normalizer coerces each field and degrades
//! anything unusable to its default; only a non-object record can fail to
//! deserialize. Anything not named here lands in the flattened `extra` bag.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One raw article-group record as the SelectLine groups endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawGroup {
    /// Group number — the stable SelectLine identifier. May arrive as a
    /// number or a string depending on the installation.
    pub number: Option<Value>,
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub parent: Option<Value>,
    pub sort_order: Option<Value>,
    /// Activity flag variants seen in the wild; most deployments send
    /// neither, in which case the group counts as active.
    pub is_active: Option<Value>,
    pub is_inactive: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One raw article record as the SelectLine articles endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawArticle {
    /// Article number — the stable SelectLine identifier.
    pub number: Option<Value>,
    pub article_group: Option<Value>,
    pub sku: Option<Value>,
    pub european_article_number: Option<Value>,
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub additional_description: Option<Value>,
    pub quantity_unit: Option<Value>,
    pub is_inactive: Option<Value>,
    /// Shop visibility flag. Absent means the article is not shop-active.
    pub is_shop_article: Option<Value>,
    pub modified_on: Option<Value>,
    /// Pricing, stock, manufacturer codes, custom fields — everything the
    /// mirror stores verbatim in the `attributes` jsonb column.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
