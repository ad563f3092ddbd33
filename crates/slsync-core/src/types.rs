use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An article group as reported by the SelectLine API, normalized for
/// storage. `id` is the SelectLine-side identifier and is the upsert key
/// for the local mirror row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// SelectLine identifier of the parent group, if any. Stored verbatim;
    /// the sync layer does not resolve it to a local id.
    pub parent_id: Option<String>,
    pub sort_order: Option<i32>,
    /// Most SelectLine deployments expose no group activity flag; when the
    /// payload carries none, normalization defaults to `true`.
    pub is_active: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// An article as reported by the SelectLine API, normalized for storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteArticle {
    pub external_id: String,
    /// SelectLine identifier of the owning group. May reference a group
    /// that has not been mirrored yet; the orchestrator skips such
    /// articles rather than persisting a dangling reference.
    pub group_external_id: String,
    pub sku: String,
    pub ean: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    /// Derived: not flagged inactive AND flagged shop-active. An absent
    /// shop-active flag means inactive.
    pub active: bool,
    pub updated_at: Option<DateTime<Utc>>,
    /// Everything SelectLine sends that is not a first-class column:
    /// pricing, stock, manufacturer codes, custom fields. Opaque to the
    /// sync layer and passed through to the `attributes` jsonb column
    /// verbatim.
    pub attributes: Map<String, Value>,
}
