//! JSON shapes exchanged with the Collection Service.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use unicircle_core::error::UniCircleError;
use unicircle_core::models::collection::{Collection, CollectionUpdate, NewCollection, Visibility};
use unicircle_core::models::ids::{CollectionId, ItemId, UserId};
use unicircle_core::models::item::{CollectionItem, ItemKind, ItemTarget, NewItem};

/// Ids arrive as strings or as numbers depending on the service build.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

/// RFC 3339, or a zone-less local timestamp taken as UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_dt(&raw).map_err(serde::de::Error::custom)
}

fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_dt(&raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_dt(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc()))
        .map_err(|e| format!("invalid timestamp '{s}': {e}"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCollection {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(alias = "userId", deserialize_with = "id_string")]
    pub owner_id: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Services that never edited a collection may omit it.
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Option<Vec<WireItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub collection_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub private_note: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl WireItem {
    /// `parent` fills in the collection id when the service nests items
    /// without repeating it.
    pub fn into_item(self, parent: Option<&CollectionId>) -> Result<CollectionItem, UniCircleError> {
        let collection_id = match (self.collection_id, parent) {
            (Some(id), _) => CollectionId(id),
            (None, Some(parent)) => parent.clone(),
            (None, None) => {
                return Err(UniCircleError::Serialization(format!(
                    "item {} has no collection id",
                    self.id
                )))
            }
        };
        Ok(CollectionItem {
            id: ItemId(self.id),
            collection_id,
            target: ItemTarget::parse(self.kind, self.reference_id.as_deref(), self.url.as_deref())?,
            private_note: self.private_note,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<WireCollection> for Collection {
    type Error = UniCircleError;

    fn try_from(w: WireCollection) -> Result<Self, Self::Error> {
        let id = CollectionId(w.id);
        let items = w
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.into_item(Some(&id)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Collection {
            id,
            name: w.name,
            description: w.description,
            visibility: w.visibility,
            tags: w.tags.unwrap_or_default(),
            owner_id: UserId(w.owner_id),
            created_at: w.created_at,
            updated_at: w.updated_at.unwrap_or(w.created_at),
            items,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionBody<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub visibility: Visibility,
    pub tags: &'a [String],
    pub user_id: &'a str,
}

impl<'a> CreateCollectionBody<'a> {
    pub fn new(input: &'a NewCollection, owner: &'a UserId) -> Self {
        Self {
            name: &input.name,
            description: input.description.as_deref(),
            visibility: input.visibility,
            tags: &input.tags,
            user_id: owner.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    /// `Some(None)` is sent as an explicit `null` to clear the description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a [String]>,
}

impl<'a> From<&'a CollectionUpdate> for UpdateCollectionBody<'a> {
    fn from(update: &'a CollectionUpdate) -> Self {
        Self {
            name: update.name.as_deref(),
            description: update.description.as_ref().map(|d| d.as_deref()),
            visibility: update.visibility,
            tags: update.tags.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody<'a> {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub reference_id: Option<&'a str>,
    pub url: Option<&'a str>,
    pub private_note: Option<&'a str>,
}

impl<'a> From<&'a NewItem> for AddItemBody<'a> {
    fn from(item: &'a NewItem) -> Self {
        Self {
            kind: item.target.kind(),
            reference_id: item.target.reference_id(),
            url: item.target.url(),
            private_note: item.private_note.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBody<'a> {
    pub private_note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneBody<'a> {
    pub user_id: &'a str,
    pub new_name: String,
}

/// Error payloads the service sends alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Best human-readable message from an error response body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(m), ..
        }) => m,
        Ok(ErrorBody { error: Some(e), .. }) => e,
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_and_local_timestamps() {
        let json = r#"{
            "id": 17, "name": "Midterm", "visibility": "PUBLIC",
            "ownerId": 3, "createdAt": "2024-03-01T10:00:00",
            "items": [
                {"id": 5, "type": "RESOURCE", "referenceId": 99, "createdAt": "2024-03-01T10:05:00"},
                {"id": 6, "type": "EXTERNAL", "url": "https://x.test", "privateNote": "read",
                 "createdAt": "2024-03-01T10:06:00Z"}
            ]
        }"#;
        let wire: WireCollection = serde_json::from_str(json).unwrap();
        let c = Collection::try_from(wire).unwrap();
        assert_eq!(c.id, CollectionId::from("17"));
        assert_eq!(c.owner_id, UserId::from("3"));
        assert!(c.tags.is_empty());
        assert_eq!(c.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert_eq!(c.updated_at, c.created_at);
        assert_eq!(c.items.len(), 2);
        assert_eq!(c.items[0].collection_id, c.id);
        assert_eq!(c.items[0].target, ItemTarget::resource("99"));
        assert_eq!(c.items[1].private_note.as_deref(), Some("read"));
    }

    #[test]
    fn test_invalid_item_shape_is_rejected() {
        let json = r#"{"id": "i1", "collectionId": "c1", "type": "EXTERNAL", "url": null,
                       "createdAt": "2024-03-01T10:00:00Z"}"#;
        let wire: WireItem = serde_json::from_str(json).unwrap();
        assert!(wire.into_item(None).is_err());
    }

    #[test]
    fn test_bad_or_missing_timestamps_are_rejected() {
        let garbage = r#"{"id": "c1", "name": "x", "ownerId": "u1", "createdAt": "garbage"}"#;
        assert!(serde_json::from_str::<WireCollection>(garbage).is_err());

        let missing = r#"{"id": "c1", "name": "x", "ownerId": "u1"}"#;
        assert!(serde_json::from_str::<WireCollection>(missing).is_err());

        let bad_update = r#"{"id": "c1", "name": "x", "ownerId": "u1",
                             "createdAt": "2024-03-01T10:00:00Z", "updatedAt": "soon"}"#;
        assert!(serde_json::from_str::<WireCollection>(bad_update).is_err());

        let item = r#"{"id": 1, "collectionId": "c1", "type": "THREAD", "referenceId": "t1"}"#;
        assert!(serde_json::from_str::<WireItem>(item).is_err());
    }

    #[test]
    fn test_update_body_serialization() {
        let update = CollectionUpdate {
            description: Some(None),
            visibility: Some(Visibility::Public),
            ..Default::default()
        };
        let json = serde_json::to_value(UpdateCollectionBody::from(&update)).unwrap();
        assert_eq!(json, serde_json::json!({"description": null, "visibility": "PUBLIC"}));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"message":"name required"}"#), "name required");
        assert_eq!(error_message(r#"{"error":"Forbidden"}"#), "Forbidden");
        assert_eq!(error_message(" plain text \n"), "plain text");
    }
}
