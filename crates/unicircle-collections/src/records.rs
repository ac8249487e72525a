//! Stored record shapes for the two key-value tables and the codec that
//! reads and writes them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use unicircle_core::error::UniCircleError;
use unicircle_core::models::collection::{Collection, Visibility};
use unicircle_core::models::ids::{CollectionId, ItemId, UserId};
use unicircle_core::models::item::{CollectionItem, ItemKind, ItemTarget};
use unicircle_storage::KeyValueStore;

/// Key of the collections table (records without items).
pub const COLLECTIONS_KEY: &str = "unicircle_collections";

/// Key of the collection items table.
pub const ITEMS_KEY: &str = "unicircle_collection_items";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionRecord {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Attach the items that belong to this record, in stored order.
    pub fn to_collection(&self, items: &[ItemRecord]) -> Collection {
        Collection {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            visibility: self.visibility,
            tags: self.tags.clone(),
            owner_id: self.owner_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: items
                .iter()
                .filter(|item| item.collection_id == self.id)
                .filter_map(|item| match item.to_item() {
                    Ok(item) => Some(item),
                    Err(e) => {
                        tracing::warn!(item = %item.id, "skipping malformed item record: {e}");
                        None
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: ItemId,
    pub collection_id: CollectionId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub private_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn to_item(&self) -> Result<CollectionItem, UniCircleError> {
        Ok(CollectionItem {
            id: self.id.clone(),
            collection_id: self.collection_id.clone(),
            target: ItemTarget::parse(self.kind, self.reference_id.as_deref(), self.url.as_deref())?,
            private_note: self.private_note.clone(),
            created_at: self.created_at,
        })
    }
}

impl From<&CollectionItem> for ItemRecord {
    fn from(item: &CollectionItem) -> Self {
        ItemRecord {
            id: item.id.clone(),
            collection_id: item.collection_id.clone(),
            kind: item.kind(),
            reference_id: item.target.reference_id().map(str::to_string),
            url: item.target.url().map(str::to_string),
            private_note: item.private_note.clone(),
            created_at: item.created_at,
        }
    }
}

/// Read a table. A missing key, a value that is not a JSON array, and
/// individual records that fail to decode all degrade to "no rows";
/// only a failing store surfaces as an error.
pub fn load_table<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>, UniCircleError> {
    let raw = match store.get(key)? {
        Some(raw) => raw,
        None => return Ok(Vec::new()),
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(key, "stored table is corrupt, treating as empty: {e}");
            return Ok(Vec::new());
        }
    };

    let total = values.len();
    let rows: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if rows.len() < total {
        tracing::warn!(key, skipped = total - rows.len(), "dropped undecodable records");
    }
    Ok(rows)
}

pub fn encode_table<T: Serialize>(rows: &[T]) -> Result<String, UniCircleError> {
    Ok(serde_json::to_string(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicircle_storage::MemoryStore;

    #[test]
    fn test_missing_and_corrupt_tables_are_empty() {
        let store = MemoryStore::new();
        let rows: Vec<CollectionRecord> = load_table(&store, COLLECTIONS_KEY).unwrap();
        assert!(rows.is_empty());

        store.set(COLLECTIONS_KEY, "{not json").unwrap();
        let rows: Vec<CollectionRecord> = load_table(&store, COLLECTIONS_KEY).unwrap();
        assert!(rows.is_empty());

        store.set(COLLECTIONS_KEY, "{\"id\": \"c1\"}").unwrap();
        let rows: Vec<CollectionRecord> = load_table(&store, COLLECTIONS_KEY).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_reads_camel_case_records() {
        let store = MemoryStore::new();
        store
            .set(
                COLLECTIONS_KEY,
                r#"[
                    {"id":"c1","name":"Midterm","description":null,"visibility":"PUBLIC",
                     "tags":["Java"],"ownerId":"u1",
                     "createdAt":"2024-03-01T10:00:00Z","updatedAt":"2024-03-01T10:00:00Z"},
                    {"id":"broken"}
                ]"#,
            )
            .unwrap();
        store
            .set(
                ITEMS_KEY,
                r#"[
                    {"id":"i1","collectionId":"c1","type":"EXTERNAL","referenceId":null,
                     "url":"https://x.test","privateNote":null,"createdAt":"2024-03-01T10:05:00Z"},
                    {"id":"i2","collectionId":"c1","type":"RESOURCE","referenceId":"",
                     "url":null,"privateNote":null,"createdAt":"2024-03-01T10:06:00Z"}
                ]"#,
            )
            .unwrap();

        let collections: Vec<CollectionRecord> = load_table(&store, COLLECTIONS_KEY).unwrap();
        let items: Vec<ItemRecord> = load_table(&store, ITEMS_KEY).unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(items.len(), 2);

        let collection = collections[0].to_collection(&items);
        assert_eq!(collection.visibility, Visibility::Public);
        assert_eq!(collection.owner_id, UserId::from("u1"));
        // The RESOURCE record without a reference id is skipped.
        assert_eq!(collection.items.len(), 1);
        assert_eq!(collection.items[0].target.url(), Some("https://x.test"));
    }

    #[test]
    fn test_item_record_from_item_keeps_one_payload() {
        let item = CollectionItem::new(CollectionId::from("c1"), ItemTarget::thread("t1"), None);
        let record = ItemRecord::from(&item);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "THREAD");
        assert_eq!(json["referenceId"], "t1");
        assert!(json["url"].is_null());
        assert!(json.get("collectionId").is_some());
    }
}
