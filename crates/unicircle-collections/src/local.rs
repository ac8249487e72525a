use async_trait::async_trait;
use chrono::Utc;

use unicircle_core::error::UniCircleError;
use unicircle_core::models::collection::{
    Collection, CollectionUpdate, NewCollection, SearchQuery, Visibility,
};
use unicircle_core::models::ids::{CollectionId, ItemId, UserId};
use unicircle_core::models::item::{normalize_note, CollectionItem, NewItem};
use unicircle_core::rules;
use unicircle_storage::KeyValueStore;

use crate::records::{
    encode_table, load_table, CollectionRecord, ItemRecord, COLLECTIONS_KEY, ITEMS_KEY,
};
use crate::CollectionBackend;

/// Collection store kept entirely in a [`KeyValueStore`].
///
/// Stateless between calls: each operation reads both tables, changes them
/// in memory and writes them back. All checks run before the first write.
/// Two writers on the same store can lose each other's updates.
pub struct LocalCollectionStore<S> {
    store: S,
}

impl<S: KeyValueStore> LocalCollectionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Table access ──

    fn collections(&self) -> Result<Vec<CollectionRecord>, UniCircleError> {
        load_table(&self.store, COLLECTIONS_KEY)
    }

    fn items(&self) -> Result<Vec<ItemRecord>, UniCircleError> {
        load_table(&self.store, ITEMS_KEY)
    }

    fn save_collections(&self, rows: &[CollectionRecord]) -> Result<(), UniCircleError> {
        self.store.set(COLLECTIONS_KEY, &encode_table(rows)?)
    }

    fn save_tables(
        &self,
        collections: &[CollectionRecord],
        items: &[ItemRecord],
    ) -> Result<(), UniCircleError> {
        self.store.set_many(&[
            (COLLECTIONS_KEY, encode_table(collections)?),
            (ITEMS_KEY, encode_table(items)?),
        ])
    }

    // ── Collections ──

    pub fn list_user_collections(&self, owner: &UserId) -> Result<Vec<Collection>, UniCircleError> {
        let collections = self.collections()?;
        let items = self.items()?;

        let mut owned: Vec<Collection> = collections
            .iter()
            .filter(|c| c.is_owned_by(owner))
            .map(|c| c.to_collection(&items))
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        tracing::debug!(owner = %owner, count = owned.len(), "listed collections");
        Ok(owned)
    }

    pub fn get_collection(
        &self,
        id: &CollectionId,
        viewer: &UserId,
    ) -> Result<Option<Collection>, UniCircleError> {
        let collections = self.collections()?;
        let record = match collections.iter().find(|c| &c.id == id) {
            Some(record) if record.is_public() || record.is_owned_by(viewer) => record,
            _ => return Ok(None),
        };
        Ok(Some(record.to_collection(&self.items()?)))
    }

    pub fn create_collection(
        &self,
        owner: &UserId,
        input: NewCollection,
    ) -> Result<Collection, UniCircleError> {
        rules::validate_user(owner)?;
        let input = rules::prepare_new_collection(input)?;

        let now = Utc::now();
        let record = CollectionRecord {
            id: CollectionId::new(),
            name: input.name,
            description: input.description,
            visibility: input.visibility,
            tags: input.tags,
            owner_id: owner.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut collections = self.collections()?;
        collections.push(record.clone());
        self.save_collections(&collections)?;

        tracing::debug!(id = %record.id, owner = %owner, "created collection");
        Ok(record.to_collection(&[]))
    }

    pub fn update_collection(
        &self,
        id: &CollectionId,
        owner: &UserId,
        update: CollectionUpdate,
    ) -> Result<Collection, UniCircleError> {
        let mut collections = self.collections()?;
        let idx = owned_index(&collections, id, owner)?;
        let update = rules::prepare_update(update)?;

        let record = &mut collections[idx];
        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(description) = update.description {
            record.description = description;
        }
        if let Some(visibility) = update.visibility {
            record.visibility = visibility;
        }
        if let Some(tags) = update.tags {
            record.tags = tags;
        }
        record.updated_at = Utc::now();

        let updated = record.clone();
        self.save_collections(&collections)?;

        tracing::debug!(id = %id, "updated collection");
        Ok(updated.to_collection(&self.items()?))
    }

    pub fn delete_collection(&self, id: &CollectionId, owner: &UserId) -> Result<(), UniCircleError> {
        let mut collections = self.collections()?;
        let idx = owned_index(&collections, id, owner)?;
        collections.remove(idx);

        let mut items = self.items()?;
        let before = items.len();
        items.retain(|item| &item.collection_id != id);

        self.save_tables(&collections, &items)?;
        tracing::debug!(id = %id, items_removed = before - items.len(), "deleted collection");
        Ok(())
    }

    // ── Items ──

    pub fn add_item(
        &self,
        collection_id: &CollectionId,
        owner: &UserId,
        item: NewItem,
    ) -> Result<CollectionItem, UniCircleError> {
        let mut collections = self.collections()?;
        let idx = owned_index(&collections, collection_id, owner)?;
        let item = rules::prepare_new_item(item)?;

        let created = CollectionItem::new(collection_id.clone(), item.target, item.private_note);
        let mut items = self.items()?;
        items.push(ItemRecord::from(&created));
        collections[idx].updated_at = Utc::now();

        self.save_tables(&collections, &items)?;
        tracing::debug!(id = %created.id, collection = %collection_id, kind = %created.kind(), "added item");
        Ok(created)
    }

    pub fn update_item_note(
        &self,
        item_id: &ItemId,
        owner: &UserId,
        note: Option<String>,
    ) -> Result<CollectionItem, UniCircleError> {
        let mut collections = self.collections()?;
        let mut items = self.items()?;
        let (item_idx, parent_idx) = owned_item(&collections, &items, item_id, owner)?;

        items[item_idx].private_note = normalize_note(note.as_deref());
        collections[parent_idx].updated_at = Utc::now();
        let updated = items[item_idx].to_item()?;

        self.save_tables(&collections, &items)?;
        tracing::debug!(id = %item_id, "updated item note");
        Ok(updated)
    }

    pub fn remove_item(&self, item_id: &ItemId, owner: &UserId) -> Result<(), UniCircleError> {
        let mut collections = self.collections()?;
        let mut items = self.items()?;
        let (item_idx, parent_idx) = owned_item(&collections, &items, item_id, owner)?;

        items.remove(item_idx);
        collections[parent_idx].updated_at = Utc::now();

        self.save_tables(&collections, &items)?;
        tracing::debug!(id = %item_id, "removed item");
        Ok(())
    }

    // ── Discovery ──

    pub fn search_public_collections(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<Collection>, UniCircleError> {
        let collections = self.collections()?;
        let items = self.items()?;

        let mut found: Vec<Collection> = collections
            .iter()
            .filter(|c| c.is_public())
            .map(|c| c.to_collection(&items))
            .filter(|c| query.matches(c))
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        tracing::debug!(count = found.len(), "searched public collections");
        Ok(found)
    }

    pub fn clone_collection(
        &self,
        id: &CollectionId,
        new_owner: &UserId,
        new_name: Option<String>,
    ) -> Result<Collection, UniCircleError> {
        rules::validate_user(new_owner)?;

        let mut collections = self.collections()?;
        let mut items = self.items()?;
        let source = collections
            .iter()
            .find(|c| &c.id == id && c.is_public())
            .ok_or_else(|| UniCircleError::NotCloneable { id: id.to_string() })?
            .to_collection(&items);

        let now = Utc::now();
        let record = CollectionRecord {
            id: CollectionId::new(),
            name: rules::clone_name(&source.name, new_name.as_deref()),
            description: source.description.clone(),
            visibility: Visibility::Private,
            tags: source.tags.clone(),
            owner_id: new_owner.clone(),
            created_at: now,
            updated_at: now,
        };

        let copies: Vec<CollectionItem> = source
            .items
            .iter()
            .map(|item| item.copy_into(&record.id))
            .collect();
        items.extend(copies.iter().map(ItemRecord::from));
        collections.push(record.clone());

        self.save_tables(&collections, &items)?;
        tracing::debug!(source = %id, clone = %record.id, items = copies.len(), "cloned collection");

        let mut cloned = record.to_collection(&[]);
        cloned.items = copies;
        Ok(cloned)
    }
}

/// Index of the collection `id` if `owner` owns it. Missing and foreign
/// collections produce the same error.
fn owned_index(
    collections: &[CollectionRecord],
    id: &CollectionId,
    owner: &UserId,
) -> Result<usize, UniCircleError> {
    collections
        .iter()
        .position(|c| &c.id == id && c.is_owned_by(owner))
        .ok_or_else(|| UniCircleError::NotFoundOrForbidden { id: id.to_string() })
}

/// Indices of an item and its parent collection, provided `owner` owns the parent.
fn owned_item(
    collections: &[CollectionRecord],
    items: &[ItemRecord],
    item_id: &ItemId,
    owner: &UserId,
) -> Result<(usize, usize), UniCircleError> {
    let item_idx = items
        .iter()
        .position(|i| &i.id == item_id)
        .ok_or_else(|| UniCircleError::ItemNotFound {
            id: item_id.to_string(),
        })?;

    let parent_id = &items[item_idx].collection_id;
    let parent_idx = collections
        .iter()
        .position(|c| &c.id == parent_id && c.is_owned_by(owner))
        .ok_or_else(|| UniCircleError::Forbidden {
            message: format!("item {item_id} belongs to a collection you do not own"),
        })?;

    Ok((item_idx, parent_idx))
}

#[async_trait]
impl<S: KeyValueStore> CollectionBackend for LocalCollectionStore<S> {
    async fn list_user_collections(&self, owner: &UserId) -> Result<Vec<Collection>, UniCircleError> {
        LocalCollectionStore::list_user_collections(self, owner)
    }

    async fn get_collection(
        &self,
        id: &CollectionId,
        viewer: &UserId,
    ) -> Result<Option<Collection>, UniCircleError> {
        LocalCollectionStore::get_collection(self, id, viewer)
    }

    async fn create_collection(
        &self,
        owner: &UserId,
        input: NewCollection,
    ) -> Result<Collection, UniCircleError> {
        LocalCollectionStore::create_collection(self, owner, input)
    }

    async fn update_collection(
        &self,
        id: &CollectionId,
        owner: &UserId,
        update: CollectionUpdate,
    ) -> Result<Collection, UniCircleError> {
        LocalCollectionStore::update_collection(self, id, owner, update)
    }

    async fn delete_collection(&self, id: &CollectionId, owner: &UserId) -> Result<(), UniCircleError> {
        LocalCollectionStore::delete_collection(self, id, owner)
    }

    async fn add_item(
        &self,
        collection_id: &CollectionId,
        owner: &UserId,
        item: NewItem,
    ) -> Result<CollectionItem, UniCircleError> {
        LocalCollectionStore::add_item(self, collection_id, owner, item)
    }

    async fn update_item_note(
        &self,
        item_id: &ItemId,
        owner: &UserId,
        note: Option<String>,
    ) -> Result<CollectionItem, UniCircleError> {
        LocalCollectionStore::update_item_note(self, item_id, owner, note)
    }

    async fn remove_item(&self, item_id: &ItemId, owner: &UserId) -> Result<(), UniCircleError> {
        LocalCollectionStore::remove_item(self, item_id, owner)
    }

    async fn search_public_collections(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<Collection>, UniCircleError> {
        LocalCollectionStore::search_public_collections(self, query)
    }

    async fn clone_collection(
        &self,
        id: &CollectionId,
        new_owner: &UserId,
        new_name: Option<String>,
    ) -> Result<Collection, UniCircleError> {
        LocalCollectionStore::clone_collection(self, id, new_owner, new_name)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
