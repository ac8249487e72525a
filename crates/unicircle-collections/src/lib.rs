pub mod local;
pub mod records;

use async_trait::async_trait;
use unicircle_core::error::UniCircleError;
use unicircle_core::models::collection::{
    Collection, CollectionUpdate, NewCollection, SearchQuery,
};
use unicircle_core::models::ids::{CollectionId, ItemId, UserId};
use unicircle_core::models::item::{CollectionItem, NewItem};

pub use local::LocalCollectionStore;

/// The collection store contract. Implemented against local key-value
/// storage and against the remote Collection Service; both must accept,
/// reject and shape data identically.
#[async_trait]
pub trait CollectionBackend: Send + Sync {
    /// Every collection owned by `owner`, items attached, newest first.
    async fn list_user_collections(&self, owner: &UserId) -> Result<Vec<Collection>, UniCircleError>;

    /// A collection the viewer may see. Missing and hidden collections
    /// both come back as `None`.
    async fn get_collection(
        &self,
        id: &CollectionId,
        viewer: &UserId,
    ) -> Result<Option<Collection>, UniCircleError>;

    async fn create_collection(
        &self,
        owner: &UserId,
        input: NewCollection,
    ) -> Result<Collection, UniCircleError>;

    async fn update_collection(
        &self,
        id: &CollectionId,
        owner: &UserId,
        update: CollectionUpdate,
    ) -> Result<Collection, UniCircleError>;

    /// Delete a collection and all of its items.
    async fn delete_collection(&self, id: &CollectionId, owner: &UserId) -> Result<(), UniCircleError>;

    async fn add_item(
        &self,
        collection_id: &CollectionId,
        owner: &UserId,
        item: NewItem,
    ) -> Result<CollectionItem, UniCircleError>;

    async fn update_item_note(
        &self,
        item_id: &ItemId,
        owner: &UserId,
        note: Option<String>,
    ) -> Result<CollectionItem, UniCircleError>;

    async fn remove_item(&self, item_id: &ItemId, owner: &UserId) -> Result<(), UniCircleError>;

    /// Public collections matching the query. Unpaginated.
    async fn search_public_collections(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<Collection>, UniCircleError>;

    /// Copy a public collection into a new private one owned by `new_owner`.
    async fn clone_collection(
        &self,
        id: &CollectionId,
        new_owner: &UserId,
        new_name: Option<String>,
    ) -> Result<Collection, UniCircleError>;

    /// Short label for logs and CLI output.
    fn name(&self) -> &'static str;
}
