use unicircle_collections::{CollectionBackend, LocalCollectionStore};
use unicircle_core::config::{BackendKind, UniCircleConfig};
use unicircle_core::error::UniCircleError;
use unicircle_core::models::collection::{
    CollectionUpdate, NewCollection, SearchQuery, Visibility,
};
use unicircle_core::models::ids::UserId;
use unicircle_core::models::item::{ItemKind, ItemTarget, NewItem};
use unicircle_db::SqliteStore;
use unicircle_storage::{resolve_api_key, KeyValueStore, MemoryStore, API_KEY_ENTRY};

#[test]
fn test_config_defaults() {
    let config = UniCircleConfig::default();
    assert_eq!(config.backend, BackendKind::Local);
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(
        config.collection_api_url.as_str(),
        "http://localhost:8080/api/collections"
    );
    assert!(config.default_user.is_none());
}

#[test]
fn test_config_roundtrip() {
    let mut config = UniCircleConfig::default();
    config.backend = BackendKind::Http;
    config.default_user = Some("u1".to_string());
    let serialized = toml::to_string_pretty(&config).unwrap();
    let deserialized: UniCircleConfig = toml::from_str(&serialized).unwrap();
    assert_eq!(deserialized.backend, BackendKind::Http);
    assert_eq!(deserialized.default_user.as_deref(), Some("u1"));
}

#[test]
fn test_enum_parse_roundtrip() {
    for v in [Visibility::Private, Visibility::Public] {
        assert_eq!(v.to_string().parse::<Visibility>().unwrap(), v);
    }
    for k in [
        ItemKind::Resource,
        ItemKind::Thread,
        ItemKind::Comment,
        ItemKind::External,
    ] {
        assert_eq!(k.to_string().parse::<ItemKind>().unwrap(), k);
    }
}

#[test]
fn test_api_key_lookup() {
    let secrets = MemoryStore::new();
    assert_eq!(resolve_api_key(&secrets, None).unwrap(), None);

    secrets.set(API_KEY_ENTRY, "from-keychain").unwrap();
    assert_eq!(
        resolve_api_key(&secrets, None).unwrap().as_deref(),
        Some("from-keychain")
    );
    assert_eq!(
        resolve_api_key(&secrets, Some("from-env".to_string()))
            .unwrap()
            .as_deref(),
        Some("from-env")
    );
}

#[tokio::test]
async fn test_full_pipeline_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("unicircle.db");
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");

    let collection_id = {
        let backend: Box<dyn CollectionBackend> =
            Box::new(LocalCollectionStore::new(SqliteStore::open(&db_path).unwrap()));
        assert_eq!(backend.name(), "local");

        // 1. Create a private collection and fill it
        let created = backend
            .create_collection(
                &alice,
                NewCollection::new("Midterm Review").with_tags(["Java", "OOP"]),
            )
            .await
            .unwrap();
        assert_eq!(created.visibility, Visibility::Private);

        backend
            .add_item(
                &created.id,
                &alice,
                NewItem::new(ItemTarget::resource("r1")).with_note("chapter 3"),
            )
            .await
            .unwrap();
        backend
            .add_item(
                &created.id,
                &alice,
                NewItem::new(ItemTarget::external("https://docs.oracle.com/javase")),
            )
            .await
            .unwrap();

        // 2. Not searchable or cloneable while private
        let found = backend
            .search_public_collections(&SearchQuery::text("midterm"))
            .await
            .unwrap();
        assert!(found.is_empty());
        let err = backend
            .clone_collection(&created.id, &bob, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UniCircleError::NotCloneable { .. }));

        // 3. Publish
        backend
            .update_collection(
                &created.id,
                &alice,
                CollectionUpdate::visibility(Visibility::Public),
            )
            .await
            .unwrap();
        created.id
    };

    // 4. Reopen the database; everything is still there
    let backend: Box<dyn CollectionBackend> =
        Box::new(LocalCollectionStore::new(SqliteStore::open(&db_path).unwrap()));

    let found = backend
        .search_public_collections(&SearchQuery::tags(["java"]))
        .await
        .unwrap();
    assert!(found.is_empty(), "tags match exactly");

    let found = backend
        .search_public_collections(&SearchQuery::tags(["Java"]))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].items.len(), 2);

    // 5. Bob clones it
    let clone = backend
        .clone_collection(&collection_id, &bob, None)
        .await
        .unwrap();
    assert_eq!(clone.name, "Midterm Review (Copy)");
    assert_eq!(clone.owner_id, bob);
    assert_eq!(clone.visibility, Visibility::Private);
    assert_eq!(clone.items.len(), 2);

    // 6. Alice deletes the original; Bob's copy survives
    backend
        .delete_collection(&collection_id, &alice)
        .await
        .unwrap();
    assert!(backend
        .get_collection(&collection_id, &alice)
        .await
        .unwrap()
        .is_none());

    let bobs = backend.list_user_collections(&bob).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].items.len(), 2);
    assert!(backend.list_user_collections(&alice).await.unwrap().is_empty());
}
