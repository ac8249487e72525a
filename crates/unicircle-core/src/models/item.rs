use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CollectionId, ItemId};
use crate::error::{Result, UniCircleError};

/// What a collection item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemKind {
    Resource,
    Thread,
    Comment,
    External,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Resource => write!(f, "RESOURCE"),
            ItemKind::Thread => write!(f, "THREAD"),
            ItemKind::Comment => write!(f, "COMMENT"),
            ItemKind::External => write!(f, "EXTERNAL"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resource" => Ok(ItemKind::Resource),
            "thread" => Ok(ItemKind::Thread),
            "comment" => Ok(ItemKind::Comment),
            "external" | "link" => Ok(ItemKind::External),
            _ => Err(format!("unknown item type: {s}")),
        }
    }
}

/// The payload of an item. Platform entities are held by id, external
/// links by URL; a value of this type can never carry both.
///
/// `reference_id` is a weak reference: nothing checks that the resource,
/// thread or comment still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemTarget {
    Resource { reference_id: String },
    Thread { reference_id: String },
    Comment { reference_id: String },
    External { url: String },
}

impl ItemTarget {
    pub fn resource(reference_id: impl Into<String>) -> Self {
        ItemTarget::Resource {
            reference_id: reference_id.into(),
        }
    }

    pub fn thread(reference_id: impl Into<String>) -> Self {
        ItemTarget::Thread {
            reference_id: reference_id.into(),
        }
    }

    pub fn comment(reference_id: impl Into<String>) -> Self {
        ItemTarget::Comment {
            reference_id: reference_id.into(),
        }
    }

    pub fn external(url: impl Into<String>) -> Self {
        ItemTarget::External { url: url.into() }
    }

    /// Build a target from loosely-typed input (CLI flags, stored records,
    /// JSON from the REST service). Blank strings count as absent.
    pub fn parse(kind: ItemKind, reference_id: Option<&str>, url: Option<&str>) -> Result<Self> {
        let reference_id = non_blank(reference_id);
        let url = non_blank(url);

        match kind {
            ItemKind::External => {
                if reference_id.is_some() {
                    return Err(UniCircleError::validation(
                        "external items cannot carry a reference id",
                    ));
                }
                let url = url.ok_or_else(|| {
                    UniCircleError::validation("url is required for external items")
                })?;
                Ok(ItemTarget::external(url))
            }
            other => {
                if url.is_some() {
                    return Err(UniCircleError::validation(format!(
                        "{other} items cannot carry a url"
                    )));
                }
                let reference_id = reference_id.ok_or_else(|| {
                    UniCircleError::validation(format!(
                        "reference id is required for {other} items"
                    ))
                })?;
                Ok(match other {
                    ItemKind::Resource => ItemTarget::resource(reference_id),
                    ItemKind::Thread => ItemTarget::thread(reference_id),
                    _ => ItemTarget::comment(reference_id),
                })
            }
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemTarget::Resource { .. } => ItemKind::Resource,
            ItemTarget::Thread { .. } => ItemKind::Thread,
            ItemTarget::Comment { .. } => ItemKind::Comment,
            ItemTarget::External { .. } => ItemKind::External,
        }
    }

    pub fn reference_id(&self) -> Option<&str> {
        match self {
            ItemTarget::Resource { reference_id }
            | ItemTarget::Thread { reference_id }
            | ItemTarget::Comment { reference_id } => Some(reference_id),
            ItemTarget::External { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ItemTarget::External { url } => Some(url),
            _ => None,
        }
    }

    /// Re-check a target that was built directly through the constructors.
    pub fn validate(&self) -> Result<()> {
        Self::parse(self.kind(), self.reference_id(), self.url()).map(|_| ())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalise a free-text note: blank notes are stored as absent.
pub fn normalize_note(note: Option<&str>) -> Option<String> {
    note.filter(|n| !n.trim().is_empty()).map(str::to_string)
}

/// An entry inside a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionItem {
    pub id: ItemId,
    pub collection_id: CollectionId,
    pub target: ItemTarget,
    pub private_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CollectionItem {
    pub fn new(collection_id: CollectionId, target: ItemTarget, private_note: Option<String>) -> Self {
        Self {
            id: ItemId::new(),
            collection_id,
            target,
            private_note,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.target.kind()
    }

    /// Copy this item into another collection with a fresh id and timestamp.
    pub fn copy_into(&self, collection_id: &CollectionId) -> Self {
        Self::new(
            collection_id.clone(),
            self.target.clone(),
            self.private_note.clone(),
        )
    }
}

/// Input for adding an item to a collection.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub target: ItemTarget,
    pub private_note: Option<String>,
}

impl NewItem {
    pub fn new(target: ItemTarget) -> Self {
        Self {
            target,
            private_note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.private_note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_requires_url() {
        let err = ItemTarget::parse(ItemKind::External, None, Some("  ")).unwrap_err();
        assert!(matches!(err, UniCircleError::Validation { .. }));

        let target = ItemTarget::parse(ItemKind::External, None, Some("https://x.test")).unwrap();
        assert_eq!(target.url(), Some("https://x.test"));
        assert_eq!(target.reference_id(), None);
    }

    #[test]
    fn test_external_rejects_reference_id() {
        let err = ItemTarget::parse(ItemKind::External, Some("r1"), Some("https://x.test"))
            .unwrap_err();
        assert!(matches!(err, UniCircleError::Validation { .. }));
    }

    #[test]
    fn test_reference_kinds_require_reference_id() {
        for kind in [ItemKind::Resource, ItemKind::Thread, ItemKind::Comment] {
            assert!(ItemTarget::parse(kind, None, None).is_err());
            assert!(ItemTarget::parse(kind, Some(""), None).is_err());
            assert!(ItemTarget::parse(kind, Some("42"), Some("https://x.test")).is_err());

            let target = ItemTarget::parse(kind, Some(" 42 "), None).unwrap();
            assert_eq!(target.kind(), kind);
            assert_eq!(target.reference_id(), Some("42"));
            assert_eq!(target.url(), None);
        }
    }

    #[test]
    fn test_validate_catches_blank_constructor_input() {
        assert!(ItemTarget::resource("").validate().is_err());
        assert!(ItemTarget::external("https://x.test").validate().is_ok());
    }

    #[test]
    fn test_item_kind_parse() {
        assert_eq!("thread".parse::<ItemKind>().unwrap(), ItemKind::Thread);
        assert_eq!("EXTERNAL".parse::<ItemKind>().unwrap(), ItemKind::External);
        assert!("video".parse::<ItemKind>().is_err());
        assert_eq!(
            serde_json::to_string(&ItemKind::Comment).unwrap(),
            "\"COMMENT\""
        );
    }

    #[test]
    fn test_normalize_note() {
        assert_eq!(normalize_note(Some("")), None);
        assert_eq!(normalize_note(Some("   ")), None);
        assert_eq!(normalize_note(Some("read ch. 3")), Some("read ch. 3".to_string()));
        assert_eq!(normalize_note(None), None);
    }

    #[test]
    fn test_copy_into_gets_fresh_id() {
        let source = CollectionItem::new(
            CollectionId::from("c1"),
            ItemTarget::thread("t9"),
            Some("note".to_string()),
        );
        let copy = source.copy_into(&CollectionId::from("c2"));
        assert_ne!(copy.id, source.id);
        assert_eq!(copy.collection_id, CollectionId::from("c2"));
        assert_eq!(copy.target, source.target);
        assert_eq!(copy.private_note, source.private_note);
    }
}
