//! Validation and matching rules shared by every collection backend, so the
//! local and HTTP adapters accept and reject exactly the same input.

use crate::error::{Result, UniCircleError};
use crate::models::collection::{Collection, CollectionUpdate, NewCollection, SearchQuery};
use crate::models::ids::UserId;
use crate::models::item::{normalize_note, ItemTarget, NewItem};

/// Every operation acts on behalf of a user; an anonymous caller owns nothing.
pub fn validate_user(user: &UserId) -> Result<()> {
    if user.as_str().trim().is_empty() {
        return Err(UniCircleError::validation("user id cannot be empty"));
    }
    Ok(())
}

/// Trimmed, non-empty collection name.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UniCircleError::validation("collection name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Trim tags, drop blanks and duplicates. First occurrence wins so the
/// display order is kept.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

pub fn prepare_new_collection(input: NewCollection) -> Result<NewCollection> {
    Ok(NewCollection {
        name: validate_name(&input.name)?,
        description: normalize_description(input.description),
        visibility: input.visibility,
        tags: normalize_tags(input.tags),
    })
}

pub fn prepare_update(update: CollectionUpdate) -> Result<CollectionUpdate> {
    Ok(CollectionUpdate {
        name: update.name.as_deref().map(validate_name).transpose()?,
        description: update.description.map(normalize_description),
        visibility: update.visibility,
        tags: update.tags.map(normalize_tags),
    })
}

pub fn prepare_new_item(item: NewItem) -> Result<NewItem> {
    let target = ItemTarget::parse(
        item.target.kind(),
        item.target.reference_id(),
        item.target.url(),
    )?;
    Ok(NewItem {
        target,
        private_note: normalize_note(item.private_note.as_deref()),
    })
}

/// Name given to a clone when the caller does not pick one.
pub fn clone_name(original: &str, new_name: Option<&str>) -> String {
    match new_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("{original} (Copy)"),
    }
}

impl SearchQuery {
    /// Whether a public collection satisfies this query. Visibility is the
    /// caller's concern.
    pub fn matches(&self, collection: &Collection) -> bool {
        if let Some(q) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            let hit = collection.name.to_lowercase().contains(&needle)
                || collection
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || collection
                    .tags
                    .iter()
                    .any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        let wanted = normalize_tags(self.tags.clone());
        if !wanted.is_empty() && !collection.tags.iter().any(|t| wanted.contains(t)) {
            return false;
        }

        true
    }
}
