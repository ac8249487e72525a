use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CollectionId, UserId};
use super::item::CollectionItem;

/// Who can see a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Private => write!(f, "PRIVATE"),
            Visibility::Public => write!(f, "PUBLIC"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            _ => Err(format!("unknown visibility: {s}")),
        }
    }
}

/// A user-owned, named grouping of saved items.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<CollectionItem>,
}

impl Collection {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// Public collections are readable by anyone, private ones only by their owner.
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        self.is_public() || self.is_owned_by(viewer)
    }
}

/// Input for creating a collection.
#[derive(Debug, Clone, Default)]
pub struct NewCollection {
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub tags: Vec<String>,
}

impl NewCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update of a collection. `None` leaves a field untouched;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub visibility: Option<Visibility>,
    pub tags: Option<Vec<String>>,
}

impl CollectionUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.visibility.is_none()
            && self.tags.is_none()
    }

    pub fn visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Default::default()
        }
    }
}

/// Filter for public collection search.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against name, description and tags.
    pub query: Option<String>,
    /// Matches collections carrying at least one of these tags.
    pub tags: Vec<String>,
    /// Who is searching. Results are public collections regardless; the
    /// Collection Service receives it as `userId`.
    pub viewer: Option<UserId>,
}

impl SearchQuery {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_viewer(mut self, viewer: UserId) -> Self {
        self.viewer = Some(viewer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(visibility: Visibility) -> Collection {
        let now = Utc::now();
        Collection {
            id: CollectionId::new(),
            name: "Midterm".to_string(),
            description: None,
            visibility,
            tags: Vec::new(),
            owner_id: UserId::from("u1"),
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_visibility_rules() {
        let owner = UserId::from("u1");
        let other = UserId::from("u2");

        let private = sample(Visibility::Private);
        assert!(private.is_visible_to(&owner));
        assert!(!private.is_visible_to(&other));

        let public = sample(Visibility::Public);
        assert!(public.is_visible_to(&other));
        assert!(!public.is_owned_by(&other));
    }

    #[test]
    fn test_visibility_default_and_parse() {
        assert_eq!(Visibility::default(), Visibility::Private);
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!("PRIVATE".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("secret".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_new_collection_defaults_private() {
        let input = NewCollection::new("Algorithms");
        assert_eq!(input.visibility, Visibility::Private);
        assert!(input.tags.is_empty());
    }
}
