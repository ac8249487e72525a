use clap::Subcommand;
use unicircle_core::models::collection::{CollectionUpdate, NewCollection, SearchQuery, Visibility};
use unicircle_core::models::ids::CollectionId;

use crate::context::Context;
use crate::render;

#[derive(Subcommand)]
pub enum CollectionAction {
    /// List your collections, newest first
    List,
    /// Show a collection and its items
    Show {
        /// Collection id
        id: String,
    },
    /// Create a new collection (private unless --public)
    Create {
        /// Collection name
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Make the collection visible to everyone
        #[arg(long)]
        public: bool,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Change name, description, visibility or tags
    Update {
        /// Collection id
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
        #[arg(long, conflicts_with = "private")]
        public: bool,
        #[arg(long)]
        private: bool,
        /// Replace the tag list (repeatable)
        #[arg(long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,
        /// Remove all tags
        #[arg(long)]
        clear_tags: bool,
    },
    /// Delete a collection and all of its items
    Delete {
        /// Collection id
        id: String,
    },
    /// Search public collections by text and tags
    Search {
        /// Matches name, description and tags (case-insensitive)
        #[arg(long, short)]
        query: Option<String>,
        /// Only collections carrying one of these tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Copy a public collection into your own account
    Clone {
        /// Source collection id
        id: String,
        /// Name for the copy (defaults to "<name> (Copy)")
        #[arg(long)]
        name: Option<String>,
    },
}

pub async fn run(action: CollectionAction, ctx: &Context) -> anyhow::Result<()> {
    let backend = ctx.backend()?;

    match action {
        CollectionAction::List => {
            let user = ctx.user()?;
            let collections = backend.list_user_collections(&user).await?;
            if collections.is_empty() {
                println!("No collections yet. Use `unicircle collection create` to start one.");
                return Ok(());
            }
            println!("{}", render::collections_table(&collections));
        }
        CollectionAction::Show { id } => {
            let user = ctx.user()?;
            match backend.get_collection(&CollectionId::from(id.as_str()), &user).await? {
                Some(collection) => render::print_collection(&collection),
                None => anyhow::bail!("Collection '{id}' not found"),
            }
        }
        CollectionAction::Create {
            name,
            description,
            public,
            tags,
        } => {
            let user = ctx.user()?;
            let mut input = NewCollection::new(name).with_tags(tags);
            if let Some(description) = description {
                input = input.with_description(description);
            }
            if public {
                input = input.with_visibility(Visibility::Public);
            }

            let created = backend.create_collection(&user, input).await?;
            tracing::info!(id = %created.id, backend = backend.name(), "created collection");
            println!("Created collection '{}' ({})", created.name, created.id);
        }
        CollectionAction::Update {
            id,
            name,
            description,
            clear_description,
            public,
            private,
            tags,
            clear_tags,
        } => {
            let user = ctx.user()?;
            let update = CollectionUpdate {
                name,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                visibility: match (public, private) {
                    (true, _) => Some(Visibility::Public),
                    (_, true) => Some(Visibility::Private),
                    _ => None,
                },
                tags: if clear_tags {
                    Some(Vec::new())
                } else if tags.is_empty() {
                    None
                } else {
                    Some(tags)
                },
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update. Pass at least one of --name, --description, --public, --private or --tag");
            }

            let updated = backend
                .update_collection(&CollectionId::from(id.as_str()), &user, update)
                .await?;
            tracing::info!(id = %updated.id, "updated collection");
            render::print_collection(&updated);
        }
        CollectionAction::Delete { id } => {
            let user = ctx.user()?;
            backend
                .delete_collection(&CollectionId::from(id.as_str()), &user)
                .await?;
            tracing::info!(%id, "deleted collection");
            println!("Deleted collection '{id}'");
        }
        CollectionAction::Search { query, tags } => {
            let search = SearchQuery {
                query,
                tags,
                viewer: ctx.user().ok(),
            };
            let found = backend.search_public_collections(&search).await?;
            if found.is_empty() {
                println!("No public collections match.");
                return Ok(());
            }
            println!("{}", render::collections_table(&found));
        }
        CollectionAction::Clone { id, name } => {
            let user = ctx.user()?;
            let clone = backend
                .clone_collection(&CollectionId::from(id.as_str()), &user, name)
                .await?;
            tracing::info!(source = %id, id = %clone.id, "cloned collection");
            println!(
                "Cloned into '{}' ({}) with {} item(s)",
                clone.name,
                clone.id,
                clone.items.len()
            );
        }
    }

    Ok(())
}
