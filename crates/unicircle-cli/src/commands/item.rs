use clap::Subcommand;
use unicircle_core::models::ids::{CollectionId, ItemId};
use unicircle_core::models::item::{ItemKind, ItemTarget, NewItem};

use crate::context::Context;
use crate::render;

#[derive(Subcommand)]
pub enum ItemAction {
    /// Save a resource, thread, comment or external link into a collection
    Add {
        /// Collection id
        collection: String,
        /// Item type: resource, thread, comment or external
        #[arg(long = "type")]
        kind: ItemKind,
        /// Id of the platform resource, thread or comment
        #[arg(long, conflicts_with = "url")]
        reference: Option<String>,
        /// Link target for external items
        #[arg(long)]
        url: Option<String>,
        /// Private note only you can see
        #[arg(long)]
        note: Option<String>,
    },
    /// Set or clear the private note on an item
    Note {
        /// Item id
        item: String,
        /// New note text (omit to clear)
        text: Option<String>,
    },
    /// Remove an item from its collection
    Remove {
        /// Item id
        item: String,
    },
}

pub async fn run(action: ItemAction, ctx: &Context) -> anyhow::Result<()> {
    let backend = ctx.backend()?;
    let user = ctx.user()?;

    match action {
        ItemAction::Add {
            collection,
            kind,
            reference,
            url,
            note,
        } => {
            let target = ItemTarget::parse(kind, reference.as_deref(), url.as_deref())?;
            let mut input = NewItem::new(target);
            if let Some(note) = note {
                input = input.with_note(note);
            }

            let item = backend
                .add_item(&CollectionId::from(collection.as_str()), &user, input)
                .await?;
            tracing::info!(id = %item.id, collection = %item.collection_id, "added item");
            println!(
                "Added {} item {} -> {}",
                item.kind(),
                item.id,
                render::item_target(&item)
            );
        }
        ItemAction::Note { item, text } => {
            let updated = backend
                .update_item_note(&ItemId::from(item.as_str()), &user, text)
                .await?;
            match updated.private_note {
                Some(ref note) => println!("Note on {} set to: {note}", updated.id),
                None => println!("Note on {} cleared", updated.id),
            }
        }
        ItemAction::Remove { item } => {
            backend.remove_item(&ItemId::from(item.as_str()), &user).await?;
            tracing::info!(%item, "removed item");
            println!("Removed item '{item}'");
        }
    }

    Ok(())
}
